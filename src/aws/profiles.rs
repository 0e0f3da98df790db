//! Named profiles from the AWS CLI configuration files.

use std::collections::BTreeSet;
use std::path::Path;

/// Lists profile names from `<home>/.aws/config` and `<home>/.aws/credentials`.
///
/// Missing or unreadable files contribute no profiles.
pub fn list_profiles(home: &Path) -> BTreeSet<String> {
    let aws_dir = home.join(".aws");
    let mut profiles = BTreeSet::new();

    if let Ok(content) = std::fs::read_to_string(aws_dir.join("config")) {
        profiles.extend(section_names(&content).filter_map(|section| {
            if section == "default" {
                Some(section.to_string())
            } else {
                section
                    .strip_prefix("profile ")
                    .map(|name| name.trim().to_string())
            }
        }));
    }

    if let Ok(content) = std::fs::read_to_string(aws_dir.join("credentials")) {
        profiles.extend(section_names(&content).map(str::to_string));
    }

    profiles
}

fn section_names(content: &str) -> impl Iterator<Item = &str> {
    content.lines().filter_map(|line| {
        line.trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .map(str::trim)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn profiles_from_both_files() {
        let home = TempDir::new().unwrap();
        let aws_dir = home.path().join(".aws");
        fs::create_dir(&aws_dir).unwrap();
        fs::write(
            aws_dir.join("config"),
            "[default]\nregion = us-east-1\n\n[profile staging]\nregion = eu-west-1\n[sso-session corp]\n",
        )
        .unwrap();
        fs::write(
            aws_dir.join("credentials"),
            "[default]\naws_access_key_id = x\n[ci]\naws_access_key_id = y\n",
        )
        .unwrap();

        let profiles: Vec<_> = list_profiles(home.path()).into_iter().collect();

        assert_eq!(profiles, vec!["ci", "default", "staging"]);
    }

    #[test]
    fn no_aws_directory() {
        let home = TempDir::new().unwrap();
        assert!(list_profiles(home.path()).is_empty());
    }
}
