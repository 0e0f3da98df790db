use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::aws::mask_secret;
use crate::cli::{Cli, OutputFormat};
use crate::error::PreflightError;

/// Account id used with `--analyze-only` when none is given.
pub const PLACEHOLDER_ACCOUNT_ID: &str = "123456789012";

/// Region used when none is given.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Parameters whose values are never logged in clear text.
const SECRET_PARAMETERS: &[&str] = &["ExternalID"];

#[derive(Debug)]
pub struct Config {
    pub no_color: bool,
    pub verbose: bool,
    pub template_file: PathBuf,
    pub principal_arn: Option<String>,
    pub region: Option<String>,
    pub account_id: Option<String>,
    pub parameters: HashMap<String, String>,
    pub profile: Option<String>,
    pub condition_overrides: HashMap<String, bool>,
    pub capabilities_file: Option<PathBuf>,
    pub analyze_only: bool,
    pub output_format: OutputFormat,
    pub output_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, PreflightError> {
        let template_file = Self::resolve_path(&cli.template_file)?;

        if !template_file.exists() {
            return Err(PreflightError::Config(format!(
                "Template file does not exist: {}",
                template_file.display()
            )));
        }

        if !template_file.is_file() {
            return Err(PreflightError::Config(format!(
                "Template path is not a file: {}",
                template_file.display()
            )));
        }

        if let Some(arn) = &cli.deploying_principal_arn {
            if !arn.starts_with("arn:") {
                return Err(PreflightError::Config(format!(
                    "Deploying principal must be an ARN starting with 'arn:', got '{}'",
                    arn
                )));
            }
        }

        if let Some(account_id) = &cli.account_id {
            if account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()) {
                return Err(PreflightError::Config(format!(
                    "Account id must be 12 digits, got '{}'",
                    account_id
                )));
            }
        }

        let capabilities_file = cli
            .capabilities_file
            .as_deref()
            .map(Self::resolve_path)
            .transpose()?;

        Ok(Self {
            no_color: cli.no_color,
            verbose: cli.verbose,
            template_file,
            principal_arn: cli.deploying_principal_arn,
            region: cli.region,
            account_id: cli.account_id,
            parameters: parse_parameters(&cli.parameters)?,
            profile: cli.profile,
            condition_overrides: match &cli.condition_values {
                Some(json) => parse_condition_values(json)?,
                None => HashMap::new(),
            },
            capabilities_file,
            analyze_only: cli.analyze_only,
            output_format: cli.output_format,
            output_dir: cli.output_dir,
        })
    }

    /// Parameter values safe to log.
    pub fn masked_parameters(&self) -> BTreeMap<&str, String> {
        self.parameters
            .iter()
            .map(|(name, value)| {
                let shown = if SECRET_PARAMETERS.contains(&name.as_str()) {
                    mask_secret(value)
                } else {
                    value.clone()
                };
                (name.as_str(), shown)
            })
            .collect()
    }

    /// Resolves a path to an absolute path.
    /// - Absolute paths are returned as-is
    /// - Relative paths are resolved relative to current directory
    pub fn resolve_path(path: &Path) -> Result<PathBuf, PreflightError> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().map_err(|e| {
                PreflightError::Config(format!("Cannot determine current directory: {}", e))
            })?;
            Ok(current_dir.join(path))
        }
    }
}

/// Parses `Key=Value` pairs. Values may contain `=`.
pub fn parse_parameters(pairs: &[String]) -> Result<HashMap<String, String>, PreflightError> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(PreflightError::Config(format!(
                "Invalid parameter '{}': expected Key=Value",
                pair
            ))),
        })
        .collect()
}

/// Parses a JSON object of condition names to booleans.
pub fn parse_condition_values(json: &str) -> Result<HashMap<String, bool>, PreflightError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| PreflightError::Config(format!("Invalid condition values JSON: {}", e)))?;

    let serde_json::Value::Object(entries) = value else {
        return Err(PreflightError::Config(
            "Condition values must be a JSON object".to_string(),
        ));
    };

    entries
        .into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::Bool(flag) => Ok((name, flag)),
            other => Err(PreflightError::Config(format!(
                "Condition '{}' must be true or false, got {}",
                name, other
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn cli_for(template_file: PathBuf) -> Cli {
        Cli {
            template_file,
            deploying_principal_arn: None,
            region: None,
            account_id: None,
            parameters: Vec::new(),
            profile: None,
            condition_values: None,
            capabilities_file: None,
            analyze_only: false,
            output_format: OutputFormat::Plain,
            output_dir: None,
            no_color: false,
            verbose: false,
        }
    }

    #[test]
    fn from_cli_with_defaults() {
        let template = NamedTempFile::new().unwrap();
        let config = Config::from_cli(cli_for(template.path().to_path_buf()))
            .expect("Config creation should succeed");

        assert!(!config.no_color);
        assert!(!config.analyze_only);
        assert_eq!(config.template_file, template.path());
        assert!(config.parameters.is_empty());
        assert!(config.condition_overrides.is_empty());
        assert_eq!(config.output_format, OutputFormat::Plain);
    }

    #[test]
    fn from_cli_with_all_options() {
        let template = NamedTempFile::new().unwrap();
        let mut cli = cli_for(template.path().to_path_buf());
        cli.deploying_principal_arn = Some("arn:aws:iam::123456789012:role/deployer".to_string());
        cli.account_id = Some("123456789012".to_string());
        cli.region = Some("eu-west-1".to_string());
        cli.parameters = vec!["Env=prod".to_string(), "Query=a=b".to_string()];
        cli.condition_values = Some(r#"{"IsProd": true, "IsDev": false}"#.to_string());
        cli.capabilities_file = Some(PathBuf::from("extra.yaml"));
        cli.output_format = OutputFormat::Hcl;

        let config = Config::from_cli(cli).expect("Config creation should succeed");

        assert_eq!(config.parameters["Env"], "prod");
        assert_eq!(config.parameters["Query"], "a=b");
        assert_eq!(config.condition_overrides["IsProd"], true);
        assert_eq!(config.condition_overrides["IsDev"], false);
        assert!(config.capabilities_file.unwrap().is_absolute());
        assert_eq!(config.output_format, OutputFormat::Hcl);
    }

    #[test]
    fn from_cli_nonexistent_template_fails() {
        let result = Config::from_cli(cli_for(PathBuf::from("/nonexistent/template.yaml")));
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn from_cli_directory_as_template_fails() {
        let result = Config::from_cli(cli_for(std::env::temp_dir()));
        assert!(result.unwrap_err().to_string().contains("is not a file"));
    }

    #[test]
    fn principal_must_be_an_arn() {
        let template = NamedTempFile::new().unwrap();
        let mut cli = cli_for(template.path().to_path_buf());
        cli.deploying_principal_arn = Some("deployer".to_string());

        let error = Config::from_cli(cli).unwrap_err().to_string();
        assert!(error.contains("arn:"));
    }

    #[test]
    fn account_id_must_be_twelve_digits() {
        let template = NamedTempFile::new().unwrap();
        let mut cli = cli_for(template.path().to_path_buf());
        cli.account_id = Some("12345".to_string());

        assert!(Config::from_cli(cli).is_err());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(parse_parameters(&["NoEquals".to_string()]).is_err());
        assert!(parse_parameters(&["=value".to_string()]).is_err());
        assert_eq!(
            parse_parameters(&["Empty=".to_string()]).unwrap()["Empty"],
            ""
        );
    }

    #[test]
    fn invalid_condition_values_are_rejected() {
        assert!(parse_condition_values("not json").is_err());
        assert!(parse_condition_values("[true]").is_err());
        assert!(parse_condition_values(r#"{"IsProd": "yes"}"#).is_err());
    }

    #[test]
    fn external_id_is_masked() {
        let template = NamedTempFile::new().unwrap();
        let mut cli = cli_for(template.path().to_path_buf());
        cli.parameters = vec!["ExternalID=secret-value-1234".to_string(), "Env=dev".to_string()];

        let config = Config::from_cli(cli).unwrap();
        let masked = config.masked_parameters();

        assert_eq!(masked["ExternalID"], "*************1234");
        assert_eq!(masked["Env"], "dev");
    }

    #[test]
    fn resolve_relative_path_becomes_absolute() {
        let relative_path = PathBuf::from("relative/template.yaml");
        let result = Config::resolve_path(&relative_path).expect("Resolution should succeed");

        assert!(result.is_absolute());
        assert!(result.ends_with("relative/template.yaml"));
    }
}
