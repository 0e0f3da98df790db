//! Verification of prerequisite resources.

use log::{info, warn};
use serde::Serialize;

use super::{AwsCli, AwsError};
use crate::analysis::{PrerequisiteCheck, PrerequisiteKind};

/// Verifies that prerequisite resources exist.
pub trait PrerequisiteChecker {
    /// Returns `Ok(false)` if the resource does not exist.
    fn exists(&self, check: &PrerequisiteCheck) -> Result<bool, AwsError>;
}

impl PrerequisiteChecker for AwsCli {
    fn exists(&self, check: &PrerequisiteCheck) -> Result<bool, AwsError> {
        match check.kind {
            PrerequisiteKind::IamRoleExists => {
                let role_name = role_name_from_arn(&check.identifier);
                let args = [
                    "iam".to_string(),
                    "get-role".to_string(),
                    "--role-name".to_string(),
                    role_name.to_string(),
                ];
                match self.run(&args) {
                    Ok(_) => Ok(true),
                    Err(AwsError::NoSuchEntity(_)) => Ok(false),
                    Err(e) => Err(e),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum PrerequisiteStatus {
    Exists,
    Missing,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrerequisiteOutcome {
    pub check: PrerequisiteCheck,
    #[serde(flatten)]
    pub status: PrerequisiteStatus,
}

impl PrerequisiteOutcome {
    pub fn passed(&self) -> bool {
        self.status == PrerequisiteStatus::Exists
    }
}

/// Role name of a role ARN: the segment after the last `/`.
pub fn role_name_from_arn(arn: &str) -> &str {
    match arn.rsplit_once('/') {
        Some((_, name)) => name,
        None => {
            warn!("Invalid IAM role ARN format: {}", arn);
            arn.rsplit(':').next().unwrap_or(arn)
        }
    }
}

/// Runs every check. Failures to check count as failed checks.
pub fn check_prerequisites(
    checker: &dyn PrerequisiteChecker,
    checks: &[PrerequisiteCheck],
) -> Vec<PrerequisiteOutcome> {
    checks
        .iter()
        .map(|check| {
            info!("Checking {} ({})", check.description, check.identifier);
            let status = match checker.exists(check) {
                Ok(true) => PrerequisiteStatus::Exists,
                Ok(false) => PrerequisiteStatus::Missing,
                Err(e) => {
                    warn!("Could not check {}: {}", check.identifier, e);
                    PrerequisiteStatus::Error(e.to_string())
                }
            };
            PrerequisiteOutcome {
                check: check.clone(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeChecker;

    impl PrerequisiteChecker for FakeChecker {
        fn exists(&self, check: &PrerequisiteCheck) -> Result<bool, AwsError> {
            match role_name_from_arn(&check.identifier) {
                "present" => Ok(true),
                "absent" => Ok(false),
                _ => Err(AwsError::CommandFailed("Throttling".to_string())),
            }
        }
    }

    fn role_check(arn: &str) -> PrerequisiteCheck {
        PrerequisiteCheck {
            kind: PrerequisiteKind::IamRoleExists,
            identifier: arn.to_string(),
            description: "OutpostRoleArn parameter".to_string(),
        }
    }

    #[test]
    fn role_names_come_from_the_last_path_segment() {
        assert_eq!(role_name_from_arn("arn:aws:iam::123456789012:role/app"), "app");
        assert_eq!(
            role_name_from_arn("arn:aws:iam::123456789012:role/service/app"),
            "app"
        );
        assert_eq!(role_name_from_arn("arn:aws:iam::123456789012:app"), "app");
    }

    #[test]
    fn outcomes_per_check() {
        let outcomes = check_prerequisites(
            &FakeChecker,
            &[
                role_check("arn:aws:iam::123456789012:role/present"),
                role_check("arn:aws:iam::123456789012:role/absent"),
                role_check("arn:aws:iam::123456789012:role/flaky"),
            ],
        );

        assert!(outcomes[0].passed());
        assert_eq!(outcomes[1].status, PrerequisiteStatus::Missing);
        assert!(matches!(outcomes[2].status, PrerequisiteStatus::Error(ref m) if m.contains("Throttling")));
    }

    #[test]
    fn outcome_serializes_flat() {
        let outcome = PrerequisiteOutcome {
            check: role_check("arn:aws:iam::123456789012:role/absent"),
            status: PrerequisiteStatus::Missing,
        };
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "missing");
        assert_eq!(json["check"]["kind"], "iam_role_exists");
    }
}
