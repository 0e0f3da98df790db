use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};
use serde::de::DeserializeOwned;
use which::which;

use super::AwsError;
use super::json_types::GetCallerIdentityResponse;

/// Runs `aws` commands with an optional profile and region.
pub struct AwsCli {
    aws_path: PathBuf,
    profile: Option<String>,
    region: Option<String>,
}

/// Who the configured credentials belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
    pub user_id: Option<String>,
}

impl AwsCli {
    /// Creates a new runner, verifying the AWS CLI is installed.
    pub fn new(profile: Option<String>, region: Option<String>) -> Result<Self, AwsError> {
        let aws_path = which("aws").map_err(|_| AwsError::NotFound)?;

        debug!("Found aws at: {:?}", aws_path);

        Ok(Self {
            aws_path,
            profile,
            region,
        })
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Arguments appended to every command.
    fn common_args(&self) -> Vec<String> {
        let mut args = vec!["--output".to_string(), "json".to_string()];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args
    }

    /// Runs `aws <args>` and returns its standard output.
    pub(crate) fn run(&self, args: &[String]) -> Result<String, AwsError> {
        debug!("Running aws {}", args.join(" "));

        let output = Command::new(&self.aws_path)
            .args(args)
            .args(self.common_args())
            .output()
            .map_err(|e| AwsError::CommandFailed(format!("Failed to execute aws: {}", e)))?;

        if output.status.success() {
            String::from_utf8(output.stdout)
                .map_err(|e| AwsError::InvalidOutput(format!("Invalid UTF-8 in aws output: {}", e)))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let error_message = if !stderr.is_empty() { stderr } else { stdout };
            Err(AwsError::from_message(error_message.trim().to_string()))
        }
    }

    /// Runs a command and deserializes its JSON output.
    pub(crate) fn run_json<T: DeserializeOwned>(&self, args: &[String]) -> Result<T, AwsError> {
        let stdout = self.run(args)?;
        serde_json::from_str(&stdout).map_err(|e| AwsError::InvalidOutput(e.to_string()))
    }

    /// Runs `aws sts get-caller-identity`.
    pub fn caller_identity(&self) -> Result<CallerIdentity, AwsError> {
        info!("Looking up the caller identity");

        let response: GetCallerIdentityResponse =
            self.run_json(&["sts".to_string(), "get-caller-identity".to_string()])?;

        debug!("Caller is {} in account {}", response.arn, response.account);
        Ok(CallerIdentity {
            account_id: response.account,
            arn: response.arn,
            user_id: response.user_id,
        })
    }
}
