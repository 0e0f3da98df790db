//! AWS collaborators: identity lookup, IAM policy simulation and
//! prerequisite checks, all driven through the `aws` command line tool.
//!
//! The core analysis never talks to AWS. Everything here sits behind the
//! [`PolicySimulator`] and [`PrerequisiteChecker`] traits so the checks can
//! be exercised with in-memory fakes.

mod json_types;
pub mod prerequisites;
pub mod profiles;
mod runner;
pub mod simulator;

use serde::Serialize;
use thiserror::Error;

pub use prerequisites::{PrerequisiteChecker, PrerequisiteOutcome, PrerequisiteStatus, check_prerequisites};
pub use profiles::list_profiles;
pub use runner::{AwsCli, CallerIdentity};
pub use simulator::{
    Decision, EvaluationResult, PolicySimulator, SimulationOutcome, relevant_resource_arns,
    simulate_permissions,
};

/// Errors raised at the AWS boundary.
#[derive(Debug, Error)]
pub enum AwsError {
    #[error(
        "The AWS CLI is not installed or not found in PATH. Please install it: https://aws.amazon.com/cli/"
    )]
    NotFound,

    #[error("Access denied by AWS:\n{0}")]
    AccessDenied(String),

    #[error("AWS entity does not exist:\n{0}")]
    NoSuchEntity(String),

    #[error("Invalid input for AWS:\n{0}")]
    InvalidInput(String),

    #[error("AWS CLI command failed:\n{0}")]
    CommandFailed(String),

    #[error("Failed to parse AWS CLI output: {0}")]
    InvalidOutput(String),
}

impl AwsError {
    /// Classifies a failed command by the error code in its message.
    pub(crate) fn from_message(message: String) -> Self {
        if message.contains("AccessDenied") {
            AwsError::AccessDenied(message)
        } else if message.contains("NoSuchEntity") {
            AwsError::NoSuchEntity(message)
        } else if message.contains("InvalidInput") {
            AwsError::InvalidInput(message)
        } else {
            AwsError::CommandFailed(message)
        }
    }
}

/// A context key passed to the policy simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContextEntry {
    pub context_key_name: String,
    pub context_key_values: Vec<String>,
    pub context_key_type: String,
}

impl ContextEntry {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            context_key_name: name.into(),
            context_key_values: vec![value.into()],
            context_key_type: "string".to_string(),
        }
    }
}

/// Context entries derived from the run's parameter values.
///
/// An `ExternalID` parameter becomes the `sts:ExternalId` key.
pub fn context_entries(parameters: &std::collections::HashMap<String, String>) -> Vec<ContextEntry> {
    parameters
        .get("ExternalID")
        .filter(|value| !value.is_empty())
        .map(|value| vec![ContextEntry::string("sts:ExternalId", value.as_str())])
        .unwrap_or_default()
}

/// Masks all but the last four characters of a secret value.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
