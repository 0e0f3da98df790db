//! JSON output formatter for AWS IAM policy documents.

use serde::Serialize;

use super::formatter::OutputFormatter;
use super::policy::RemediationPolicy;

/// AWS IAM policy document structure.
#[derive(Serialize)]
struct PolicyDocument<'a> {
    #[serde(rename = "Version")]
    version: &'static str,
    #[serde(rename = "Statement")]
    statement: Vec<Statement<'a>>,
}

#[derive(Serialize)]
struct Statement<'a> {
    #[serde(rename = "Effect")]
    effect: &'static str,
    #[serde(rename = "Action")]
    action: Vec<&'a str>,
    #[serde(rename = "Resource")]
    resource: &'a str,
}

/// Formatter that outputs the policy as an IAM policy document.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, policy: &RemediationPolicy) -> String {
        let document = PolicyDocument {
            version: "2012-10-17",
            statement: policy
                .statements
                .iter()
                .map(|statement| Statement {
                    effect: "Allow",
                    action: statement.actions.iter().map(String::as_str).collect(),
                    resource: &statement.resource,
                })
                .collect(),
        };

        serde_json::to_string_pretty(&document).expect("JSON serialization should not fail")
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
