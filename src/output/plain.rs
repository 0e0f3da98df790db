//! Plain text output formatter.
//!
//! One block per resource: the resource on its own line followed by its
//! actions, indented.

use super::formatter::OutputFormatter;
use super::policy::RemediationPolicy;

pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn format(&self, policy: &RemediationPolicy) -> String {
        policy
            .statements
            .iter()
            .map(|statement| {
                let mut block = format!("Resource: {}", statement.resource);
                for action in &statement.actions {
                    block.push_str("\n  ");
                    block.push_str(action);
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}
