//! HCL output formatter.
//!
//! Renders the policy as a `jsonencode()` expression for use in an
//! `aws_iam_policy` document.

use super::formatter::OutputFormatter;
use super::policy::{PolicyStatement, RemediationPolicy};

pub struct HclFormatter;

impl OutputFormatter for HclFormatter {
    fn format(&self, policy: &RemediationPolicy) -> String {
        let statements_content = if policy.is_empty() {
            "[]".to_string()
        } else {
            let blocks: Vec<String> = policy
                .statements
                .iter()
                .map(|statement| self.format_statement_block(statement, 4))
                .collect();
            format!("[\n{}\n  ]", blocks.join(",\n"))
        };

        format!(
            r#"jsonencode({{
  Version = "2012-10-17"
  Statement = {}
}})"#,
            statements_content
        )
    }

    fn extension(&self) -> &'static str {
        "hcl"
    }
}

impl HclFormatter {
    fn format_statement_block(&self, statement: &PolicyStatement, indent: usize) -> String {
        let pad = " ".repeat(indent);
        let actions = statement
            .actions
            .iter()
            .map(|action| format!("{}    {},", pad, quote(action)))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{pad}{{\n{pad}  Effect = \"Allow\"\n{pad}  Action = [\n{actions}\n{pad}  ]\n{pad}  Resource = {resource}\n{pad}}}",
            pad = pad,
            actions = actions,
            resource = quote(&statement.resource),
        )
    }
}

/// HCL string literal. `${` and `%{` start template sequences and are escaped.
fn quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "$${")
        .replace("%{", "%%{");
    format!("\"{}\"", escaped)
}
