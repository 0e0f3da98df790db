use std::path::PathBuf;

use clap::Parser;

/// CloudFormation pre-flight permission checker
///
/// Predicts whether a principal may deploy a CloudFormation template by
/// deriving the IAM actions and resources the template needs and simulating
/// them against the principal's policies.
///
/// DISCLAIMER: The analysis is static. It covers the permissions of the
/// deploying principal, not of the resources the stack creates, and cannot
/// see every runtime value.
#[derive(Parser, Debug)]
#[command(name = "cfn-preflight")]
#[command(version)]
#[command(about, long_about)]
pub struct Cli {
    /// Path to the CloudFormation template (YAML or JSON)
    #[arg(short = 't', long = "template-file")]
    pub template_file: PathBuf,

    /// ARN of the principal that will deploy the stack (defaults to the caller)
    #[arg(short = 'p', long = "deploying-principal-arn")]
    pub deploying_principal_arn: Option<String>,

    /// Target region
    #[arg(long = "region")]
    pub region: Option<String>,

    /// Target account id (defaults to the caller's account)
    #[arg(long = "account-id")]
    pub account_id: Option<String>,

    /// Template parameter values as Key=Value
    #[arg(long = "parameters", num_args = 1..)]
    pub parameters: Vec<String>,

    /// AWS CLI profile to use
    #[arg(long = "profile", env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Condition values as a JSON object, e.g. '{"IsProd": true}'
    #[arg(long = "condition-values")]
    pub condition_values: Option<String>,

    /// Additional capability table (YAML) overriding built-in entries
    #[arg(long = "capabilities-file")]
    pub capabilities_file: Option<PathBuf>,

    /// Only analyze the template; do not call AWS
    #[arg(short = 'a', long = "analyze-only")]
    pub analyze_only: bool,

    /// Format of the remediation policy: plain, json, hcl
    #[arg(short = 'f', long = "output-format", default_value = "plain")]
    pub output_format: OutputFormat,

    /// Output directory for the remediation policy and run report
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Suppress colored output (useful for CI/CD pipelines)
    #[arg(short = 'n', long = "no-color")]
    pub no_color: bool,

    /// Enable verbose output for debugging
    #[arg(long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
    Hcl,
}
