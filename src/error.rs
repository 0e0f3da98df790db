use thiserror::Error;

use crate::aws::AwsError;
use crate::capability::CapabilityError;
use crate::output::OutputError;
use crate::resolve::ResolveError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("Capability table error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("{0}")]
    Aws(#[from] AwsError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

pub type Result<T> = std::result::Result<T, PreflightError>;
