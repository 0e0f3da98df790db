//! Output formatter trait and factory.

use crate::cli::OutputFormat;

use super::policy::RemediationPolicy;

/// Renders a remediation policy in one output format.
pub trait OutputFormatter {
    fn format(&self, policy: &RemediationPolicy) -> String;

    /// File extension used when writing to a directory.
    fn extension(&self) -> &'static str;
}

/// Creates the appropriate formatter for the given output format.
///
/// # Arguments
///
/// * `format` - The output format to create a formatter for
///
/// # Returns
///
/// A boxed formatter implementing the `OutputFormatter` trait.
pub fn create_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    use super::hcl::HclFormatter;
    use super::json::JsonFormatter;
    use super::plain::PlainFormatter;

    match format {
        OutputFormat::Plain => Box::new(PlainFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Hcl => Box::new(HclFormatter),
    }
}
