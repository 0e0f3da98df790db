//! Output generation.
//!
//! Renders analysis results, check summaries and the remediation policy to
//! stdout, and writes the policy and the JSON run report to an output
//! directory when one is configured.

pub mod formatter;
pub mod hcl;
pub mod json;
pub mod plain;
pub mod policy;
pub mod report;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use colored::{Color, Colorize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::analysis::AnalysisResult;
use crate::aws::{PrerequisiteOutcome, PrerequisiteStatus, SimulationOutcome};
use crate::cli::OutputFormat;
use formatter::create_formatter;
pub use policy::RemediationPolicy;
pub use report::RunReport;

/// Errors that can occur during output generation.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),
}

/// Sanitizes a filename to prevent path traversal.
///
/// Path separators are replaced, leading and trailing dots and whitespace are
/// trimmed. Returns `None` if nothing safe remains.
fn sanitize_filename(name: &str) -> Option<String> {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            _ => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');

    if trimmed.is_empty() || trimmed.contains("..") || trimmed.starts_with('.') {
        return None;
    }

    Some(trimmed.to_string())
}

/// Writes run results to stdout and, optionally, an output directory.
pub struct OutputWriter {
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    no_color: bool,
}

impl OutputWriter {
    /// Creates a new output writer.
    ///
    /// # Arguments
    ///
    /// * `format` - Format of the remediation policy
    /// * `output_dir` - Optional directory for the policy and report files
    /// * `no_color` - Whether to disable colored output
    pub fn new(format: OutputFormat, output_dir: Option<PathBuf>, no_color: bool) -> Self {
        Self {
            format,
            output_dir,
            no_color,
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.color(color).bold().to_string()
        }
    }

    fn header(&self, title: &str) -> String {
        let header = format!("----------- {} -----------", title);
        if self.no_color {
            header
        } else {
            header.cyan().bold().to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("[PASS]", Color::Green)
    }

    fn fail(&self) -> String {
        self.paint("[FAIL]", Color::Red)
    }

    /// Renders the analysis as sections of one item per line.
    pub fn render_analysis(&self, result: &AnalysisResult) -> String {
        let mut sections = vec![
            self.section("Actions", result.actions.iter().cloned()),
            self.section("Resource identifiers", result.resource_arns.iter().cloned()),
            self.section(
                "Prerequisite checks",
                result.prerequisite_checks.iter().map(|check| {
                    format!("{}: {} ({})", check.kind, check.identifier, check.description)
                }),
            ),
        ];

        if !result.unmapped_types.is_empty() {
            sections.push(self.section(
                "Unmapped resource types",
                result.unmapped_types.iter().cloned(),
            ));
        }
        if !result.skipped_resources.is_empty() {
            sections.push(self.section(
                "Skipped resources",
                result
                    .skipped_resources
                    .iter()
                    .map(|skipped| format!("{}: {}", skipped.logical_id, skipped.reason)),
            ));
        }
        if !result.evaluated_conditions.is_empty() {
            sections.push(self.section(
                "Conditions",
                result
                    .evaluated_conditions
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value)),
            ));
        }

        sections.join("\n\n")
    }

    fn section(&self, title: &str, items: impl Iterator<Item = String>) -> String {
        let mut lines = vec![self.header(title)];
        lines.extend(items);
        if lines.len() == 1 {
            lines.push("(none)".to_string());
        }
        lines.join("\n")
    }

    /// One `[PASS]`/`[FAIL]` line per prerequisite.
    pub fn render_prerequisites(&self, outcomes: &[PrerequisiteOutcome]) -> String {
        if outcomes.is_empty() {
            return format!("{} No prerequisite checks required", self.pass());
        }

        outcomes
            .iter()
            .map(|outcome| {
                let check = &outcome.check;
                match &outcome.status {
                    PrerequisiteStatus::Exists => {
                        format!("{} {} exists ({})", self.pass(), check.identifier, check.description)
                    }
                    PrerequisiteStatus::Missing => format!(
                        "{} {} does not exist ({})",
                        self.fail(),
                        check.identifier,
                        check.description
                    ),
                    PrerequisiteStatus::Error(message) => format!(
                        "{} {} could not be checked ({}): {}",
                        self.fail(),
                        check.identifier,
                        check.description,
                        message
                    ),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Summary line plus one line per denied action.
    pub fn render_simulation(&self, outcome: &SimulationOutcome) -> String {
        if outcome.all_allowed {
            return format!(
                "{} All {} simulated permissions are allowed",
                self.pass(),
                outcome.results.len()
            );
        }

        let mut lines = vec![format!(
            "{} Some permissions are denied for the deploying principal",
            self.fail()
        )];
        for failure in outcome.failures() {
            let mut line = format!(
                "  {} on {}: {}",
                failure.action,
                failure.resource,
                failure.decision.as_str()
            );
            if failure.denied_by_organizations {
                line.push_str(" (denied by an Organizations SCP)");
            }
            if failure.denied_by_permissions_boundary {
                line.push_str(" (denied by a permissions boundary)");
            }
            if let Some(error) = &failure.error {
                line.push_str(&format!(" (not simulated: {})", error));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    pub fn write_analysis(&self, result: &AnalysisResult) -> Result<(), OutputError> {
        self.print(&self.render_analysis(result))
    }

    pub fn write_prerequisites(&self, outcomes: &[PrerequisiteOutcome]) -> Result<(), OutputError> {
        self.print(&format!(
            "{}\n{}",
            self.header("Prerequisites"),
            self.render_prerequisites(outcomes)
        ))
    }

    pub fn write_simulation(&self, outcome: &SimulationOutcome) -> Result<(), OutputError> {
        self.print(&format!(
            "{}\n{}",
            self.header("Permissions"),
            self.render_simulation(outcome)
        ))
    }

    /// Writes the remediation policy.
    ///
    /// With an output directory the policy goes to
    /// `<name>-remediation-policy.<ext>`, otherwise to stdout.
    ///
    /// # Returns
    ///
    /// The written file, if any.
    pub fn write_policy(
        &self,
        name: &str,
        policy: &RemediationPolicy,
    ) -> Result<Option<PathBuf>, OutputError> {
        let formatter = create_formatter(self.format);
        let formatted = formatter.format(policy);

        match &self.output_dir {
            Some(dir) => {
                let suffix = format!("-remediation-policy.{}", formatter.extension());
                self.write_file(dir, name, &suffix, &formatted).map(Some)
            }
            None => {
                self.print(&format!(
                    "{}\n{}",
                    self.header("Remediation policy"),
                    formatted
                ))?;
                Ok(None)
            }
        }
    }

    /// Writes `<name>-preflight-report.json` when an output directory is set.
    pub fn write_report(&self, name: &str, report: &RunReport) -> Result<Option<PathBuf>, OutputError> {
        match &self.output_dir {
            Some(dir) => {
                self.write_file(dir, name, "-preflight-report.json", &report.to_json())
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn print(&self, text: &str) -> Result<(), OutputError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}\n", text)?;
        Ok(())
    }

    /// Writes `content` to `dir/<name><suffix>` through a temporary file so
    /// readers never see a partial file.
    fn write_file(
        &self,
        dir: &Path,
        name: &str,
        suffix: &str,
        content: &str,
    ) -> Result<PathBuf, OutputError> {
        let safe_name = sanitize_filename(name).ok_or_else(|| {
            OutputError::InvalidFilename(format!(
                "Output name '{}' contains invalid characters",
                name
            ))
        })?;

        fs::create_dir_all(dir)?;
        let file_path = dir.join(format!("{}{}", safe_name, suffix));

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.persist(&file_path).map_err(|e| OutputError::Io(e.error))?;

        log::info!("Written: {}", file_path.display());
        Ok(file_path)
    }
}
