//! Machine readable record of one run.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::analysis::AnalysisResult;
use crate::aws::{PrerequisiteOutcome, SimulationOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    /// RFC 3339 timestamp in UTC.
    pub generated_at: String,
    pub template_file: &'a Path,
    pub principal_arn: Option<&'a str>,
    pub account_id: &'a str,
    pub region: &'a str,
    /// Parameter values with secrets masked.
    pub parameters: BTreeMap<&'a str, String>,
    pub analysis: &'a AnalysisResult,
    pub prerequisites: &'a [PrerequisiteOutcome],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<&'a SimulationOutcome>,
    pub passed: bool,
}

/// Current time as the report timestamp.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl RunReport<'_> {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("JSON serialization should not fail")
    }
}
