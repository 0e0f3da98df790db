//! Resource mapping: from template resources to the IAM actions, resource
//! identifiers and prerequisites a deployment needs.
//!
//! Resources are processed independently and in declaration order. Every
//! output collection is deduplicated and sorted so the result of an analysis
//! is deterministic for a given template and input.

pub mod analyzer;
pub mod arn;
pub mod prerequisites;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::resolve::Identity;

pub use analyzer::TemplateAnalyzer;
pub use prerequisites::{PrerequisiteCheck, PrerequisiteKind};

/// Action required to create a stack; also the fallback for resource types
/// without a capability entry.
pub const CREATE_STACK_ACTION: &str = "cloudformation:CreateStack";

/// Run input for one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    /// Supplied parameter values, by parameter name.
    pub parameters: HashMap<String, String>,
    pub identity: Identity,
    /// Conditions forced to a value for this run.
    pub condition_overrides: HashMap<String, bool>,
}

impl AnalysisInput {
    pub fn new(identity: Identity) -> Self {
        Self {
            parameters: HashMap::new(),
            identity,
            condition_overrides: HashMap::new(),
        }
    }
}

/// A resource that was not mapped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedResource {
    pub logical_id: String,
    pub reason: String,
}

/// Outcome of analyzing a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub actions: BTreeSet<String>,
    pub resource_arns: BTreeSet<String>,
    pub prerequisite_checks: Vec<PrerequisiteCheck>,
    /// Resource types with no capability entry.
    pub unmapped_types: BTreeSet<String>,
    pub skipped_resources: Vec<SkippedResource>,
    pub evaluated_conditions: BTreeMap<String, bool>,
}

impl AnalysisResult {
    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}
