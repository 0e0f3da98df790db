//! Remediation policy for permissions the simulation denied.

use std::collections::{BTreeMap, BTreeSet};

use crate::aws::EvaluationResult;

/// Actions to allow on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub resource: String,
    pub actions: BTreeSet<String>,
}

/// Policy granting exactly the denied permissions, one statement per resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationPolicy {
    pub statements: Vec<PolicyStatement>,
}

impl RemediationPolicy {
    /// Groups denied results by resource. Statements and actions are sorted.
    pub fn from_failures<'a>(failures: impl IntoIterator<Item = &'a EvaluationResult>) -> Self {
        let mut by_resource: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for failure in failures {
            by_resource
                .entry(failure.resource.clone())
                .or_default()
                .insert(failure.action.clone());
        }

        Self {
            statements: by_resource
                .into_iter()
                .map(|(resource, actions)| PolicyStatement { resource, actions })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
