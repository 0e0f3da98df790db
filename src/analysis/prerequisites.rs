//! Prerequisites a stack relies on but does not create.

use std::fmt;

use serde::Serialize;

use crate::template::{Node, NodeMap};

/// Suffix of parameters that pass in an existing role by ARN.
const ROLE_ARN_PARAMETER_SUFFIX: &str = "RoleArn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteKind {
    IamRoleExists,
}

impl fmt::Display for PrerequisiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrerequisiteKind::IamRoleExists => write!(f, "iam_role_exists"),
        }
    }
}

/// A resource that must exist before deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrerequisiteCheck {
    pub kind: PrerequisiteKind,
    pub identifier: String,
    pub description: String,
}

/// Collects a role check for every bound `*RoleArn` parameter with a
/// non-empty string value, in parameter declaration order.
pub fn collect_prerequisites(parameters: &NodeMap) -> Vec<PrerequisiteCheck> {
    parameters
        .iter()
        .filter(|(name, _)| name.ends_with(ROLE_ARN_PARAMETER_SUFFIX))
        .filter_map(|(name, value)| match value {
            Node::String(arn) if !arn.trim().is_empty() => Some(PrerequisiteCheck {
                kind: PrerequisiteKind::IamRoleExists,
                identifier: arn.trim().to_string(),
                description: format!("{} parameter", name),
            }),
            _ => None,
        })
        .collect()
}
