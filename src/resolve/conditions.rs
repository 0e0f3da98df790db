//! Evaluation of named template conditions.
//!
//! Conditions are evaluated lazily and memoized per context. Overrides given
//! for a run take precedence over the template's definitions. Anything the
//! evaluator does not understand evaluates to `false` with a warning, so an
//! unsupported construct never silently includes a resource.

use log::{debug, warn};

use super::{ResolutionContext, ResolveError};
use crate::template::{IntrinsicKind, Node};

/// Why a condition expression could not produce a boolean.
#[derive(Debug)]
pub(super) enum ConditionFailure {
    Unsupported(String),
    Resolve(ResolveError),
}

impl From<ResolveError> for ConditionFailure {
    fn from(error: ResolveError) -> Self {
        ConditionFailure::Resolve(error)
    }
}

impl ResolutionContext {
    /// Evaluates the named condition.
    ///
    /// Precedence: run overrides, then the template's `Conditions` entry.
    /// Undefined conditions and unsupported expressions evaluate to `false`.
    ///
    /// # Errors
    ///
    /// `ResolveError::CircularDependency` if the condition (transitively)
    /// references itself.
    pub fn evaluate_condition(&self, name: &str) -> Result<bool, ResolveError> {
        if let Some(&cached) = self.condition_cache.borrow().get(name) {
            return Ok(cached);
        }

        let value = match self.condition_overrides.get(name) {
            Some(&value) => {
                debug!("Condition '{}' overridden to {}", name, value);
                value
            }
            None => self.evaluate_definition(name)?,
        };

        self.condition_cache
            .borrow_mut()
            .insert(name.to_string(), value);
        Ok(value)
    }

    fn evaluate_definition(&self, name: &str) -> Result<bool, ResolveError> {
        let Some(definition) = self.template.conditions.get(name) else {
            warn!("Condition '{}' is not defined, treating it as false", name);
            return Ok(false);
        };

        let _guard = self.enter(format!("condition:{}", name))?;
        match self.evaluate_condition_node(definition) {
            Ok(value) => {
                debug!("Condition '{}' evaluated to {}", name, value);
                Ok(value)
            }
            Err(ConditionFailure::Unsupported(reason)) => {
                warn!(
                    "Condition '{}' uses an unsupported form ({}), treating it as false",
                    name, reason
                );
                Ok(false)
            }
            Err(ConditionFailure::Resolve(e)) => Err(e),
        }
    }

    /// Evaluates a condition expression node.
    pub(super) fn evaluate_condition_node(&self, node: &Node) -> Result<bool, ConditionFailure> {
        let Some(intrinsic) = node.as_intrinsic() else {
            return match node {
                Node::Bool(value) => Ok(*value),
                other => Err(ConditionFailure::Unsupported(format!(
                    "expected a condition function, found {}",
                    other.canonical_form()
                ))),
            };
        };

        let argument = intrinsic.argument;
        match intrinsic.kind {
            IntrinsicKind::Equals => {
                let Some([left, right]) = argument.as_list() else {
                    return Err(ConditionFailure::Unsupported(
                        "Fn::Equals takes exactly two values".to_string(),
                    ));
                };
                let left = self.resolve(left)?.to_template_string();
                let right = self.resolve(right)?.to_template_string();
                Ok(left == right)
            }
            IntrinsicKind::Condition => match argument.as_str() {
                Some(name) => Ok(self.evaluate_condition(name)?),
                None => Err(ConditionFailure::Unsupported(
                    "Condition takes a condition name".to_string(),
                )),
            },
            IntrinsicKind::And | IntrinsicKind::Or => {
                let operands = match argument.as_list() {
                    Some(operands) if !operands.is_empty() => operands,
                    _ => {
                        return Err(ConditionFailure::Unsupported(format!(
                            "{} takes a non-empty list of conditions",
                            intrinsic.kind.key()
                        )));
                    }
                };
                let values = operands
                    .iter()
                    .map(|operand| self.evaluate_condition_node(operand))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(if intrinsic.kind == IntrinsicKind::And {
                    values.iter().all(|v| *v)
                } else {
                    values.iter().any(|v| *v)
                })
            }
            IntrinsicKind::Not => match argument.as_list() {
                Some([operand]) => Ok(!self.evaluate_condition_node(operand)?),
                _ => Err(ConditionFailure::Unsupported(
                    "Fn::Not takes exactly one condition".to_string(),
                )),
            },
            other => Err(ConditionFailure::Unsupported(format!(
                "{} is not a condition function",
                other.key()
            ))),
        }
    }
}
