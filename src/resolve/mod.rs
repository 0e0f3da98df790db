//! Intrinsic expression resolution and condition evaluation.
//!
//! A [`ResolutionContext`] bundles everything needed to turn raw template
//! values into concrete ones: the template, bound parameter values, the
//! deploying identity, condition overrides and the per-run caches.
//!
//! Resolution never fails on unknown input. Unresolvable references and
//! malformed intrinsics produce descriptive placeholder strings and a
//! warning. The only hard error is a circular dependency between conditions
//! or between resources whose names are derived from each other.

pub mod attributes;
pub mod cache;
pub mod conditions;
pub mod expression;
pub mod naming;
pub mod pseudo;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::template::{Node, NodeMap, Template};
use cache::ExpressionCache;
pub use pseudo::PseudoParameters;

/// Errors that abort the resolution of a single value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
}

/// Account and region the template is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub account_id: String,
    pub region: String,
}

impl Identity {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
        }
    }
}

/// Per-run state for resolving expressions and evaluating conditions.
///
/// Both caches are append-only for the lifetime of the context. The context
/// is single threaded; interior mutability is limited to the caches and the
/// cycle-detection stack.
pub struct ResolutionContext {
    template: Arc<Template>,
    parameters: NodeMap,
    identity: Identity,
    pseudo: PseudoParameters,
    condition_overrides: HashMap<String, bool>,
    condition_cache: RefCell<HashMap<String, bool>>,
    expression_cache: RefCell<ExpressionCache>,
    resolving: RefCell<Vec<String>>,
}

impl ResolutionContext {
    /// Creates a context for `template`.
    ///
    /// # Arguments
    ///
    /// * `template` - The loaded template
    /// * `parameter_values` - Supplied parameter values; declared defaults fill the gaps
    /// * `identity` - Deploying account and target region
    pub fn new(
        template: Arc<Template>,
        parameter_values: &HashMap<String, String>,
        identity: Identity,
    ) -> Self {
        let parameters = bind_parameters(&template, parameter_values);
        Self {
            template,
            parameters,
            identity,
            pseudo: PseudoParameters::default(),
            condition_overrides: HashMap::new(),
            condition_cache: RefCell::new(HashMap::new()),
            expression_cache: RefCell::new(ExpressionCache::default()),
            resolving: RefCell::new(Vec::new()),
        }
    }

    /// Forces the named conditions to the given values.
    pub fn with_condition_overrides(mut self, overrides: HashMap<String, bool>) -> Self {
        self.condition_overrides = overrides;
        self
    }

    pub fn with_pseudo_parameters(mut self, pseudo: PseudoParameters) -> Self {
        self.pseudo = pseudo;
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Bound parameter values (supplied or defaulted).
    pub fn parameters(&self) -> &NodeMap {
        &self.parameters
    }

    /// Every condition evaluated so far, with its result.
    pub fn evaluated_conditions(&self) -> BTreeMap<String, bool> {
        self.condition_cache
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }

    /// Marks `key` as being resolved until the returned guard is dropped.
    fn enter(&self, key: String) -> Result<ResolvingGuard<'_>, ResolveError> {
        let mut stack = self.resolving.borrow_mut();
        if let Some(start) = stack.iter().position(|entry| *entry == key) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(key);
            return Err(ResolveError::CircularDependency(cycle));
        }
        stack.push(key);
        Ok(ResolvingGuard {
            stack: &self.resolving,
        })
    }
}

struct ResolvingGuard<'a> {
    stack: &'a RefCell<Vec<String>>,
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Binds supplied parameter values, falling back to declared defaults.
///
/// Values for parameters the template does not declare are ignored. List
/// typed parameters bind to lists split on `,`.
pub fn bind_parameters(template: &Template, supplied: &HashMap<String, String>) -> NodeMap {
    for name in supplied.keys() {
        if !template.parameters.contains_key(name) {
            log::debug!("Ignoring value for undeclared parameter '{}'", name);
        }
    }

    template
        .parameters
        .iter()
        .filter_map(|(name, definition)| {
            let value = supplied
                .get(name)
                .map(|v| Node::string(v.as_str()))
                .or_else(|| definition.default.clone())?;

            let value = match value {
                Node::String(s) if definition.is_list() => Node::List(
                    s.split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(Node::from)
                        .collect(),
                ),
                other => other,
            };

            Some((name.clone(), value))
        })
        .collect()
}
