//! Template analyzer.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use super::arn::{any_role_arn, build_resource_arn, role_arn_for_name};
use super::prerequisites::collect_prerequisites;
use super::{AnalysisInput, AnalysisResult, CREATE_STACK_ACTION, SkippedResource};
use crate::capability::CapabilityTable;
use crate::resolve::{ResolutionContext, ResolveError, naming};
use crate::template::{Node, ResourceDeclaration, Template, TemplateError, TemplateLoader};

const PASS_ROLE_ACTION: &str = "iam:PassRole";

/// Maps template resources to required actions using a capability table.
pub struct TemplateAnalyzer<'a> {
    capabilities: &'a CapabilityTable,
}

impl<'a> TemplateAnalyzer<'a> {
    pub fn new(capabilities: &'a CapabilityTable) -> Self {
        Self { capabilities }
    }

    /// Loads the template at `path` and analyzes it.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the template cannot be read, parsed or
    /// fails the structural checks.
    pub fn analyze_file(
        &self,
        loader: &TemplateLoader,
        path: &Path,
        input: &AnalysisInput,
    ) -> Result<AnalysisResult, TemplateError> {
        let template = loader.load(path)?;
        Ok(self.analyze(template, input))
    }

    /// Analyzes every resource of `template`.
    ///
    /// # Arguments
    ///
    /// * `template` - The loaded template
    /// * `input` - Parameter values, identity and condition overrides for the run
    ///
    /// # Returns
    ///
    /// Sorted unique actions and resource identifiers, prerequisite checks,
    /// and diagnostics about skipped resources and unmapped types.
    pub fn analyze(&self, template: Arc<Template>, input: &AnalysisInput) -> AnalysisResult {
        let context = ResolutionContext::new(
            Arc::clone(&template),
            &input.parameters,
            input.identity.clone(),
        )
        .with_condition_overrides(input.condition_overrides.clone());

        let mut result = AnalysisResult {
            prerequisite_checks: collect_prerequisites(context.parameters()),
            ..AnalysisResult::default()
        };

        for (logical_id, declaration) in &template.resources {
            self.analyze_resource(&context, logical_id, declaration, &mut result);
        }

        result.evaluated_conditions = context.evaluated_conditions();
        info!(
            "Analysis found {} actions on {} resource identifiers",
            result.actions.len(),
            result.resource_arns.len()
        );
        result
    }

    fn analyze_resource(
        &self,
        context: &ResolutionContext,
        logical_id: &str,
        declaration: &ResourceDeclaration,
        result: &mut AnalysisResult,
    ) {
        let mut skip = |reason: String| {
            result.skipped_resources.push(SkippedResource {
                logical_id: logical_id.to_string(),
                reason,
            });
        };

        let Some(resource_type) = declaration.resource_type.as_deref() else {
            warn!("Resource {} has no Type, skipping", logical_id);
            skip("missing Type".to_string());
            return;
        };

        if let Some(condition) = declaration.condition.as_deref() {
            match context.evaluate_condition(condition) {
                Ok(true) => debug!("Condition '{}' of {} is true", condition, logical_id),
                Ok(false) => {
                    info!(
                        "Skipping {} because condition '{}' is false",
                        logical_id, condition
                    );
                    skip(format!("condition '{}' is false", condition));
                    return;
                }
                Err(e) => {
                    warn!(
                        "Skipping {}: condition '{}' could not be evaluated: {}",
                        logical_id, condition, e
                    );
                    skip(format!("condition '{}' failed: {}", condition, e));
                    return;
                }
            }
        }

        info!("Processing resource {} ({})", logical_id, resource_type);

        let Some(entry) = self.capabilities.get(resource_type) else {
            warn!(
                "No capability mapping for resource type {}, checking {} only",
                resource_type, CREATE_STACK_ACTION
            );
            result.unmapped_types.insert(resource_type.to_string());
            result.actions.insert(CREATE_STACK_ACTION.to_string());
            return;
        };

        if entry.custom_resource {
            debug!(
                "{} is a custom resource; its handler's role governs what it does",
                logical_id
            );
            result.actions.insert(CREATE_STACK_ACTION.to_string());
            return;
        }

        let mut own_actions: BTreeSet<String> = entry.generic_actions.iter().cloned().collect();

        let name = match context.resource_name(logical_id) {
            Ok(name) => name,
            Err(e) => {
                warn!("Could not resolve the name of {}: {}", logical_id, e);
                None
            }
        };
        let arn = build_resource_arn(
            entry.arn_pattern(),
            logical_id,
            name.as_deref(),
            naming::rule_for(resource_type),
            context.identity(),
        );
        debug!("{} maps to {}", logical_id, arn);
        result.resource_arns.insert(arn);

        for (property, value) in &declaration.properties {
            let Some(actions) = entry.property_actions.get(property) else {
                continue;
            };
            own_actions.extend(actions.iter().cloned());

            if actions.iter().any(|action| action == PASS_ROLE_ACTION) {
                if let Some(role_arn) = pass_role_arn(context, logical_id, property, value) {
                    debug!("{} passes role {}", logical_id, role_arn);
                    result.resource_arns.insert(role_arn);
                }
            }
        }

        if declaration.properties.contains_key("Tags") {
            if let Some(action) = missing_tag_action(resource_type, &own_actions) {
                debug!("Adding {} for the Tags of {}", action, logical_id);
                own_actions.insert(action);
            }
        }

        result.actions.extend(own_actions);
    }
}

/// Identifier of the role a property passes.
///
/// ARNs are used as given; anything else is taken as a role name.
fn pass_role_arn(
    context: &ResolutionContext,
    logical_id: &str,
    property: &str,
    value: &Node,
) -> Option<String> {
    let role = match context.resolve(value) {
        Ok(role) => role.to_template_string(),
        Err(ResolveError::CircularDependency(cycle)) => {
            warn!(
                "Could not resolve {}.{} ({}), assuming any role",
                logical_id,
                property,
                cycle.join(" -> ")
            );
            return Some(any_role_arn(context.identity()));
        }
    };

    let role = role.trim();
    if role.is_empty() {
        debug!("{}.{} passes no role", logical_id, property);
        return None;
    }

    if role.starts_with("arn:") {
        Some(role.to_string())
    } else {
        Some(role_arn_for_name(role, context.identity()))
    }
}

/// `<service>:TagResource` when the resource's own actions cannot tag it.
fn missing_tag_action(resource_type: &str, own_actions: &BTreeSet<String>) -> Option<String> {
    let segments: Vec<&str> = resource_type.split("::").collect();
    if segments.len() < 3 {
        return None;
    }

    let service = segments[1].to_lowercase();
    let tag_resource = format!("{}:TagResource", service);
    let create_tags = format!("{}:CreateTags", service);
    let tag_prefix = format!("{}:Tag", service);

    let can_tag = own_actions.contains(&tag_resource)
        || own_actions.contains(&create_tags)
        || own_actions
            .iter()
            .any(|action| action.ends_with("Tagging") || action.starts_with(&tag_prefix));

    (!can_tag).then_some(tag_resource)
}
