//! CloudFormation template model and loader.
//!
//! Templates are parsed from YAML (JSON is accepted as a YAML subset),
//! short-form intrinsic tags are desugared through an explicit [`TagConfig`],
//! and the document is validated just enough to guarantee a non-empty
//! `Resources` section.

pub mod intrinsic;
pub mod loader;
pub mod node;

use std::path::PathBuf;

use indexmap::IndexMap;
use thiserror::Error;

pub use intrinsic::{Intrinsic, IntrinsicKind, TagConfig};
pub use loader::{TemplateLoader, parse_document};
pub use node::{Node, NodeMap};

/// Errors that can occur while loading a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template file too large: {}", .0.display())]
    FileTooLarge(PathBuf),

    #[error("Failed to parse template: {0}")]
    Parse(String),

    #[error("Invalid template structure: {0}")]
    Structure(String),
}

/// A declared template parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterDefinition {
    pub param_type: Option<String>,
    pub default: Option<Node>,
    pub description: Option<String>,
    pub no_echo: bool,
}

impl ParameterDefinition {
    /// `CommaDelimitedList` and `List<...>` parameters bind to lists.
    pub fn is_list(&self) -> bool {
        self.param_type
            .as_deref()
            .is_some_and(|t| t == "CommaDelimitedList" || t.starts_with("List<"))
    }

    fn from_node(node: &Node) -> Self {
        Self {
            param_type: node.get("Type").and_then(Node::as_str).map(str::to_string),
            default: node.get("Default").cloned(),
            description: node
                .get("Description")
                .and_then(Node::as_str)
                .map(str::to_string),
            no_echo: node
                .get("NoEcho")
                .is_some_and(|v| v.to_template_string().eq_ignore_ascii_case("true")),
        }
    }
}

/// One entry of the `Resources` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDeclaration {
    /// `None` when the declaration omits `Type`; such resources are skipped.
    pub resource_type: Option<String>,
    pub properties: NodeMap,
    pub condition: Option<String>,
}

impl ResourceDeclaration {
    fn from_node(node: &Node) -> Self {
        Self {
            resource_type: node.get("Type").and_then(Node::as_str).map(str::to_string),
            properties: node
                .get("Properties")
                .and_then(Node::as_map)
                .cloned()
                .unwrap_or_default(),
            condition: node
                .get("Condition")
                .and_then(Node::as_str)
                .map(str::to_string),
        }
    }
}

/// A parsed template. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Template {
    pub description: Option<String>,
    pub parameters: IndexMap<String, ParameterDefinition>,
    pub mappings: NodeMap,
    pub conditions: NodeMap,
    pub resources: IndexMap<String, ResourceDeclaration>,
}

impl Template {
    /// Builds a template from a parsed document root.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Structure` if the root is not a map or if the
    /// `Resources` section is missing, not a map, or empty.
    pub fn from_root(root: Node) -> Result<Self, TemplateError> {
        let Node::Map(mut root) = root else {
            return Err(TemplateError::Structure(
                "Template root must be a mapping".to_string(),
            ));
        };

        let resources = match root.shift_remove("Resources") {
            Some(Node::Map(resources)) if !resources.is_empty() => resources,
            Some(Node::Map(_)) => {
                return Err(TemplateError::Structure(
                    "'Resources' section is empty".to_string(),
                ));
            }
            Some(_) => {
                return Err(TemplateError::Structure(
                    "'Resources' section must be a mapping".to_string(),
                ));
            }
            None => {
                return Err(TemplateError::Structure(
                    "Template has no 'Resources' section".to_string(),
                ));
            }
        };

        let section = |root: &mut NodeMap, name: &str| match root.shift_remove(name) {
            Some(Node::Map(map)) => map,
            Some(Node::Null) | None => NodeMap::new(),
            Some(_) => {
                log::warn!("Ignoring '{}' section: expected a mapping", name);
                NodeMap::new()
            }
        };

        let parameters = section(&mut root, "Parameters")
            .iter()
            .map(|(name, node)| (name.clone(), ParameterDefinition::from_node(node)))
            .collect();
        let mappings = section(&mut root, "Mappings");
        let conditions = section(&mut root, "Conditions");

        Ok(Self {
            description: root
                .get("Description")
                .and_then(Node::as_str)
                .map(str::to_string),
            parameters,
            mappings,
            conditions,
            resources: resources
                .iter()
                .map(|(id, node)| (id.clone(), ResourceDeclaration::from_node(node)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<Template, TemplateError> {
        TemplateLoader::new().parse_str(yaml)
    }

    #[test]
    fn parameters_keep_type_and_default() {
        let template = parse(
            r#"
Parameters:
  Env:
    Type: String
    Default: dev
  Subnets:
    Type: List<AWS::EC2::Subnet::Id>
  Secret:
    Type: String
    NoEcho: true
Resources:
  Queue:
    Type: AWS::SQS::Queue
"#,
        )
        .expect("template should load");

        let env = &template.parameters["Env"];
        assert_eq!(env.param_type.as_deref(), Some("String"));
        assert_eq!(env.default, Some(Node::string("dev")));
        assert!(!env.is_list());
        assert!(template.parameters["Subnets"].is_list());
        assert!(template.parameters["Secret"].no_echo);
    }

    #[test]
    fn resources_keep_declaration_order() {
        let template = parse(
            r#"
Resources:
  Zeta:
    Type: AWS::SQS::Queue
  Alpha:
    Type: AWS::SNS::Topic
  Mid:
    Type: AWS::S3::Bucket
"#,
        )
        .expect("template should load");

        let ids: Vec<_> = template.resources.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn resource_condition_and_properties_are_read() {
        let template = parse(
            r#"
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Condition: IsProd
    Properties:
      BucketName: logs
"#,
        )
        .expect("template should load");

        let bucket = &template.resources["Bucket"];
        assert_eq!(bucket.resource_type.as_deref(), Some("AWS::S3::Bucket"));
        assert_eq!(bucket.condition.as_deref(), Some("IsProd"));
        assert_eq!(bucket.properties.get("BucketName"), Some(&Node::string("logs")));
    }

    #[test]
    fn missing_type_is_kept_for_later_skipping() {
        let template = parse(
            r#"
Resources:
  Broken:
    Properties: {}
"#,
        )
        .expect("template should load");

        assert_eq!(template.resources["Broken"].resource_type, None);
    }

    #[test]
    fn non_mapping_root_is_structure_error() {
        let err = parse("- just\n- a list\n").unwrap_err();
        assert!(matches!(err, TemplateError::Structure(_)));
    }

    #[test]
    fn missing_resources_is_structure_error() {
        let err = parse("Parameters: {}\n").unwrap_err();
        assert!(matches!(err, TemplateError::Structure(_)));
        assert!(err.to_string().contains("Resources"));
    }

    #[test]
    fn empty_resources_is_structure_error() {
        let err = parse("Resources: {}\n").unwrap_err();
        assert!(matches!(err, TemplateError::Structure(_)));
        assert!(err.to_string().contains("empty"));
    }
}
