//! Capability table: which IAM actions and resource identifier each
//! CloudFormation resource type implies.
//!
//! The built-in table ships as an embedded YAML asset. Users can extend or
//! replace entries with their own YAML file of the same shape.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::template::{Node, TagConfig, parse_document};

/// The built-in table.
const BUILTIN_TABLE: &str = include_str!("resource_map.yaml");

/// Maximum capability file size (1 MB).
const MAX_CAPABILITY_FILE_SIZE: u64 = 1024 * 1024;

/// Pattern used when an entry does not declare one.
pub const DEFAULT_ARN_PATTERN: &str =
    "arn:aws:*:{region}:{accountId}:{resourceLogicalIdPlaceholder}/*";

/// Errors that can occur while loading a capability table.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Failed to read capability file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capability file too large: {}", .0.display())]
    FileTooLarge(PathBuf),

    #[error("Failed to parse capability table: {0}")]
    Parse(String),

    #[error("Invalid capability entry '{0}': {1}")]
    InvalidEntry(String, String),
}

/// Capabilities of one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityEntry {
    pub generic_actions: Vec<String>,
    pub arn_pattern: Option<String>,
    /// Property name -> actions implied by declaring it.
    pub property_actions: IndexMap<String, Vec<String>>,
    /// Types backed by a handler function; only stack creation is checked.
    pub custom_resource: bool,
}

impl CapabilityEntry {
    pub fn arn_pattern(&self) -> &str {
        self.arn_pattern.as_deref().unwrap_or(DEFAULT_ARN_PATTERN)
    }

    fn from_node(resource_type: &str, node: &Node) -> Result<Self, CapabilityError> {
        let invalid = |message: &str| {
            CapabilityError::InvalidEntry(resource_type.to_string(), message.to_string())
        };

        let map = node
            .as_map()
            .ok_or_else(|| invalid("entry must be a mapping"))?;

        let mut entry = CapabilityEntry::default();
        for (key, value) in map {
            match key.as_str() {
                "generic_actions" => {
                    entry.generic_actions =
                        string_list(value).ok_or_else(|| invalid("generic_actions must be a list of strings"))?;
                }
                "arn_pattern" => {
                    entry.arn_pattern = Some(
                        value
                            .as_str()
                            .ok_or_else(|| invalid("arn_pattern must be a string"))?
                            .to_string(),
                    );
                }
                "property_actions" => {
                    let properties = match value {
                        Node::Null => continue,
                        Node::Map(properties) => properties,
                        _ => return Err(invalid("property_actions must be a mapping")),
                    };
                    for (property, actions) in properties {
                        let actions = string_list(actions).ok_or_else(|| {
                            invalid(&format!("actions of property '{}' must be a list of strings", property))
                        })?;
                        entry.property_actions.insert(property.clone(), actions);
                    }
                }
                "type" => match value.as_str() {
                    Some("CustomResource") => entry.custom_resource = true,
                    _ => return Err(invalid("type must be 'CustomResource'")),
                },
                other => {
                    log::debug!("Ignoring unknown key '{}' in capability entry {}", other, resource_type);
                }
            }
        }

        Ok(entry)
    }
}

fn string_list(node: &Node) -> Option<Vec<String>> {
    match node {
        Node::Null => Some(Vec::new()),
        Node::List(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Lookup table from resource type to its capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    entries: HashMap<String, CapabilityEntry>,
}

impl CapabilityTable {
    /// Parses the embedded table.
    pub fn builtin() -> Result<Self, CapabilityError> {
        Self::from_yaml(BUILTIN_TABLE)
    }

    /// Loads the built-in table and layers user overrides on top.
    ///
    /// # Arguments
    ///
    /// * `extra_file` - Explicit override file; when absent, the default user
    ///   file is used if it exists
    pub fn load(extra_file: Option<&Path>) -> Result<Self, CapabilityError> {
        let mut table = Self::builtin()?;

        let user_file = match extra_file {
            Some(path) => Some(path.to_path_buf()),
            None => default_user_file().filter(|path| path.is_file()),
        };

        if let Some(path) = user_file {
            log::debug!("Loading capability overrides from {:?}", path);
            let overrides = Self::from_file(&path)?;
            log::debug!("Loaded {} capability overrides", overrides.len());
            table.merge(overrides);
        }

        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, CapabilityError> {
        let io_error = |source| CapabilityError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(path).map_err(io_error)?;
        if metadata.len() > MAX_CAPABILITY_FILE_SIZE {
            return Err(CapabilityError::FileTooLarge(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(io_error)?;
        Self::from_yaml(&content)
    }

    /// Parses a capability table from YAML.
    pub fn from_yaml(content: &str) -> Result<Self, CapabilityError> {
        let root = parse_document(content, &TagConfig::empty())
            .map_err(|e| CapabilityError::Parse(e.to_string()))?;

        let map = match root {
            Node::Map(map) => map,
            Node::Null => return Ok(Self::default()),
            _ => {
                return Err(CapabilityError::Parse(
                    "Root document must be a mapping".to_string(),
                ));
            }
        };

        let entries = map
            .iter()
            .map(|(resource_type, node)| {
                CapabilityEntry::from_node(resource_type, node)
                    .map(|entry| (resource_type.clone(), entry))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { entries })
    }

    /// Adds the entries of `other`, replacing entries for the same type.
    pub fn merge(&mut self, other: CapabilityTable) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, resource_type: &str) -> Option<&CapabilityEntry> {
        self.entries.get(resource_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `~/.cfn-preflight/capabilities.yaml`
pub fn default_user_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cfn-preflight").join("capabilities.yaml"))
}
