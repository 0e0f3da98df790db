//! Template loader with in-memory caching.
//!
//! Reads a template file, converts the saphyr document into an owned
//! [`Node`] tree while desugaring short-form intrinsic tags, and caches the
//! result by path so repeated loads within a process skip parsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use saphyr::{LoadableYamlNode, Scalar, Yaml};

use super::intrinsic::TagConfig;
use super::node::{Node, NodeMap};
use super::{Template, TemplateError};

/// Maximum template size (5 MB) to prevent resource exhaustion.
const MAX_TEMPLATE_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Loads and caches templates.
pub struct TemplateLoader {
    tags: TagConfig,

    /// Key: canonicalized template path
    cache: Mutex<HashMap<PathBuf, Arc<Template>>>,
}

impl TemplateLoader {
    /// Creates a loader using the standard CloudFormation short-form tags.
    pub fn new() -> Self {
        Self::with_tags(TagConfig::cloudformation())
    }

    /// Creates a loader with an explicit tag configuration.
    pub fn with_tags(tags: TagConfig) -> Self {
        Self {
            tags,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Loads a template file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a YAML or JSON template
    ///
    /// # Returns
    ///
    /// The parsed template, shared with the loader's cache.
    ///
    /// # Errors
    ///
    /// * `NotFound` / `Io` / `FileTooLarge` - the file cannot be read
    /// * `Parse` - the content is not valid YAML
    /// * `Structure` - the document is not a template with resources
    pub fn load(&self, path: &Path) -> Result<Arc<Template>, TemplateError> {
        if !path.is_file() {
            return Err(TemplateError::NotFound(path.to_path_buf()));
        }

        let cache_key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(template) = cache.get(&cache_key) {
                log::debug!("Template cache hit for {:?}", cache_key);
                return Ok(Arc::clone(template));
            }
        }

        let io_error = |source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(path).map_err(io_error)?;
        if metadata.len() > MAX_TEMPLATE_FILE_SIZE {
            return Err(TemplateError::FileTooLarge(path.to_path_buf()));
        }

        log::debug!("Loading template from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(io_error)?;
        let template = self.parse_str(&content).map_err(|e| match e {
            TemplateError::Parse(message) => {
                TemplateError::Parse(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;

        let template = Arc::new(template);
        {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.insert(cache_key, Arc::clone(&template));
        }

        Ok(template)
    }

    /// Parses template content that is already in memory.
    pub fn parse_str(&self, content: &str) -> Result<Template, TemplateError> {
        Template::from_root(parse_document(content, &self.tags)?)
    }
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the first YAML document in `content` into an owned [`Node`].
///
/// Tags registered in `tags` are desugared into their long form; any other
/// tag is dropped with a warning and its value kept.
pub fn parse_document(content: &str, tags: &TagConfig) -> Result<Node, TemplateError> {
    let docs = Yaml::load_from_str(content).map_err(|e| TemplateError::Parse(e.to_string()))?;

    let root = docs
        .first()
        .ok_or_else(|| TemplateError::Structure("YAML document is empty".to_string()))?;

    Ok(convert(root, tags))
}

fn convert(yaml: &Yaml, tags: &TagConfig) -> Node {
    match yaml {
        Yaml::Value(scalar) => convert_scalar(scalar),
        Yaml::Representation(raw, _, _) => Node::string(raw.as_ref()),
        Yaml::Sequence(items) => Node::List(items.iter().map(|i| convert(i, tags)).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = NodeMap::new();
            for (key, value) in mapping {
                map.insert(key_to_string(key), convert(value, tags));
            }
            Node::Map(map)
        }
        Yaml::Tagged(tag, inner) => {
            let inner = convert(inner, tags);
            match tags.lookup(&tag.suffix) {
                Some(kind) if tag.handle == "!" => tags.desugar(kind, inner),
                _ => {
                    log::warn!(
                        "Unknown YAML tag '{}{}', keeping untagged value",
                        tag.handle,
                        tag.suffix
                    );
                    inner
                }
            }
        }
        Yaml::Alias(_) | Yaml::BadValue => Node::Null,
    }
}

fn convert_scalar(scalar: &Scalar) -> Node {
    match scalar {
        Scalar::Null => Node::Null,
        Scalar::Boolean(b) => Node::Bool(*b),
        Scalar::Integer(i) => Node::Integer(*i),
        Scalar::FloatingPoint(f) => Node::Float(f.0),
        Scalar::String(s) => Node::string(s.as_ref()),
    }
}

/// Template keys are strings; YAML allows scalar keys of any type.
fn key_to_string(key: &Yaml) -> String {
    match key {
        Yaml::Value(scalar) => convert_scalar(scalar).to_template_string(),
        Yaml::Representation(raw, _, _) => raw.to_string(),
        other => {
            log::warn!("Unsupported mapping key {:?}, using its debug form", other);
            format!("{:?}", other)
        }
    }
}
