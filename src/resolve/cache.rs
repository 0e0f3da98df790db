//! Structural memoization of resolved expressions.
//!
//! Keys are SHA-256 digests over the canonical form of the expression plus
//! the identity it was resolved for and the identity of the template (its
//! resource index). Parameter bindings are fixed for a context and are not
//! part of the key.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use super::Identity;
use crate::template::Node;

/// Computes the cache key for `node`.
///
/// # Arguments
///
/// * `node` - The expression being resolved
/// * `identity` - Account and region of the run
/// * `template_id` - Address of the shared template allocation
pub fn cache_key(node: &Node, identity: &Identity, template_id: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(node.canonical_form().as_bytes());
    hasher.update([0u8]);
    hasher.update(identity.account_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(identity.region.as_bytes());
    hasher.update([0u8]);
    hasher.update(template_id.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Append-only map of resolved expressions.
#[derive(Debug, Default)]
pub struct ExpressionCache {
    entries: HashMap<String, Node>,
}

impl ExpressionCache {
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: Node) {
        self.entries.entry(key).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
