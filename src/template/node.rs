//! Owned value tree for parsed templates.
//!
//! The YAML parser hands out borrowed, lifetime-bound nodes. Templates are
//! converted into this owned representation once at load time so the rest of
//! the pipeline can hold them behind an `Arc` without carrying lifetimes.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::intrinsic::{Intrinsic, IntrinsicKind};

/// Ordered map of template keys to values. Declaration order is preserved.
pub type NodeMap = IndexMap<String, Node>;

/// A template value: scalar, list or map.
///
/// `Null` is the absence value. It is produced by YAML `null` and by the
/// `AWS::NoValue` pseudo parameter, and stringifies to an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Node>),
    Map(NodeMap),
}

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        Node::String(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&NodeMap> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this node is a map.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Recognizes a single-key map whose key names an intrinsic function.
    ///
    /// `{"Condition": ...}` is only treated as an intrinsic when its argument
    /// is a string, so that ordinary maps keyed `Condition` (e.g. inside IAM
    /// policy statements) are not misread.
    pub fn as_intrinsic(&self) -> Option<Intrinsic<'_>> {
        let map = self.as_map()?;
        if map.len() != 1 {
            return None;
        }
        let (key, argument) = map.iter().next()?;
        let kind = IntrinsicKind::from_key(key)?;
        if kind == IntrinsicKind::Condition && argument.as_str().is_none() {
            return None;
        }
        Some(Intrinsic { kind, argument })
    }

    /// Renders the value the way CloudFormation stringifies it.
    ///
    /// Lists are comma joined (the `CommaDelimitedList` convention) and maps
    /// fall back to compact JSON.
    pub fn to_template_string(&self) -> String {
        match self {
            Node::Null => String::new(),
            Node::Bool(b) => b.to_string(),
            Node::Integer(i) => i.to_string(),
            // `{:?}` keeps the decimal point: 1.0 renders as "1.0", not "1".
            Node::Float(f) => format!("{:?}", f),
            Node::String(s) => s.clone(),
            Node::List(items) => items
                .iter()
                .map(Node::to_template_string)
                .collect::<Vec<_>>()
                .join(","),
            Node::Map(_) => self.to_json().to_string(),
        }
    }

    /// Converts into a `serde_json` value.
    ///
    /// Map keys come out sorted because `serde_json::Map` is ordered by key,
    /// which makes the compact rendering usable as a canonical form.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Node::Null => JsonValue::Null,
            Node::Bool(b) => JsonValue::Bool(*b),
            Node::Integer(i) => JsonValue::from(*i),
            Node::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(f.to_string())),
            Node::String(s) => JsonValue::String(s.clone()),
            Node::List(items) => JsonValue::Array(items.iter().map(Node::to_json).collect()),
            Node::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Canonical serialized form used for structural hashing.
    pub fn canonical_form(&self) -> String {
        self.to_json().to_string()
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::String(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Node)]) -> Node {
        Node::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn template_string_of_scalars() {
        assert_eq!(Node::Null.to_template_string(), "");
        assert_eq!(Node::Bool(true).to_template_string(), "true");
        assert_eq!(Node::Integer(8080).to_template_string(), "8080");
        assert_eq!(Node::Float(1.5).to_template_string(), "1.5");
        assert_eq!(Node::Float(1.0).to_template_string(), "1.0");
        assert_eq!(Node::string("prod").to_template_string(), "prod");
    }

    #[test]
    fn template_string_of_list_is_comma_joined() {
        let list = Node::List(vec![Node::string("a"), Node::Integer(2), Node::Null]);
        assert_eq!(list.to_template_string(), "a,2,");
    }

    #[test]
    fn canonical_form_ignores_key_order() {
        let a = map(&[("B", Node::Integer(1)), ("A", Node::string("x"))]);
        let b = map(&[("A", Node::string("x")), ("B", Node::Integer(1))]);
        assert_eq!(a.canonical_form(), b.canonical_form());
    }

    #[test]
    fn as_intrinsic_recognizes_single_key_functions() {
        let node = map(&[("Fn::Sub", Node::string("${AWS::Region}"))]);
        let intrinsic = node.as_intrinsic().expect("should be intrinsic");
        assert_eq!(intrinsic.kind, IntrinsicKind::Sub);
    }

    #[test]
    fn as_intrinsic_ignores_multi_key_and_unknown_maps() {
        let multi = map(&[("Ref", Node::string("A")), ("Other", Node::Null)]);
        assert!(multi.as_intrinsic().is_none());

        let unknown = map(&[("Fn::Transform", Node::Null)]);
        assert!(unknown.as_intrinsic().is_none());
    }

    #[test]
    fn condition_key_with_map_argument_is_not_intrinsic() {
        let statement_condition = map(&[(
            "Condition",
            map(&[("StringEquals", map(&[("aws:RequestedRegion", Node::string("eu-west-1"))]))]),
        )]);
        assert!(statement_condition.as_intrinsic().is_none());

        let reference = map(&[("Condition", Node::string("IsProd"))]);
        assert_eq!(
            reference.as_intrinsic().map(|i| i.kind),
            Some(IntrinsicKind::Condition)
        );
    }
}
