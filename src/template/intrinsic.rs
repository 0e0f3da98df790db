//! Intrinsic function kinds and the short-form tag configuration.

use std::collections::HashMap;

use super::node::Node;

/// Every intrinsic the pipeline understands.
///
/// The set is closed: resolution and condition evaluation match on it
/// exhaustively, so adding a kind forces every consumer to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Ref,
    Condition,
    Sub,
    GetAtt,
    Join,
    If,
    Select,
    Split,
    FindInMap,
    Base64,
    Cidr,
    GetAZs,
    ImportValue,
    Equals,
    And,
    Or,
    Not,
}

impl IntrinsicKind {
    pub const ALL: [IntrinsicKind; 17] = [
        IntrinsicKind::Ref,
        IntrinsicKind::Condition,
        IntrinsicKind::Sub,
        IntrinsicKind::GetAtt,
        IntrinsicKind::Join,
        IntrinsicKind::If,
        IntrinsicKind::Select,
        IntrinsicKind::Split,
        IntrinsicKind::FindInMap,
        IntrinsicKind::Base64,
        IntrinsicKind::Cidr,
        IntrinsicKind::GetAZs,
        IntrinsicKind::ImportValue,
        IntrinsicKind::Equals,
        IntrinsicKind::And,
        IntrinsicKind::Or,
        IntrinsicKind::Not,
    ];

    /// The long-form map key, e.g. `Fn::GetAtt`.
    pub fn key(self) -> &'static str {
        match self {
            IntrinsicKind::Ref => "Ref",
            IntrinsicKind::Condition => "Condition",
            IntrinsicKind::Sub => "Fn::Sub",
            IntrinsicKind::GetAtt => "Fn::GetAtt",
            IntrinsicKind::Join => "Fn::Join",
            IntrinsicKind::If => "Fn::If",
            IntrinsicKind::Select => "Fn::Select",
            IntrinsicKind::Split => "Fn::Split",
            IntrinsicKind::FindInMap => "Fn::FindInMap",
            IntrinsicKind::Base64 => "Fn::Base64",
            IntrinsicKind::Cidr => "Fn::Cidr",
            IntrinsicKind::GetAZs => "Fn::GetAZs",
            IntrinsicKind::ImportValue => "Fn::ImportValue",
            IntrinsicKind::Equals => "Fn::Equals",
            IntrinsicKind::And => "Fn::And",
            IntrinsicKind::Or => "Fn::Or",
            IntrinsicKind::Not => "Fn::Not",
        }
    }

    /// The YAML short-form tag suffix, e.g. `GetAtt` for `!GetAtt`.
    pub fn short_tag(self) -> &'static str {
        let key = self.key();
        key.strip_prefix("Fn::").unwrap_or(key)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

/// A recognized intrinsic function node borrowed from the template tree.
#[derive(Debug, Clone, Copy)]
pub struct Intrinsic<'a> {
    pub kind: IntrinsicKind,
    pub argument: &'a Node,
}

/// Short-form tag table handed explicitly to the template loader.
///
/// Each registered tag desugars into the single-key long form, so
/// `!GetAtt Role.Arn` and `{"Fn::GetAtt": ["Role", "Arn"]}` produce the same
/// tree.
#[derive(Debug, Clone)]
pub struct TagConfig {
    tags: HashMap<String, IntrinsicKind>,
}

impl TagConfig {
    /// An empty configuration; every short-form tag is left untranslated.
    pub fn empty() -> Self {
        Self {
            tags: HashMap::new(),
        }
    }

    /// The standard CloudFormation short forms.
    pub fn cloudformation() -> Self {
        IntrinsicKind::ALL
            .into_iter()
            .fold(Self::empty(), |config, kind| {
                config.with_tag(kind.short_tag(), kind)
            })
    }

    /// Registers `tag` (without the leading `!`) as a short form of `kind`.
    pub fn with_tag(mut self, tag: &str, kind: IntrinsicKind) -> Self {
        self.tags.insert(tag.to_string(), kind);
        self
    }

    pub fn lookup(&self, tag: &str) -> Option<IntrinsicKind> {
        self.tags.get(tag).copied()
    }

    /// Builds the long-form node for a tagged value.
    ///
    /// `!GetAtt` with a scalar argument is split on the first `.` into the
    /// `[logical_id, attribute]` list form.
    pub fn desugar(&self, kind: IntrinsicKind, argument: Node) -> Node {
        let argument = match (kind, argument) {
            (IntrinsicKind::GetAtt, Node::String(s)) => match s.split_once('.') {
                Some((resource, attribute)) => {
                    Node::List(vec![Node::string(resource), Node::string(attribute)])
                }
                None => Node::String(s),
            },
            (_, argument) => argument,
        };

        let mut map = super::NodeMap::new();
        map.insert(kind.key().to_string(), argument);
        Node::Map(map)
    }
}

impl Default for TagConfig {
    fn default() -> Self {
        Self::cloudformation()
    }
}
