//! Recursive resolution of intrinsic functions.

use std::sync::{Arc, LazyLock};

use log::warn;
use regex::Regex;

use super::conditions::ConditionFailure;
use super::{ResolutionContext, ResolveError, attributes, cache, naming};
use crate::template::{Intrinsic, IntrinsicKind, Node, NodeMap};

/// `$$` or `${Name}` inside an `Fn::Sub` template string.
static SUB_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$|\$\{([^}]*)\}").expect("valid regex"));

/// Placeholder for a `Ref` or `Fn::Sub` variable that names nothing known.
pub fn unresolved_reference(name: &str) -> String {
    format!("UNRESOLVED_REF_FOR_{}", name)
}

/// Value of a `Ref` to a template resource.
pub fn resource_reference(logical_id: &str) -> String {
    format!("arn:aws:::resolved-ref-{}", logical_id.to_lowercase())
}

fn malformed(kind: IntrinsicKind, argument: &Node) -> Node {
    warn!(
        "Malformed {} arguments: {}",
        kind.key(),
        argument.canonical_form()
    );
    Node::string(format!("UNRESOLVED_{}", kind.short_tag().to_uppercase()))
}

impl ResolutionContext {
    /// Resolves every intrinsic function inside `node`.
    ///
    /// Scalars are returned unchanged, lists and ordinary maps are resolved
    /// element by element. Results for intrinsic nodes are memoized.
    ///
    /// # Errors
    ///
    /// Only `ResolveError::CircularDependency`; anything else that cannot be
    /// resolved becomes a placeholder string and a warning.
    pub fn resolve(&self, node: &Node) -> Result<Node, ResolveError> {
        match node {
            Node::List(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::List),
            Node::Map(map) => match node.as_intrinsic() {
                Some(intrinsic) => self.resolve_memoized(node, intrinsic),
                None => map
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), self.resolve(value)?)))
                    .collect::<Result<NodeMap, ResolveError>>()
                    .map(Node::Map),
            },
            scalar => Ok(scalar.clone()),
        }
    }

    /// Resolves a `Ref` target: pseudo parameter, then parameter, then
    /// template resource. Unknown names yield a placeholder.
    pub fn resolve_reference(&self, name: &str) -> Node {
        self.lookup_name(name, None).unwrap_or_else(|| {
            warn!("Could not resolve Ref '{}'", name);
            Node::string(unresolved_reference(name))
        })
    }

    /// Resolves the explicit physical name of a template resource.
    ///
    /// Returns `Ok(None)` when the type has no name property, or the
    /// resource leaves it unset or sets it to `AWS::NoValue`.
    pub fn resource_name(&self, logical_id: &str) -> Result<Option<String>, ResolveError> {
        let Some(declaration) = self.template.resources.get(logical_id) else {
            return Ok(None);
        };
        let Some(rule) = declaration
            .resource_type
            .as_deref()
            .and_then(naming::rule_for)
        else {
            return Ok(None);
        };
        let Some(raw) = declaration.properties.get(rule.name_property) else {
            return Ok(None);
        };

        let _guard = self.enter(format!("resource:{}", logical_id))?;
        let name = self.resolve(raw)?.to_template_string();
        Ok((!name.is_empty()).then_some(name))
    }

    /// Placeholder value of attribute `attribute` of resource `logical_id`.
    pub fn attribute_value(&self, logical_id: &str, attribute: &str) -> Result<Node, ResolveError> {
        let resource_type = self
            .template
            .resources
            .get(logical_id)
            .and_then(|declaration| declaration.resource_type.as_deref());
        let pattern = resource_type
            .and_then(|resource_type| attributes::attribute_pattern(resource_type, attribute));

        let Some(pattern) = pattern else {
            warn!(
                "No placeholder known for attribute '{}.{}'",
                logical_id, attribute
            );
            return Ok(Node::string(attributes::fallback(logical_id, attribute)));
        };

        // Unnamed resources with a generated-name rule get the same name the
        // resource's own identifier uses.
        let name = match self.resource_name(logical_id)? {
            Some(name) => name,
            None => match resource_type.and_then(naming::rule_for) {
                Some(rule) if rule.unnamed_arn_pattern.is_some() => {
                    format!("{}-*", naming::generated_name(logical_id))
                }
                _ => naming::wildcard_name(logical_id),
            },
        };

        Ok(Node::string(attributes::render(
            pattern,
            &self.identity.account_id,
            &self.identity.region,
            &name,
            logical_id,
        )))
    }

    fn resolve_memoized(&self, node: &Node, intrinsic: Intrinsic<'_>) -> Result<Node, ResolveError> {
        let key = cache::cache_key(
            node,
            &self.identity,
            Arc::as_ptr(&self.template) as usize,
        );

        if let Some(cached) = self.expression_cache.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let value = self.resolve_intrinsic(node, intrinsic)?;
        self.expression_cache.borrow_mut().insert(key, value.clone());
        Ok(value)
    }

    fn resolve_intrinsic(&self, node: &Node, intrinsic: Intrinsic<'_>) -> Result<Node, ResolveError> {
        let argument = intrinsic.argument;
        match intrinsic.kind {
            IntrinsicKind::Ref => Ok(match argument.as_str() {
                Some(name) => self.resolve_reference(name),
                None => malformed(intrinsic.kind, argument),
            }),
            IntrinsicKind::Sub => self.resolve_sub(argument),
            IntrinsicKind::GetAtt => self.resolve_get_att(argument),
            IntrinsicKind::Join => self.resolve_join(argument),
            IntrinsicKind::If => self.resolve_if(argument),
            IntrinsicKind::Select => self.resolve_select(argument),
            IntrinsicKind::Split => self.resolve_split(argument),
            IntrinsicKind::FindInMap => self.resolve_find_in_map(argument),
            IntrinsicKind::Base64 => Ok(Node::String(self.resolve(argument)?.to_template_string())),
            IntrinsicKind::GetAZs => self.resolve_get_azs(argument),
            IntrinsicKind::ImportValue => {
                let name = self.resolve(argument)?.to_template_string();
                warn!(
                    "Fn::ImportValue '{}' cannot be resolved before deployment",
                    name
                );
                Ok(Node::string(format!("imported:{}", name)))
            }
            IntrinsicKind::Cidr => self.resolve_cidr(argument),
            IntrinsicKind::Equals
            | IntrinsicKind::And
            | IntrinsicKind::Or
            | IntrinsicKind::Not
            | IntrinsicKind::Condition => match self.evaluate_condition_node(node) {
                Ok(value) => Ok(Node::Bool(value)),
                Err(ConditionFailure::Unsupported(reason)) => {
                    warn!("Unsupported condition expression ({}), using false", reason);
                    Ok(Node::Bool(false))
                }
                Err(ConditionFailure::Resolve(e)) => Err(e),
            },
        }
    }

    fn lookup_name(&self, name: &str, variables: Option<&NodeMap>) -> Option<Node> {
        self.pseudo
            .lookup(name, &self.identity)
            .or_else(|| variables.and_then(|vars| vars.get(name)).cloned())
            .or_else(|| self.parameters.get(name).cloned())
            .or_else(|| {
                self.template
                    .resources
                    .contains_key(name)
                    .then(|| Node::string(resource_reference(name)))
            })
    }

    fn resolve_sub(&self, argument: &Node) -> Result<Node, ResolveError> {
        match argument {
            Node::String(template) => self.substitute(template, None).map(Node::String),
            Node::List(items) => match items.as_slice() {
                [Node::String(template)] => self.substitute(template, None).map(Node::String),
                [Node::String(template), variables] => {
                    let variables = match self.resolve(variables)? {
                        Node::Map(map) => map,
                        other => {
                            warn!(
                                "Fn::Sub variables must be a map, found {}",
                                other.canonical_form()
                            );
                            NodeMap::new()
                        }
                    };
                    self.substitute(template, Some(&variables))
                        .map(Node::String)
                }
                _ => Ok(malformed(IntrinsicKind::Sub, argument)),
            },
            _ => Ok(malformed(IntrinsicKind::Sub, argument)),
        }
    }

    /// Expands `${...}` placeholders. `$$` becomes `$` and `${!Name}` the
    /// literal `${Name}`.
    fn substitute(&self, template: &str, variables: Option<&NodeMap>) -> Result<String, ResolveError> {
        let mut output = String::with_capacity(template.len());
        let mut last = 0;

        for captures in SUB_PLACEHOLDER.captures_iter(template) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            output.push_str(&template[last..whole.start()]);
            last = whole.end();

            match captures.get(1).map(|name| name.as_str().trim()) {
                None => output.push('$'),
                Some(name) => match name.strip_prefix('!') {
                    Some(literal) => {
                        output.push_str("${");
                        output.push_str(literal);
                        output.push('}');
                    }
                    None => output.push_str(&self.substitute_variable(name, variables)?),
                },
            }
        }

        output.push_str(&template[last..]);
        Ok(output)
    }

    fn substitute_variable(&self, name: &str, variables: Option<&NodeMap>) -> Result<String, ResolveError> {
        if let Some(value) = self.lookup_name(name, variables) {
            return Ok(value.to_template_string());
        }

        if let Some((logical_id, attribute)) = name.split_once('.') {
            if self.template.resources.contains_key(logical_id) {
                return Ok(self
                    .attribute_value(logical_id, attribute)?
                    .to_template_string());
            }
        }

        warn!("Could not resolve Fn::Sub variable '{}'", name);
        Ok(unresolved_reference(name))
    }

    fn resolve_get_att(&self, argument: &Node) -> Result<Node, ResolveError> {
        let (logical_id, attribute) = match argument {
            Node::List(items) => match items.as_slice() {
                [Node::String(logical_id), attribute] => (
                    logical_id.as_str(),
                    self.resolve(attribute)?.to_template_string(),
                ),
                _ => return Ok(malformed(IntrinsicKind::GetAtt, argument)),
            },
            Node::String(s) => match s.split_once('.') {
                Some((logical_id, attribute)) => (logical_id, attribute.to_string()),
                None => return Ok(malformed(IntrinsicKind::GetAtt, argument)),
            },
            _ => return Ok(malformed(IntrinsicKind::GetAtt, argument)),
        };

        self.attribute_value(logical_id, &attribute)
    }

    fn resolve_join(&self, argument: &Node) -> Result<Node, ResolveError> {
        let Some([delimiter, values]) = argument.as_list() else {
            return Ok(malformed(IntrinsicKind::Join, argument));
        };

        let delimiter = self.resolve(delimiter)?.to_template_string();
        let parts: Vec<String> = match self.resolve(values)? {
            Node::List(items) => items.iter().map(Node::to_template_string).collect(),
            other => {
                warn!(
                    "Fn::Join expects a list of values, found {}",
                    other.canonical_form()
                );
                vec![other.to_template_string()]
            }
        };

        Ok(Node::String(parts.join(&delimiter)))
    }

    fn resolve_if(&self, argument: &Node) -> Result<Node, ResolveError> {
        let Some([condition, when_true, when_false]) = argument.as_list() else {
            return Ok(malformed(IntrinsicKind::If, argument));
        };
        let Some(condition) = condition.as_str() else {
            return Ok(malformed(IntrinsicKind::If, argument));
        };

        if self.evaluate_condition(condition)? {
            self.resolve(when_true)
        } else {
            self.resolve(when_false)
        }
    }

    fn resolve_select(&self, argument: &Node) -> Result<Node, ResolveError> {
        let Some([index, values]) = argument.as_list() else {
            return Ok(malformed(IntrinsicKind::Select, argument));
        };

        let index = self.resolve(index)?.to_template_string();
        let values = self.resolve(values)?;
        let selected = index
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| values.as_list().and_then(|items| items.get(i)))
            .cloned();

        Ok(selected.unwrap_or_else(|| {
            warn!(
                "Fn::Select index {} does not select from {}",
                index,
                values.canonical_form()
            );
            Node::string(format!("UNRESOLVED_SELECT_{}", index))
        }))
    }

    fn resolve_split(&self, argument: &Node) -> Result<Node, ResolveError> {
        let Some([delimiter, source]) = argument.as_list() else {
            return Ok(malformed(IntrinsicKind::Split, argument));
        };

        let delimiter = self.resolve(delimiter)?.to_template_string();
        if delimiter.is_empty() {
            return Ok(malformed(IntrinsicKind::Split, argument));
        }
        let source = self.resolve(source)?.to_template_string();

        Ok(Node::List(
            source.split(delimiter.as_str()).map(Node::from).collect(),
        ))
    }

    fn resolve_find_in_map(&self, argument: &Node) -> Result<Node, ResolveError> {
        let Some([map_name, top_key, second_key]) = argument.as_list() else {
            return Ok(malformed(IntrinsicKind::FindInMap, argument));
        };

        let map_name = self.resolve(map_name)?.to_template_string();
        let top_key = self.resolve(top_key)?.to_template_string();
        let second_key = self.resolve(second_key)?.to_template_string();

        let value = self
            .template
            .mappings
            .get(&map_name)
            .and_then(|map| map.get(&top_key))
            .and_then(|entry| entry.get(&second_key));

        match value {
            Some(value) => self.resolve(value),
            None => {
                warn!(
                    "Fn::FindInMap found no value at {}.{}.{}",
                    map_name, top_key, second_key
                );
                Ok(Node::string(format!(
                    "UNRESOLVED_MAPPING_{}.{}.{}",
                    map_name, top_key, second_key
                )))
            }
        }
    }

    fn resolve_get_azs(&self, argument: &Node) -> Result<Node, ResolveError> {
        let region = self.resolve(argument)?.to_template_string();
        let region = if region.is_empty() {
            self.identity.region.clone()
        } else {
            region
        };

        Ok(Node::List(
            ["a", "b", "c"]
                .iter()
                .map(|zone| Node::string(format!("{}{}", region, zone)))
                .collect(),
        ))
    }

    fn resolve_cidr(&self, argument: &Node) -> Result<Node, ResolveError> {
        let Some([ip_block, count, bits]) = argument.as_list() else {
            return Ok(malformed(IntrinsicKind::Cidr, argument));
        };

        let ip_block = self.resolve(ip_block)?.to_template_string();
        let count = self
            .resolve(count)?
            .to_template_string()
            .parse::<usize>()
            .unwrap_or(1)
            .min(256);
        let bits = self.resolve(bits)?.to_template_string();

        warn!(
            "Fn::Cidr is not evaluated; using {} placeholder blocks for {}",
            count, ip_block
        );
        Ok(Node::List(
            (0..count)
                .map(|i| Node::string(format!("cidr:{}/{}#{}", ip_block, bits, i)))
                .collect(),
        ))
    }
}
