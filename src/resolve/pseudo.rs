//! Pseudo parameters (`AWS::Region`, `AWS::NoValue`, ...).

use super::Identity;
use crate::template::Node;

/// Placeholder values for the pseudo parameters that do not come from the
/// deploying identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoParameters {
    pub stack_name: String,
    pub partition: String,
    pub url_suffix: String,
}

impl Default for PseudoParameters {
    fn default() -> Self {
        Self {
            stack_name: "my-test-stack".to_string(),
            partition: "aws".to_string(),
            url_suffix: "amazonaws.com".to_string(),
        }
    }
}

impl PseudoParameters {
    /// Returns the value of a pseudo parameter, or `None` if `name` is not one.
    ///
    /// `AWS::NoValue` yields `Some(Node::Null)`.
    pub fn lookup(&self, name: &str, identity: &Identity) -> Option<Node> {
        let value = match name {
            "AWS::AccountId" => Node::string(&identity.account_id),
            "AWS::Region" => Node::string(&identity.region),
            "AWS::StackName" => Node::string(&self.stack_name),
            "AWS::StackId" => Node::string(format!(
                "arn:{}:cloudformation:{}:{}:stack/{}/00000000-0000-0000-0000-000000000000",
                self.partition, identity.region, identity.account_id, self.stack_name
            )),
            "AWS::Partition" => Node::string(&self.partition),
            "AWS::URLSuffix" => Node::string(&self.url_suffix),
            "AWS::NotificationARNs" => Node::List(Vec::new()),
            "AWS::NoValue" => Node::Null,
            _ => return None,
        };
        Some(value)
    }
}
