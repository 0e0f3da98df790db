//! Resource identifier construction from capability patterns.

use std::sync::LazyLock;

use regex::Regex;

use crate::resolve::Identity;
use crate::resolve::naming::{self, NamingRule};

/// Any `{token}` left after the fixed tokens are substituted.
static NAME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[A-Za-z]+\}").expect("valid regex"));

/// Builds the identifier for one resource.
///
/// # Arguments
///
/// * `pattern` - Capability pattern for the resource type
/// * `logical_id` - Logical id of the resource
/// * `name` - Explicit physical name, if the resource declares one
/// * `rule` - Naming rule of the resource type
/// * `identity` - Account and region substituted into the pattern
///
/// # Returns
///
/// The pattern with `{accountId}`, `{region}` and
/// `{resourceLogicalIdPlaceholder}` substituted and every other token
/// replaced by the name. Without an explicit name the wildcard name
/// `<logical-id>-*` is used, unless the type has its own unnamed pattern.
pub fn build_resource_arn(
    pattern: &str,
    logical_id: &str,
    name: Option<&str>,
    rule: Option<&NamingRule>,
    identity: &Identity,
) -> String {
    if name.is_none() {
        if let Some(unnamed) = rule.and_then(|rule| rule.unnamed_arn_pattern) {
            return substitute(
                unnamed,
                logical_id,
                &naming::generated_name(logical_id),
                identity,
            );
        }
    }

    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| naming::wildcard_name(logical_id));
    substitute(pattern, logical_id, &name, identity)
}

/// `arn:aws:iam::<account>:role/<value>-*` for a role given by name.
pub fn role_arn_for_name(role_name: &str, identity: &Identity) -> String {
    format!("arn:aws:iam::{}:role/{}-*", identity.account_id, role_name)
}

/// Every role in the account.
pub fn any_role_arn(identity: &Identity) -> String {
    format!("arn:aws:iam::{}:role/*", identity.account_id)
}

fn substitute(pattern: &str, logical_id: &str, name: &str, identity: &Identity) -> String {
    let fixed = pattern
        .replace("{accountId}", &identity.account_id)
        .replace("{region}", &identity.region)
        .replace("{resourceLogicalIdPlaceholder}", logical_id);

    NAME_TOKEN.replace_all(&fixed, regex::NoExpand(name)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("123456789012", "eu-west-1")
    }

    #[test]
    fn named_resource() {
        let arn = build_resource_arn(
            "arn:aws:iam::{accountId}:role/{roleName}",
            "ExecRole",
            Some("deploy-role"),
            naming::rule_for("AWS::IAM::Role"),
            &identity(),
        );
        assert_eq!(arn, "arn:aws:iam::123456789012:role/deploy-role");
    }

    #[test]
    fn unnamed_resource_uses_wildcard_name() {
        let arn = build_resource_arn(
            "arn:aws:sqs:{region}:{accountId}:{queueName}",
            "Jobs",
            None,
            naming::rule_for("AWS::SQS::Queue"),
            &identity(),
        );
        assert_eq!(arn, "arn:aws:sqs:eu-west-1:123456789012:Jobs-*");
    }

    #[test]
    fn unnamed_bucket_uses_generated_name() {
        let arn = build_resource_arn(
            "arn:aws:s3:::{bucketName}",
            "LogBucket",
            None,
            naming::rule_for("AWS::S3::Bucket"),
            &identity(),
        );
        assert_eq!(arn, "arn:aws:s3:::cfn-logbucket-*");
    }

    #[test]
    fn named_bucket_keeps_its_name() {
        let arn = build_resource_arn(
            "arn:aws:s3:::{bucketName}",
            "LogBucket",
            Some("my-logs"),
            naming::rule_for("AWS::S3::Bucket"),
            &identity(),
        );
        assert_eq!(arn, "arn:aws:s3:::my-logs");
    }

    #[test]
    fn default_pattern_uses_logical_id() {
        let arn = build_resource_arn(
            crate::capability::DEFAULT_ARN_PATTERN,
            "Thing",
            None,
            None,
            &identity(),
        );
        assert_eq!(arn, "arn:aws:*:eu-west-1:123456789012:Thing/*");
    }

    #[test]
    fn name_with_dollar_is_inserted_literally() {
        let arn = build_resource_arn(
            "arn:aws:sns:{region}:{accountId}:{topicName}",
            "Topic",
            Some("a$1b"),
            None,
            &identity(),
        );
        assert_eq!(arn, "arn:aws:sns:eu-west-1:123456789012:a$1b");
    }

    #[test]
    fn role_arns() {
        assert_eq!(
            role_arn_for_name("worker", &identity()),
            "arn:aws:iam::123456789012:role/worker-*"
        );
        assert_eq!(any_role_arn(&identity()), "arn:aws:iam::123456789012:role/*");
    }
}
