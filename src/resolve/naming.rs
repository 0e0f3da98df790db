//! Which property carries a resource's physical name.

/// Name property of a resource type, plus the identifier pattern to use when
/// the name is left for CloudFormation to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingRule {
    pub resource_type: &'static str,
    pub name_property: &'static str,
    /// Pattern with a `{generatedName}` token, used instead of the capability
    /// pattern when no explicit name is given.
    pub unnamed_arn_pattern: Option<&'static str>,
}

/// Prefix of synthesized names for resources whose name CloudFormation generates.
pub const GENERATED_NAME_PREFIX: &str = "cfn";

const NAMING_RULES: &[NamingRule] = &[
    NamingRule {
        resource_type: "AWS::IAM::Role",
        name_property: "RoleName",
        unnamed_arn_pattern: None,
    },
    NamingRule {
        resource_type: "AWS::IAM::Policy",
        name_property: "PolicyName",
        unnamed_arn_pattern: None,
    },
    NamingRule {
        resource_type: "AWS::S3::Bucket",
        name_property: "BucketName",
        unnamed_arn_pattern: Some("arn:aws:s3:::{generatedName}-*"),
    },
    NamingRule {
        resource_type: "AWS::SQS::Queue",
        name_property: "QueueName",
        unnamed_arn_pattern: None,
    },
    NamingRule {
        resource_type: "AWS::SNS::Topic",
        name_property: "TopicName",
        unnamed_arn_pattern: None,
    },
    NamingRule {
        resource_type: "AWS::CloudTrail::Trail",
        name_property: "TrailName",
        unnamed_arn_pattern: None,
    },
    NamingRule {
        resource_type: "AWS::Lambda::Function",
        name_property: "FunctionName",
        unnamed_arn_pattern: None,
    },
    NamingRule {
        resource_type: "AWS::CloudFormation::StackSet",
        name_property: "StackSetName",
        unnamed_arn_pattern: None,
    },
    NamingRule {
        resource_type: "AWS::ECR::Repository",
        name_property: "RepositoryName",
        unnamed_arn_pattern: None,
    },
];

pub fn rule_for(resource_type: &str) -> Option<&'static NamingRule> {
    NAMING_RULES
        .iter()
        .find(|rule| rule.resource_type == resource_type)
}

/// Name used when a resource does not declare one: `<logical-id>-*`.
pub fn wildcard_name(logical_id: &str) -> String {
    format!("{}-*", logical_id)
}

/// Synthesized name for the unnamed pattern: `cfn-<lowercased-logical-id>`.
pub fn generated_name(logical_id: &str) -> String {
    format!("{}-{}", GENERATED_NAME_PREFIX, logical_id.to_lowercase())
}
