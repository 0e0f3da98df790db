//! Placeholder values for `Fn::GetAtt`.
//!
//! Attribute values only exist after deployment. For permission checks it is
//! enough to produce realistic-looking values that embed the resource's
//! resolved name, so that e.g. a role ARN passed to a function matches the
//! identifier derived for the role itself.

/// Patterns per (resource type, attribute). Tokens: `{accountId}`,
/// `{region}`, `{name}` (resolved or wildcard name) and `{logicalId}`
/// (lowercased logical id).
const ATTRIBUTE_PATTERNS: &[(&str, &str, &str)] = &[
    ("AWS::IAM::Role", "Arn", "arn:aws:iam::{accountId}:role/{name}"),
    ("AWS::IAM::Role", "RoleId", "AROA{logicalId}"),
    (
        "AWS::IAM::InstanceProfile",
        "Arn",
        "arn:aws:iam::{accountId}:instance-profile/{name}",
    ),
    ("AWS::S3::Bucket", "Arn", "arn:aws:s3:::{name}"),
    ("AWS::S3::Bucket", "DomainName", "{name}.s3.amazonaws.com"),
    (
        "AWS::S3::Bucket",
        "RegionalDomainName",
        "{name}.s3.{region}.amazonaws.com",
    ),
    (
        "AWS::S3::Bucket",
        "WebsiteURL",
        "http://{name}.s3-website-{region}.amazonaws.com",
    ),
    (
        "AWS::Lambda::Function",
        "Arn",
        "arn:aws:lambda:{region}:{accountId}:function:{name}",
    ),
    ("AWS::SQS::Queue", "Arn", "arn:aws:sqs:{region}:{accountId}:{name}"),
    (
        "AWS::SQS::Queue",
        "QueueUrl",
        "https://sqs.{region}.amazonaws.com/{accountId}/{name}",
    ),
    ("AWS::SQS::Queue", "QueueName", "{name}"),
    (
        "AWS::SNS::Topic",
        "TopicArn",
        "arn:aws:sns:{region}:{accountId}:{name}",
    ),
    ("AWS::SNS::Topic", "TopicName", "{name}"),
    (
        "AWS::KMS::Key",
        "Arn",
        "arn:aws:kms:{region}:{accountId}:key/{logicalId}-key-id",
    ),
    ("AWS::KMS::Key", "KeyId", "{logicalId}-key-id"),
    (
        "AWS::CloudTrail::Trail",
        "Arn",
        "arn:aws:cloudtrail:{region}:{accountId}:trail/{name}",
    ),
    (
        "AWS::ECR::Repository",
        "Arn",
        "arn:aws:ecr:{region}:{accountId}:repository/{name}",
    ),
    (
        "AWS::ECR::Repository",
        "RepositoryUri",
        "{accountId}.dkr.ecr.{region}.amazonaws.com/{name}",
    ),
    (
        "AWS::Logs::LogGroup",
        "Arn",
        "arn:aws:logs:{region}:{accountId}:log-group:{name}:*",
    ),
];

pub fn attribute_pattern(resource_type: &str, attribute: &str) -> Option<&'static str> {
    ATTRIBUTE_PATTERNS
        .iter()
        .find(|(t, a, _)| *t == resource_type && *a == attribute)
        .map(|(_, _, pattern)| *pattern)
}

/// Fills an attribute pattern.
pub fn render(pattern: &str, account_id: &str, region: &str, name: &str, logical_id: &str) -> String {
    pattern
        .replace("{accountId}", account_id)
        .replace("{region}", region)
        .replace("{name}", name)
        .replace("{logicalId}", &logical_id.to_lowercase())
}

/// Fallback value for unknown attributes: `attr-lookup:<id>.<attribute>`.
pub fn fallback(logical_id: &str, attribute: &str) -> String {
    format!("attr-lookup:{}.{}", logical_id, attribute)
}
