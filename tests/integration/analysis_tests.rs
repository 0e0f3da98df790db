use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::fixture;

fn analyze(template: &str) -> Command {
    let mut cmd = Command::cargo_bin("cfn-preflight").unwrap();
    cmd.arg("--template-file")
        .arg(fixture(template))
        .args(["--analyze-only", "--no-color"]);
    cmd
}

#[test]
fn test_dev_skips_conditional_bucket() {
    analyze("conditional.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("sqs:CreateQueue"))
        .stdout(predicate::str::contains(
            "arn:aws:sqs:us-east-1:123456789012:dev-jobs",
        ))
        .stdout(predicate::str::contains("s3:CreateBucket").not())
        .stdout(predicate::str::contains(
            "Archive: condition 'IsProd' is false",
        ))
        .stdout(predicate::str::contains("IsProd = false"));
}

#[test]
fn test_prod_parameter_includes_bucket() {
    analyze("conditional.yaml")
        .args(["--parameters", "Env=prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3:CreateBucket"))
        .stdout(predicate::str::contains("arn:aws:s3:::prod-archive"))
        .stdout(predicate::str::contains(
            "arn:aws:sqs:us-east-1:123456789012:prod-jobs",
        ))
        .stdout(predicate::str::contains("IsProd = true"));
}

#[test]
fn test_condition_override_forces_bucket() {
    analyze("conditional.yaml")
        .args(["--condition-values", r#"{"IsProd": true}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("arn:aws:s3:::dev-archive"));
}

#[test]
fn test_account_and_region_flow_into_identifiers() {
    analyze("conditional.yaml")
        .args(["--account-id", "210987654321", "--region", "eu-west-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "arn:aws:sqs:eu-west-1:210987654321:dev-jobs",
        ));
}

#[test]
fn test_json_template_with_role_and_unmapped_type() {
    analyze("function.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("lambda:CreateFunction"))
        .stdout(predicate::str::contains("iam:PassRole"))
        .stdout(predicate::str::contains("cloudformation:CreateStack"))
        .stdout(predicate::str::contains(
            "arn:aws:lambda:us-east-1:123456789012:function:worker",
        ))
        .stdout(predicate::str::contains("arn:aws:iam::123456789012:role/exec"))
        .stdout(predicate::str::contains(
            "iam_role_exists: arn:aws:iam::123456789012:role/exec (ExecutionRoleArn parameter)",
        ))
        .stdout(predicate::str::contains("AWS::DynamoDB::GlobalTable"));
}

#[test]
fn test_template_without_resources_fails() {
    analyze("no_resources.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Resources"));
}

#[test]
fn test_capabilities_file_adds_entries() {
    let temp_dir = TempDir::new().unwrap();
    let capabilities = temp_dir.path().join("capabilities.yaml");
    fs::write(
        &capabilities,
        r#"
AWS::DynamoDB::GlobalTable:
  generic_actions: ["dynamodb:CreateTable", "dynamodb:CreateTableReplica"]
  arn_pattern: "arn:aws:dynamodb:{region}:{accountId}:table/{tableName}"
"#,
    )
    .unwrap();

    analyze("function.json")
        .arg("--capabilities-file")
        .arg(&capabilities)
        .assert()
        .success()
        .stdout(predicate::str::contains("dynamodb:CreateTableReplica"))
        .stdout(predicate::str::contains("Unmapped resource types").not());
}

#[test]
fn test_analysis_is_deterministic() {
    let first = analyze("function.json").assert().success().get_output().stdout.clone();
    let second = analyze("function.json").assert().success().get_output().stdout.clone();

    assert_eq!(first, second);
}
