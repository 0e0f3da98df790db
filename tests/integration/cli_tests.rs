use assert_cmd::Command;
use predicates::prelude::*;

use crate::fixture;

fn cmd() -> Command {
    Command::cargo_bin("cfn-preflight").unwrap()
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn test_help_contains_disclaimer() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DISCLAIMER"));
}

#[test]
fn test_help_short_flag() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--template-file"));
}

#[test]
fn test_help_shows_all_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--deploying-principal-arn"))
        .stdout(predicate::str::contains("--parameters"))
        .stdout(predicate::str::contains("--condition-values"))
        .stdout(predicate::str::contains("--analyze-only"))
        .stdout(predicate::str::contains("--output-format"))
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--no-color"));
}

#[test]
fn test_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cfn-preflight"));
}

#[test]
fn test_version_short_flag() {
    cmd()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Argument validation
// ============================================================================

#[test]
fn test_template_file_is_required() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--template-file"));
}

#[test]
fn test_missing_template_fails() {
    cmd()
        .args(["--template-file", "does-not-exist.yaml", "--analyze-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template file does not exist"));
}

#[test]
fn test_principal_must_be_an_arn() {
    cmd()
        .arg("--template-file")
        .arg(fixture("conditional.yaml"))
        .args(["--deploying-principal-arn", "deployer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be an ARN"));
}

#[test]
fn test_account_id_must_be_twelve_digits() {
    cmd()
        .arg("--template-file")
        .arg(fixture("conditional.yaml"))
        .args(["--account-id", "1234", "--analyze-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Account id must be 12 digits"));
}

#[test]
fn test_invalid_condition_values_json() {
    cmd()
        .arg("--template-file")
        .arg(fixture("conditional.yaml"))
        .args(["--condition-values", "{IsProd: true", "--analyze-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid condition values JSON"));
}

#[test]
fn test_condition_values_must_be_booleans() {
    cmd()
        .arg("--template-file")
        .arg(fixture("conditional.yaml"))
        .args(["--condition-values", r#"{"IsProd": "yes"}"#, "--analyze-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be true or false"));
}

#[test]
fn test_parameter_without_equals_fails() {
    cmd()
        .arg("--template-file")
        .arg(fixture("conditional.yaml"))
        .args(["--analyze-only", "--parameters", "Env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected Key=Value"));
}

#[test]
fn test_output_format_invalid_value_is_rejected() {
    cmd()
        .arg("--template-file")
        .arg(fixture("conditional.yaml"))
        .args(["--output-format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_capabilities_file_fails() {
    cmd()
        .arg("--template-file")
        .arg(fixture("conditional.yaml"))
        .args(["--capabilities-file", "no-such-capabilities.yaml", "--analyze-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read capability file"));
}
