//! Integration tests for the cfn-preflight binary.
//!
//! Every test runs with `--analyze-only` or fails before AWS is contacted, so
//! no credentials or network access are needed.

#![allow(deprecated)] // cargo_bin is deprecated but works fine for standard builds

mod analysis_tests;
mod cli_tests;

use std::path::PathBuf;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
