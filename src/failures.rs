//! Extraction of failing tests from verbose test-runner output.
//!
//! A failure block looks like
//!
//! ```text
//! ________ test_name ________
//! ...diagnostic lines...
//! FAILED reason text
//! ```
//!
//! Output in any other layout yields no failures.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A failing test and the reason reported for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    /// Test identifier from the block header.
    pub name: String,
    /// Text following `FAILED` up to the end of that line.
    pub reason: String,
}

fn failure_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)_{8,} (\S+) _{8,}.*?FAILED\s+(?-s:(.*))")
            .expect("failure pattern is a valid regex")
    })
}

/// Returns the failures found in `output`, in the order they appear.
pub fn parse_failures(output: &str) -> Vec<TestFailure> {
    failure_pattern()
        .captures_iter(output)
        .map(|caps| TestFailure {
            name: caps[1].trim().to_string(),
            reason: caps[2].trim().to_string(),
        })
        .collect()
}
