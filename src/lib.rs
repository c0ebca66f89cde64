//! Branch Test Reporter - runs a repository's test suite on a branch and files
//! a GitHub issue for every failing test.
//!
//! A run synchronizes a local working copy to the branch, runs the configured
//! test command in it, extracts failure blocks from the output and posts one
//! issue per failure.

pub mod command;
pub mod config;
pub mod error;
pub mod failures;
pub mod issue;
pub mod logging;
pub mod orchestrator;
pub mod repo;
pub mod suite;

pub use command::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use config::{Config, DEFAULT_API_BASE_URL, DEFAULT_CONFIG_PATH};
pub use error::Error;
pub use failures::{parse_failures, TestFailure};
pub use issue::{IssuePayload, IssueReporter, RepoSlug, ReportOutcome, TOKEN_ENV_VAR};
pub use orchestrator::{exit_code_for, Orchestrator, RunOutcome};
pub use repo::{RepoSync, SyncAction, SyncReport};
pub use suite::TestSuite;
