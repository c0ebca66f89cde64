//! The reporting run: synchronize, test, file issues.

use tracing::Instrument;
use uuid::Uuid;

use crate::command::CommandRunner;
use crate::config::Config;
use crate::error::Result;
use crate::failures::{parse_failures, TestFailure};
use crate::issue::{IssuePayload, IssueReporter, RepoSlug, ReportOutcome};
use crate::repo::RepoSync;
use crate::suite::TestSuite;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The test suite exited with status 0.
    Passed,
    /// The suite failed; issues were filed for recognised failures.
    Failed {
        failures: Vec<TestFailure>,
        issues_filed: usize,
    },
    /// An unexpected error stopped the run; it was logged and swallowed.
    Aborted { reason: String },
}

/// Sequences one run against a single branch.
pub struct Orchestrator<R: CommandRunner> {
    config: Config,
    branch: String,
    runner: R,
    reporter: IssueReporter,
    run_id: Uuid,
}

impl<R: CommandRunner> Orchestrator<R> {
    /// Creates an orchestrator for `branch`.
    pub fn new(
        config: Config,
        branch: impl Into<String>,
        runner: R,
        reporter: IssueReporter,
    ) -> Self {
        Self {
            config,
            branch: branch.into(),
            runner,
            reporter,
            run_id: Uuid::new_v4(),
        }
    }

    /// Identifier attached to every log line of this run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Runs the whole sequence.
    ///
    /// Non-fatal errors are logged with their causes and turned into
    /// [`RunOutcome::Aborted`]. Fatal errors (a command that cannot be
    /// launched) are returned. The end marker is logged either way.
    pub async fn run(&self) -> Result<RunOutcome> {
        let span = tracing::info_span!("run", id = %self.run_id, branch = %self.branch);

        async {
            tracing::info!("=== run started ===");

            let outcome = match self.execute().await {
                Ok(outcome) => Ok(outcome),
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e.chain(), "fatal error, stopping");
                    Err(e)
                }
                Err(e) => {
                    tracing::error!(error = %e.chain(), details = ?e, "unexpected error occurred");
                    Ok(RunOutcome::Aborted {
                        reason: e.to_string(),
                    })
                }
            };

            tracing::info!("=== run ended ===");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(&self) -> Result<RunOutcome> {
        let working_copy = self.config.local_repo_path.as_path();

        RepoSync::new(&self.runner)
            .sync(&self.config.repository, &self.branch, working_copy)
            .await?;

        let suite = TestSuite::from_command(&self.config.test_command)?;
        let output = suite.run(&self.runner, working_copy).await?;

        if output.success() {
            tracing::info!("all tests passed successfully");
            return Ok(RunOutcome::Passed);
        }

        let failures = parse_failures(&output.combined());
        let repo = RepoSlug::from_url(&self.config.repository)?;

        if failures.is_empty() {
            tracing::warn!(
                exit_code = output.exit_code,
                "test run failed but no failure blocks were recognised in its output"
            );
        } else {
            tracing::info!(count = failures.len(), "reporting test failures");
        }

        let mut issues_filed = 0;
        for failure in &failures {
            let issue = IssuePayload::for_failure(&self.branch, failure);
            if self.reporter.report(&repo, &issue).await? == ReportOutcome::Created {
                issues_filed += 1;
            }
        }

        Ok(RunOutcome::Failed {
            failures,
            issues_filed,
        })
    }
}

/// Process exit status for the result of [`Orchestrator::run`]: 0 for any
/// completed run, including one with failing tests.
pub fn exit_code_for(result: &Result<RunOutcome>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::scripted::ScriptedRunner;
    use crate::command::{CommandOutput, CommandSpec};
    use crate::error::Error;
    use crate::logging::capture::capture;
    use async_trait::async_trait;
    use tempfile::TempDir;

    const ONE_FAILURE: &str = "\
________ test_foo ________
>       assert answer() == 42
E       assert 41 == 42
FAILED tests/test_answer.py::test_foo - assert 41 == 42
";

    fn config(dir: &TempDir, repository: &str) -> Config {
        Config {
            repository: repository.to_string(),
            local_repo_path: dir.path().to_path_buf(),
            log_file: dir.path().join("run.log"),
            test_command: vec!["pytest".to_string(), "-v".to_string()],
            api_base_url: "http://127.0.0.1:1".to_string(),
        }
    }

    fn reporter_without_token() -> IssueReporter {
        IssueReporter::new("http://127.0.0.1:1", None).unwrap()
    }

    fn ok() -> CommandOutput {
        CommandOutput::default()
    }

    #[tokio::test]
    async fn passing_suite_logs_success() {
        let dir = TempDir::new().unwrap();
        let (_guard, logs) = capture();
        let runner = ScriptedRunner::new();
        let orchestrator = Orchestrator::new(
            config(&dir, "https://github.com/acme/widgets.git"),
            "main",
            runner,
            reporter_without_token(),
        );

        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Passed);
        assert_eq!(
            orchestrator.runner.issued_lines(),
            vec!["git fetch", "git checkout main", "git pull", "pytest -v"]
        );
        let logs = logs.contents();
        assert!(logs.contains("=== run started ==="));
        assert!(logs.contains("all tests passed successfully"));
        assert!(logs.contains("=== run ended ==="));
    }

    #[tokio::test]
    async fn failing_suite_without_token_parses_but_files_nothing() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        for _ in 0..3 {
            runner.reply(ok());
        }
        runner.reply(CommandOutput {
            exit_code: 1,
            stdout: ONE_FAILURE.to_string(),
            stderr: String::new(),
        });
        let orchestrator = Orchestrator::new(
            config(&dir, "https://github.com/acme/widgets.git"),
            "main",
            runner,
            reporter_without_token(),
        );

        let outcome = orchestrator.run().await.unwrap();

        match outcome {
            RunOutcome::Failed {
                failures,
                issues_filed,
            } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].name, "test_foo");
                assert_eq!(issues_filed, 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unrecognised_failure_output_is_flagged() {
        let dir = TempDir::new().unwrap();
        let (_guard, logs) = capture();
        let runner = ScriptedRunner::failing_with(2);
        let orchestrator = Orchestrator::new(
            config(&dir, "https://github.com/acme/widgets.git"),
            "main",
            runner,
            reporter_without_token(),
        );

        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Failed {
                failures: Vec::new(),
                issues_filed: 0,
            }
        );
        assert!(logs
            .contents()
            .contains("no failure blocks were recognised"));
    }

    #[tokio::test]
    async fn unexpected_errors_are_swallowed_with_end_marker() {
        let dir = TempDir::new().unwrap();
        let (_guard, logs) = capture();
        let runner = ScriptedRunner::failing_with(1);
        let orchestrator = Orchestrator::new(
            config(&dir, "not-a-url"),
            "main",
            runner,
            reporter_without_token(),
        );

        let outcome = orchestrator.run().await.unwrap();

        assert!(matches!(outcome, RunOutcome::Aborted { .. }));
        let logs = logs.contents();
        assert!(logs.contains("unexpected error occurred"));
        assert!(logs.contains("=== run ended ==="));
    }

    struct UnlaunchableRunner;

    #[async_trait]
    impl CommandRunner for UnlaunchableRunner {
        async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
            Err(Error::Launch {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "git not found"),
            })
        }
    }

    #[tokio::test]
    async fn launch_failure_is_fatal_but_still_logs_end() {
        let dir = TempDir::new().unwrap();
        let (_guard, logs) = capture();
        let orchestrator = Orchestrator::new(
            config(&dir, "https://github.com/acme/widgets.git"),
            "main",
            UnlaunchableRunner,
            reporter_without_token(),
        );

        let result = orchestrator.run().await;

        assert!(matches!(result, Err(Error::Launch { .. })));
        assert_eq!(exit_code_for(&result), 1);
        let logs = logs.contents();
        assert!(logs.contains("fatal error"));
        assert!(logs.contains("=== run ended ==="));
    }

    #[test]
    fn completed_runs_exit_zero() {
        assert_eq!(exit_code_for(&Ok(RunOutcome::Passed)), 0);
        assert_eq!(
            exit_code_for(&Ok(RunOutcome::Failed {
                failures: Vec::new(),
                issues_filed: 0
            })),
            0
        );
    }

    #[tokio::test]
    async fn log_lines_carry_run_id() {
        let dir = TempDir::new().unwrap();
        let (_guard, logs) = capture();
        let orchestrator = Orchestrator::new(
            config(&dir, "https://github.com/acme/widgets.git"),
            "main",
            ScriptedRunner::new(),
            reporter_without_token(),
        );

        orchestrator.run().await.unwrap();

        assert!(logs.contents().contains(&orchestrator.run_id().to_string()));
    }
}
