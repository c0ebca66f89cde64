//! Test suite invocation.

use std::path::Path;

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::{Error, Result};

/// Runs the configured test command inside a working copy.
#[derive(Debug, Clone)]
pub struct TestSuite {
    program: String,
    args: Vec<String>,
}

impl TestSuite {
    /// Builds a suite from a program followed by its arguments,
    /// e.g. `["pytest", "-v"]`.
    pub fn from_command(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Config("test_command cannot be empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Command line that [`TestSuite::run`] executes in `working_copy`.
    pub fn command(&self, working_copy: &Path) -> CommandSpec {
        CommandSpec::new(self.program.clone())
            .args(self.args.iter().cloned())
            .current_dir(working_copy)
    }

    /// Runs the suite and returns its raw output.
    pub async fn run(
        &self,
        runner: &dyn CommandRunner,
        working_copy: &Path,
    ) -> Result<CommandOutput> {
        tracing::info!(program = %self.program, "running test suite");
        runner.run(&self.command(working_copy)).await
    }
}
