//! Working copy synchronization.
//!
//! Best effort: clone or fetch, then checkout and pull. A failing git step is
//! logged by the runner and the next step still runs.

use std::path::Path;

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::Result;

/// How the working copy was brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// No working copy existed; it was cloned.
    Cloned,
    /// An existing working copy was fetched.
    Fetched,
}

/// Outcome of each step of a synchronization.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Whether the first step was a clone or a fetch.
    pub action: SyncAction,
    /// Output of the clone or fetch.
    pub update: CommandOutput,
    /// Output of `git checkout <branch>`.
    pub checkout: CommandOutput,
    /// Output of `git pull`.
    pub pull: CommandOutput,
}

impl SyncReport {
    /// Returns true if every git step exited with status 0.
    pub fn all_succeeded(&self) -> bool {
        self.update.success() && self.checkout.success() && self.pull.success()
    }
}

/// Brings a local working copy onto a branch of a remote repository.
pub struct RepoSync<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> RepoSync<'a> {
    /// Creates a synchronizer that issues git commands through `runner`.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Clones `url` into `local_path` (or fetches if it already exists), then
    /// checks out `branch` and pulls.
    ///
    /// Only launch failures are returned as errors.
    pub async fn sync(&self, url: &str, branch: &str, local_path: &Path) -> Result<SyncReport> {
        let (action, update) = if !local_path.exists() {
            tracing::info!(repository = %url, path = ?local_path, "cloning repository");
            let clone = CommandSpec::new("git")
                .arg("clone")
                .arg(url)
                .arg(local_path.to_string_lossy());
            (SyncAction::Cloned, self.runner.run(&clone).await?)
        } else {
            tracing::info!(path = ?local_path, "repository already cloned, fetching latest changes");
            let fetch = CommandSpec::new("git").arg("fetch").current_dir(local_path);
            (SyncAction::Fetched, self.runner.run(&fetch).await?)
        };

        let checkout = CommandSpec::new("git")
            .arg("checkout")
            .arg(branch)
            .current_dir(local_path);
        let checkout = self.runner.run(&checkout).await?;

        let pull = CommandSpec::new("git").arg("pull").current_dir(local_path);
        let pull = self.runner.run(&pull).await?;

        let report = SyncReport {
            action,
            update,
            checkout,
            pull,
        };

        if report.all_succeeded() {
            tracing::info!(branch = %branch, "working copy synchronized");
        } else {
            tracing::warn!(branch = %branch, "working copy synchronized with errors");
        }

        Ok(report)
    }
}
