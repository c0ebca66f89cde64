//! Branch Test Reporter CLI
//!
//! Runs the test suite of the configured repository on one branch and files a
//! GitHub issue per failing test.

use std::path::PathBuf;

use clap::Parser;

use test_reporter::{exit_code_for, logging, Config, IssueReporter, Orchestrator, ProcessRunner};

/// Run a repository's tests on a branch and file issues for failures.
#[derive(Parser, Debug)]
#[command(name = "branch-test-reporter", version, about)]
struct Cli {
    /// Branch to check out and test.
    branch: String,

    /// JSON configuration file.
    #[arg(long, default_value = test_reporter::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1; --help and --version exit 0.
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.log_file) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let reporter = match IssueReporter::from_env(config.api_base_url.clone()) {
        Ok(reporter) => reporter,
        Err(e) => {
            tracing::error!(error = %e, "cannot create issue reporter");
            std::process::exit(1);
        }
    };

    let orchestrator = Orchestrator::new(config, cli.branch, ProcessRunner::new(), reporter);
    let result = orchestrator.run().await;

    std::process::exit(exit_code_for(&result));
}
