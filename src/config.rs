//! Run configuration loaded from a JSON file.
//!
//! Required keys are `repository`, `local_repo_path` and `log_file`. The test
//! command and issue API host have defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Path the configuration is read from when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Default GitHub REST API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Configuration for a reporting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// URL of the remote repository to clone.
    pub repository: String,
    /// Where the working copy lives on disk.
    pub local_repo_path: PathBuf,
    /// Log file path (rotated in place).
    pub log_file: PathBuf,
    /// Program and arguments used to run the test suite.
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,
    /// Base URL of the issue API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_test_command() -> Vec<String> {
    vec!["pytest".to_string(), "-v".to_string()]
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Config {
    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.test_command.is_empty() {
            return Err(Error::Config("test_command cannot be empty".to_string()));
        }
        if self.test_command[0].trim().is_empty() {
            return Err(Error::Config(
                "test_command program cannot be blank".to_string(),
            ));
        }
        Ok(())
    }
}
