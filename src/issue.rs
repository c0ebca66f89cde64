//! GitHub issue filing.
//!
//! One issue per failing test, created through the REST API with a token
//! taken from `GITHUB_TOKEN`. Without a token reporting is skipped.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::failures::TestFailure;

/// Environment variable holding the API token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

const ACCEPT_GITHUB_V3: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name without `.git`.
    pub name: String,
}

impl RepoSlug {
    /// Derives the slug from a repository URL: the owner is the second to last
    /// `/`-separated segment, the name is the last one minus a `.git` suffix.
    pub fn from_url(url: &str) -> Result<Self> {
        let mut segments = url.rsplit('/');
        let (Some(last), Some(owner)) = (segments.next(), segments.next()) else {
            return Err(Error::InvalidRepositoryUrl(url.to_string()));
        };
        let name = last.strip_suffix(".git").unwrap_or(last);

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// Title and markdown body of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePayload {
    /// Issue title.
    pub title: String,
    /// Markdown body.
    pub body: String,
}

impl IssuePayload {
    /// Builds the issue for a test failing on `branch`.
    pub fn for_failure(branch: &str, failure: &TestFailure) -> Self {
        Self {
            title: format!("Test failure: {}", failure.name),
            body: format!(
                "Branch: `{}`\n\nFailure Reason:\n```\n{}\n```",
                branch, failure.reason
            ),
        }
    }
}

/// What happened to a single issue report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The API answered `201 Created`.
    Created,
    /// No token was available, so nothing was sent.
    SkippedNoToken,
    /// The API answered with any other status.
    Rejected { status: u16, body: String },
}

/// Files issues against the GitHub REST API.
pub struct IssueReporter {
    client: reqwest::Client,
    api_base_url: String,
    token: Option<String>,
}

impl IssueReporter {
    /// Creates a reporter for `api_base_url` using `token` (empty means none).
    pub fn new(api_base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::GitHub(format!("failed to build HTTP client: {}", e)))?;

        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        let token = token.filter(|t| !t.is_empty());

        Ok(Self {
            client,
            api_base_url,
            token,
        })
    }

    /// Creates a reporter reading its token from `GITHUB_TOKEN`.
    pub fn from_env(api_base_url: impl Into<String>) -> Result<Self> {
        Self::new(api_base_url, std::env::var(TOKEN_ENV_VAR).ok())
    }

    /// Returns true if a token is available.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Endpoint issues for `repo` are posted to.
    pub fn issues_url(&self, repo: &RepoSlug) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.api_base_url, repo.owner, repo.name
        )
    }

    /// Creates one issue in `repo`.
    ///
    /// A missing token or a non-201 answer is logged and reported through the
    /// outcome; only a transport failure is an error.
    pub async fn report(&self, repo: &RepoSlug, issue: &IssuePayload) -> Result<ReportOutcome> {
        let Some(token) = &self.token else {
            tracing::error!("{} not set in environment variables", TOKEN_ENV_VAR);
            return Ok(ReportOutcome::SkippedNoToken);
        };

        let response = self
            .client
            .post(self.issues_url(repo))
            .header(AUTHORIZATION, format!("token {}", token))
            .header(ACCEPT, ACCEPT_GITHUB_V3)
            .json(issue)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CREATED {
            tracing::info!(title = %issue.title, "issue created");
            return Ok(ReportOutcome::Created);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "failed to create issue");
        Ok(ReportOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
