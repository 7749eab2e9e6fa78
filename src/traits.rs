use crate::model::ScanReport;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to read scan report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scan report: {0}")]
    InvalidReport(#[from] serde_json::Error),
    #[error("Scan failed: {0}")]
    Service(String),
}

#[derive(Error, Debug)]
pub enum PullRequestError {
    #[error("Pull request request failed: {0}")]
    Transport(String),
    #[error("Pull request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' failed: {status} - {output}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },
}

/// Captured result of a successful subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Produces the vulnerability report for the current commit.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self) -> Result<ScanReport, ScanError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub owner: String,
    pub repo: String,
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

/// VCS hosting API used to open fix pull requests.
#[async_trait]
pub trait PullRequestClient: Send + Sync {
    async fn create_pull_request(&self, request: &PullRequest) -> Result<(), PullRequestError>;
}

/// Fire-and-forget usage signal; its result never drives control flow.
#[async_trait]
pub trait UsageReporter: Send + Sync {
    async fn report_usage(&self, command: &str);
}

/// Runs external tools (git, go, npm, mvn) against the working tree.
///
/// Implementations return `CommandError::Failed` for a non-zero exit, with
/// the tool's combined stdout/stderr in `output`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], dir: &Path) -> Result<CommandOutput, CommandError>;
}
