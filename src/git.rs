//! Git operations on the working tree, executed through a [`CommandRunner`].
//!
//! Every failure keeps git's captured output. Remote URLs carrying a token are
//! never surfaced: errors from `ls-remote` and `push` name the remote instead.

use crate::traits::{CommandError, CommandRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct GitManager {
    runner: Arc<dyn CommandRunner>,
    dir: PathBuf,
    remote: String,
    token: Option<String>,
    target: OnceCell<String>,
}

impl GitManager {
    pub fn new(runner: Arc<dyn CommandRunner>, dir: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            runner,
            dir: dir.into(),
            remote: remote.into(),
            token: None,
            target: OnceCell::new(),
        }
    }

    /// Authenticates remote access to https remotes with `token`.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn git(&self, args: &[&str]) -> Result<String, CommandError> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        let output = self.runner.run("git", &args, &self.dir).await?;
        Ok(output.stdout)
    }

    /// Remote name, or its token-authenticated URL when a token is set and
    /// the remote is https. Resolved on first use.
    async fn remote_target(&self) -> Result<&str, CommandError> {
        let target = self.target.get_or_try_init(|| self.resolve_target()).await?;
        Ok(target.as_str())
    }

    async fn resolve_target(&self) -> Result<String, CommandError> {
        let Some(token) = &self.token else {
            return Ok(self.remote.clone());
        };
        let url = self.git(&["remote", "get-url", self.remote.as_str()]).await?;
        Ok(authenticated_url(url.trim(), token).unwrap_or_else(|| self.remote.clone()))
    }

    pub async fn branch_exists_on_remote(&self, branch: &str) -> Result<bool, CommandError> {
        let target = self.remote_target().await?;
        let listed = self
            .git(&["ls-remote", "--heads", target, branch])
            .await
            .map_err(|err| self.redact(err, format!("git ls-remote --heads {} {}", self.remote, branch)))?;
        let wanted = format!("refs/heads/{}", branch);
        Ok(listed
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(wanted.as_str())))
    }

    /// Creates `branch` at the tip of `start_point`, resetting a stale local
    /// branch of the same name.
    pub async fn create_branch(&self, branch: &str, start_point: &str) -> Result<(), CommandError> {
        self.git(&["branch", "--force", branch, start_point]).await.map(drop)
    }

    pub async fn checkout(&self, branch: &str) -> Result<(), CommandError> {
        self.git(&["checkout", branch]).await.map(drop)
    }

    pub async fn is_clean(&self) -> Result<bool, CommandError> {
        let status = self.git(&["status", "--porcelain"]).await?;
        Ok(status.trim().is_empty())
    }

    pub async fn add_all(&self) -> Result<(), CommandError> {
        self.git(&["add", "-A"]).await.map(drop)
    }

    pub async fn commit(&self, message: &str) -> Result<(), CommandError> {
        self.git(&["commit", "-m", message]).await.map(drop)
    }

    /// Drops staged and unstaged changes to tracked files, then removes
    /// untracked files and directories. Ignored files are kept.
    pub async fn discard_changes(&self) -> Result<(), CommandError> {
        self.git(&["reset", "--hard"]).await?;
        self.git(&["clean", "-fd"]).await.map(drop)
    }

    pub async fn push(&self, branch: &str) -> Result<(), CommandError> {
        let target = self.remote_target().await?;
        debug!(remote = %self.remote, branch, "Pushing");
        self.git(&["push", target, branch])
            .await
            .map(drop)
            .map_err(|err| self.redact(err, format!("git push {} {}", self.remote, branch)))
    }

    fn redact(&self, err: CommandError, command: String) -> CommandError {
        let scrub = |text: String| match &self.token {
            Some(token) if !token.is_empty() => text.replace(token.as_str(), "***"),
            _ => text,
        };
        match err {
            CommandError::Spawn { source, .. } => CommandError::Spawn { command, source },
            CommandError::Failed { status, output, .. } => CommandError::Failed {
                command,
                status,
                output: scrub(output),
            },
        }
    }
}

/// Injects `token` into an https remote URL, replacing any existing
/// credentials. Non-https remotes (ssh, file) are left to git's own auth.
pub fn authenticated_url(url: &str, token: &str) -> Option<String> {
    let rest = url.strip_prefix("https://")?;
    let host_and_path = rest.split_once('@').map_or(rest, |(_, after)| after);
    Some(format!("https://x-access-token:{}@{}", token, host_and_path))
}
