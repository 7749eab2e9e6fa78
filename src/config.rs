//! Run configuration, read from `FIXBOT_*` environment variables.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Environment variable {0} must not be empty")]
    Empty(&'static str),
}

/// Settings shared by every step of a fix run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixConfig {
    /// Root of the checked-out repository
    pub working_dir: PathBuf,

    pub repo_owner: String,

    pub repo_name: String,

    /// Branch every fix branch starts from and every workflow returns to
    pub base_branch: String,

    /// Git remote that receives fix branches (default: `origin`)
    pub remote: String,

    /// Token used to push and to call the hosting API.
    ///
    /// Never logged and redacted from surfaced errors.
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Hosting API base URL (default: GitHub)
    pub api_url: String,

    /// JSON scan report consumed by [`crate::ReportFileScanner`]
    pub scan_report: Option<PathBuf>,
}

impl FixConfig {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            base_branch: base_branch.into(),
            remote: DEFAULT_REMOTE.to_string(),
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            scan_report: None,
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_scan_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_report = Some(path.into());
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is unset or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            match lookup(key) {
                None => Err(ConfigError::Missing(key)),
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
                Some(value) => Ok(value),
            }
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::new(
            optional("FIXBOT_WORKING_DIR").unwrap_or_else(|| ".".to_string()),
            required("FIXBOT_REPO_OWNER")?,
            required("FIXBOT_REPO_NAME")?,
            required("FIXBOT_BASE_BRANCH")?,
        );
        if let Some(remote) = optional("FIXBOT_REMOTE") {
            config = config.with_remote(remote);
        }
        if let Some(token) = optional("FIXBOT_TOKEN") {
            config = config.with_token(token);
        }
        if let Some(api_url) = optional("FIXBOT_API_URL") {
            config = config.with_api_url(api_url);
        }
        if let Some(report) = optional("FIXBOT_SCAN_REPORT") {
            config = config.with_scan_report(report);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_applies_defaults() {
        let config = FixConfig::from_lookup(lookup(&[
            ("FIXBOT_REPO_OWNER", "acme"),
            ("FIXBOT_REPO_NAME", "shop"),
            ("FIXBOT_BASE_BRANCH", "main"),
        ]))
        .unwrap();

        assert_eq!(config.working_dir, PathBuf::from("."));
        assert_eq!(config.remote, "origin");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.token.is_none());
        assert!(config.scan_report.is_none());
    }

    #[test]
    fn test_from_lookup_reads_optional_values() {
        let config = FixConfig::from_lookup(lookup(&[
            ("FIXBOT_WORKING_DIR", "/src/shop"),
            ("FIXBOT_REPO_OWNER", "acme"),
            ("FIXBOT_REPO_NAME", "shop"),
            ("FIXBOT_BASE_BRANCH", "develop"),
            ("FIXBOT_REMOTE", "upstream"),
            ("FIXBOT_TOKEN", "s3cret"),
            ("FIXBOT_SCAN_REPORT", "scan.json"),
        ]))
        .unwrap();

        assert_eq!(config.working_dir, PathBuf::from("/src/shop"));
        assert_eq!(config.base_branch, "develop");
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.token.as_deref(), Some("s3cret"));
        assert_eq!(config.scan_report, Some(PathBuf::from("scan.json")));
    }

    #[test]
    fn test_missing_and_empty_required_values() {
        assert_eq!(
            FixConfig::from_lookup(lookup(&[("FIXBOT_REPO_OWNER", "acme")])),
            Err(ConfigError::Missing("FIXBOT_REPO_NAME"))
        );
        assert_eq!(
            FixConfig::from_lookup(lookup(&[
                ("FIXBOT_REPO_OWNER", "acme"),
                ("FIXBOT_REPO_NAME", "shop"),
                ("FIXBOT_BASE_BRANCH", "  "),
            ])),
            Err(ConfigError::Empty("FIXBOT_BASE_BRANCH"))
        );
    }

    #[test]
    fn test_token_is_not_serialized() {
        let config = FixConfig::new(".", "acme", "shop", "main").with_token("s3cret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("s3cret"));
    }
}
