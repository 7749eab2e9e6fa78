//! Fix pipeline: scan → aggregate → one branch workflow per package.
//!
//! - Async execution via `tokio`, packages fixed strictly one at a time since
//!   they share the working tree
//! - Structured logging via `tracing`
//! - Per-package failures are logged and collected; only scan, normalization
//!   and Maven index failures abort the run

use crate::config::FixConfig;
use crate::fix::aggregate::{aggregate, FixFilter};
use crate::fix::branch::BranchWorkflow;
use crate::fix::ecosystems::{FixerRegistry, MavenPropertyIndex, PomPropertyScanner, PropertyIndexError, PropertyIndexSource};
use crate::fix::traits::FixOutcome;
use crate::git::GitManager;
use crate::model::{FixVersionsMap, ImpactedVulnerability, NormalizationError, PackageType};
use crate::traits::{CommandRunner, PullRequestClient, ScanError, Scanner, UsageReporter};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Name reported to the usage collaborator.
pub const COMMAND_NAME: &str = "create-fix-pull-requests";

// ============================================================================
// Pipeline Types
// ============================================================================

/// A package whose fix attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFailure {
    pub package: String,
    pub version: String,
    pub error: String,
}

/// What happened to each package of the fix map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Branches pushed with a pull request requested
    pub opened: Vec<String>,

    /// Branches skipped because a previous run pushed them
    pub already_fixed: Vec<String>,

    pub failed: Vec<PackageFailure>,
}

/// Errors that abort the whole run.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Failed to prepare vulnerabilities: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Failed to index Maven properties: {0}")]
    PropertyIndex(#[from] PropertyIndexError),

    #[error("Task join error: {0}")]
    Join(String),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

pub struct FixPipeline {
    config: FixConfig,
    scanner: Arc<dyn Scanner>,
    pull_requests: Arc<dyn PullRequestClient>,
    runner: Arc<dyn CommandRunner>,
    fixers: FixerRegistry,
    property_source: Arc<dyn PropertyIndexSource>,
    usage: Option<Arc<dyn UsageReporter>>,
}

impl FixPipeline {
    /// Creates a pipeline with the built-in fixers, POM scanning from the
    /// working directory and no usage reporting.
    pub fn new(
        config: FixConfig,
        scanner: Arc<dyn Scanner>,
        pull_requests: Arc<dyn PullRequestClient>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let property_source = Arc::new(PomPropertyScanner::new(config.working_dir.clone()));
        Self {
            config,
            scanner,
            pull_requests,
            runner,
            fixers: FixerRegistry::default(),
            property_source,
            usage: None,
        }
    }

    pub fn with_fixers(mut self, fixers: FixerRegistry) -> Self {
        self.fixers = fixers;
        self
    }

    pub fn with_property_source(mut self, source: Arc<dyn PropertyIndexSource>) -> Self {
        self.property_source = source;
        self
    }

    pub fn with_usage_reporter(mut self, usage: Arc<dyn UsageReporter>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Scans the repository and opens one pull request per fixable package.
    ///
    /// The usage report runs alongside and is awaited before returning, on
    /// success and failure alike.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if scanning, vulnerability normalization or Maven
    /// indexing fails. Individual package failures are reported in
    /// [`RunSummary::failed`] instead.
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let usage = self.usage.clone().map(|reporter| {
            tokio::spawn(async move {
                reporter.report_usage(COMMAND_NAME).await;
            })
        });

        let result = self.scan_and_fix().await;

        if let Some(handle) = usage {
            if let Err(e) = handle.await {
                warn!(error = %e, "Usage report task failed");
            }
        }
        result
    }

    async fn scan_and_fix(&self) -> Result<RunSummary, RunError> {
        let report = self.scanner.scan().await?;
        info!(findings = report.findings.len(), "Scan completed");

        let vulnerabilities = report.impacted_vulnerabilities()?;
        let maven_properties = self.maven_properties(&vulnerabilities).await?;

        let fix_versions = aggregate(&vulnerabilities, &FixFilter::new(&maven_properties));
        info!(
            packages = fix_versions.len(),
            "Found impacted packages with fix versions"
        );

        Ok(self.fix_all(fix_versions, &maven_properties).await)
    }

    /// Indexes the POMs once, only when a Maven package is impacted.
    async fn maven_properties(
        &self,
        vulnerabilities: &[ImpactedVulnerability],
    ) -> Result<MavenPropertyIndex, RunError> {
        let has_maven = vulnerabilities
            .iter()
            .any(|v| v.impacted_package_type == PackageType::Maven);
        if !has_maven {
            return Ok(MavenPropertyIndex::default());
        }

        let source = self.property_source.clone();
        let index = tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| RunError::Join(e.to_string()))??;
        Ok(index)
    }

    async fn fix_all(&self, fix_versions: FixVersionsMap, maven_properties: &MavenPropertyIndex) -> RunSummary {
        let git = GitManager::new(
            self.runner.clone(),
            self.config.working_dir.clone(),
            self.config.remote.clone(),
        )
        .with_token(self.config.token.clone());
        let workflow = BranchWorkflow::new(
            &git,
            self.runner.as_ref(),
            &self.fixers,
            self.pull_requests.as_ref(),
            &self.config,
        );

        let mut summary = RunSummary::default();
        for (package, info) in fix_versions {
            info!(package = %package, version = %info.fix_version, "Fixing package");
            let version = info.fix_version.clone();
            match workflow.fix_package(&package, info, maven_properties).await {
                Ok(FixOutcome::Opened { branch, .. }) => summary.opened.push(branch),
                Ok(FixOutcome::AlreadyExists { branch }) => summary.already_fixed.push(branch),
                Err(e) => {
                    error!(
                        package = %package,
                        version = %version,
                        error = %e,
                        "Failed to fix package and create pull request"
                    );
                    summary.failed.push(PackageFailure {
                        package,
                        version,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            opened = summary.opened.len(),
            already_fixed = summary.already_fixed.len(),
            failed = summary.failed.len(),
            "Fix run completed"
        );
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================
