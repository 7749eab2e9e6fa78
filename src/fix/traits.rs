//! Core traits and types for per-package fixes.
//!
//! - Ecosystem-specific manifest mutation via [`PackageFixer`]
//! - The per-package error taxonomy [`FixError`]

use crate::fix::ecosystems::maven::MavenPropertyIndex;
use crate::model::PackageType;
use crate::traits::{CommandError, CommandRunner, PullRequestError};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Fixer Trait
// ============================================================================

/// Everything a fixer may touch while mutating the working tree.
pub struct FixContext<'a> {
    /// Repository root the package manager runs in
    pub working_dir: &'a Path,

    /// Runner for the package-manager binary
    pub runner: &'a dyn CommandRunner,

    /// Direct Maven dependencies and the POM properties holding their versions
    pub maven_properties: &'a MavenPropertyIndex,
}

impl FixContext<'_> {
    /// Runs `program` in the working directory, discarding its output.
    pub async fn run(&self, program: &str, args: Vec<String>) -> Result<(), FixError> {
        self.runner.run(program, &args, self.working_dir).await?;
        Ok(())
    }
}

/// Upgrades one package of a single ecosystem in place.
///
/// Implementations only mutate manifest and lock files; branch handling
/// belongs to the caller.
#[async_trait]
pub trait PackageFixer: Send + Sync {
    /// Ecosystem this fixer handles, used as its registry key.
    fn package_type(&self) -> PackageType;

    /// Upgrades `package` to `version` in the working tree.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Command`] carrying the tool's output when the
    /// package manager exits unsuccessfully.
    async fn apply_fix(&self, package: &str, version: &str, ctx: &FixContext<'_>) -> Result<(), FixError>;
}

// ============================================================================
// Outcome & Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Fix branch pushed and pull request requested
    Opened { branch: String, title: String },

    /// A previous run already pushed this exact fix branch
    AlreadyExists { branch: String },
}

/// Errors that end the fix attempt for one package. None of them stop the run.
#[derive(Error, Debug)]
pub enum FixError {
    #[error("unsupported package type: {0}")]
    UnsupportedPackageType(PackageType),

    /// The fixer succeeded but the working tree is unchanged
    #[error("no changes were made after upgrading {package} to {version}")]
    NoChanges { package: String, version: String },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("failed to create pull request: {0}")]
    PullRequest(#[from] PullRequestError),

    /// The attempt itself succeeded but the base branch could not be restored
    #[error("failed to restore base branch '{branch}': {source}")]
    Rollback {
        branch: String,
        #[source]
        source: CommandError,
    },
}
