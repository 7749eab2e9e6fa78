//! Fix module - from scan findings to one pull request per vulnerable package.
//!
//! This module provides the core of the fixer:
//! - **Version ranges**: [`version::parse_fix_version`] and version ordering
//! - **Aggregation**: [`aggregate::aggregate`] folds findings into a [`FixVersionsMap`](crate::FixVersionsMap)
//! - **Ecosystems**: [`PackageFixer`] implementations behind a [`FixerRegistry`]
//! - **Branch workflow**: [`BranchWorkflow`] with guaranteed return to the base branch
//! - **Pipeline**: run orchestration via [`FixPipeline`]

pub mod aggregate;
pub mod branch;
pub mod ecosystems;
pub mod pipeline;
pub mod traits;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use traits::{FixContext, FixError, FixOutcome, PackageFixer};

pub use aggregate::{aggregate, FixFilter};
pub use branch::{commit_title, fix_branch_name, BranchWorkflow, BRANCH_PREFIX};
pub use ecosystems::{
    FixerRegistry, GoFixer, MavenFixer, MavenPropertyIndex, NpmFixer, PomPropertyScanner, PropertyIndexError,
    PropertyIndexSource,
};
pub use pipeline::{FixPipeline, PackageFailure, RunError, RunSummary};
pub use version::{compare_versions, parse_fix_version};
