//! Per-package branch workflow.
//!
//! Each fix lives on its own branch:
//! 1. **Check**: skip when the fix branch already exists on the remote
//! 2. **Branch**: create it from the base branch and check it out
//! 3. **Mutate**: let the ecosystem's [`PackageFixer`](crate::fix::PackageFixer) edit manifests
//! 4. **Commit**: refuse empty diffs, then commit everything
//! 5. **Publish**: push and open a pull request against the base branch
//!
//! Once the fix branch is checked out, every exit path returns the working
//! tree to the base branch through [`BranchWorkflow::with_base_restored`].

use crate::config::FixConfig;
use crate::fix::ecosystems::{FixerRegistry, MavenPropertyIndex};
use crate::fix::traits::{FixContext, FixError, FixOutcome, PackageFixer};
use crate::git::GitManager;
use crate::model::FixVersionInfo;
use crate::traits::{CommandRunner, PullRequest, PullRequestClient};
use std::future::Future;
use tracing::{info, instrument, warn};

/// Prefix shared by every fix branch. Changing it breaks idempotent re-runs.
pub const BRANCH_PREFIX: &str = "fixbot";

pub const PULL_REQUEST_BODY: &str = "This pull request was opened automatically to upgrade a \
dependency with known vulnerabilities to the lowest version that fixes them.";

/// `{prefix}-{ecosystem}-{package}-{version}` with characters git rejects in
/// ref names replaced by `_`.
pub fn fix_branch_name(package: &str, info: &FixVersionInfo) -> String {
    format!(
        "{}-{}-{}-{}",
        BRANCH_PREFIX,
        info.package_type,
        sanitize_ref_component(package),
        sanitize_ref_component(&info.fix_version)
    )
}

fn sanitize_ref_component(name: &str) -> String {
    name.replace("..", "_")
        .chars()
        .map(|c| match c {
            ':' | '~' | '^' | '?' | '*' | '[' | '\\' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub fn commit_title(package: &str, version: &str) -> String {
    format!("[bot] Upgrade {} to {}", package, version)
}

pub struct BranchWorkflow<'a> {
    git: &'a GitManager,
    runner: &'a dyn CommandRunner,
    fixers: &'a FixerRegistry,
    pull_requests: &'a dyn PullRequestClient,
    config: &'a FixConfig,
}

impl<'a> BranchWorkflow<'a> {
    pub fn new(
        git: &'a GitManager,
        runner: &'a dyn CommandRunner,
        fixers: &'a FixerRegistry,
        pull_requests: &'a dyn PullRequestClient,
        config: &'a FixConfig,
    ) -> Self {
        Self {
            git,
            runner,
            fixers,
            pull_requests,
            config,
        }
    }

    /// Runs the whole branch workflow for one package.
    ///
    /// # Errors
    ///
    /// Returns [`FixError`] when any step fails. The working tree is back on
    /// the base branch whenever this returns after the fix branch was
    /// checked out.
    #[instrument(skip(self, info, maven_properties), fields(version = %info.fix_version, ecosystem = %info.package_type))]
    pub async fn fix_package(
        &self,
        package: &str,
        info: FixVersionInfo,
        maven_properties: &MavenPropertyIndex,
    ) -> Result<FixOutcome, FixError> {
        let fixer = self.fixers.resolve(&info.package_type)?;

        let branch = fix_branch_name(package, &info);
        if self.git.branch_exists_on_remote(&branch).await? {
            info!(branch = %branch, "Branch already exists on remote");
            return Ok(FixOutcome::AlreadyExists { branch });
        }

        info!(branch = %branch, "Creating branch");
        self.git.create_branch(&branch, &self.config.base_branch).await?;
        info!(branch = %branch, "Running git checkout");
        self.git.checkout(&branch).await?;

        let ctx = FixContext {
            working_dir: self.git.dir(),
            runner: self.runner,
            maven_properties,
        };
        self.with_base_restored(self.fix_on_branch(fixer, package, &info, &branch, &ctx))
            .await
    }

    async fn fix_on_branch(
        &self,
        fixer: &dyn PackageFixer,
        package: &str,
        info: &FixVersionInfo,
        branch: &str,
        ctx: &FixContext<'_>,
    ) -> Result<FixOutcome, FixError> {
        fixer.apply_fix(package, &info.fix_version, ctx).await?;

        if self.git.is_clean().await? {
            return Err(FixError::NoChanges {
                package: package.to_string(),
                version: info.fix_version.clone(),
            });
        }

        let title = commit_title(package, &info.fix_version);
        info!(branch, "Running git add all & commit");
        self.git.add_all().await?;
        self.git.commit(&title).await?;

        info!(branch, "Pushing fix branch");
        self.git.push(branch).await?;

        info!(branch, "Creating pull request");
        self.pull_requests
            .create_pull_request(&PullRequest {
                owner: self.config.repo_owner.clone(),
                repo: self.config.repo_name.clone(),
                head: branch.to_string(),
                base: self.config.base_branch.clone(),
                title: title.clone(),
                body: PULL_REQUEST_BODY.to_string(),
            })
            .await?;

        Ok(FixOutcome::Opened {
            branch: branch.to_string(),
            title,
        })
    }

    /// Awaits `work`, then discards leftover changes and checks out the base
    /// branch, whatever `work` returned.
    ///
    /// A rollback failure is returned only when `work` succeeded; otherwise
    /// the original error wins and the rollback failure is logged.
    async fn with_base_restored<T, F>(&self, work: F) -> Result<T, FixError>
    where
        F: Future<Output = Result<T, FixError>>,
    {
        let outcome = work.await;

        let base = &self.config.base_branch;
        if let Err(err) = self.git.discard_changes().await {
            warn!(error = %err, "Failed to discard changes on fix branch");
        }
        let restored = self.git.checkout(base).await;

        match (outcome, restored) {
            (outcome, Ok(())) => outcome,
            (Ok(_), Err(source)) => Err(FixError::Rollback {
                branch: base.clone(),
                source,
            }),
            (Err(err), Err(rollback)) => {
                warn!(base = %base, error = %rollback, "Failed to check out base branch");
                Err(err)
            }
        }
    }
}
