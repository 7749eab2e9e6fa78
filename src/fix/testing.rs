//! In-memory collaborators for unit tests.
//!
//! [`ScriptedRunner`] plays git and the package managers: it keeps track of
//! the checked-out branch, local and remote branches and whether the tree
//! holds modified or untracked files, and fails any command whose text starts
//! with a registered prefix. Calls are recorded unredacted.

use crate::model::ScanReport;
use crate::traits::{
    CommandError, CommandOutput, CommandRunner, PullRequest, PullRequestClient, PullRequestError,
    ScanError, Scanner, UsageReporter,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct RepoState {
    current: String,
    local_branches: BTreeSet<String>,
    remote_branches: BTreeSet<String>,
    remote_url: String,
    dirty: bool,
    untracked: bool,
    tools_change_tree: bool,
    tools_add_untracked: bool,
    commits: Vec<(String, String)>,
    calls: Vec<String>,
    failures: Vec<String>,
}

pub struct ScriptedRunner {
    state: Mutex<RepoState>,
}

impl ScriptedRunner {
    pub fn new(base_branch: &str) -> Self {
        Self {
            state: Mutex::new(RepoState {
                current: base_branch.to_string(),
                local_branches: BTreeSet::from([base_branch.to_string()]),
                remote_url: "file:///remote.git".to_string(),
                tools_change_tree: true,
                ..RepoState::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RepoState> {
        self.state.lock().unwrap()
    }

    pub fn fail_on(&self, prefix: &str) {
        self.state().failures.push(prefix.to_string());
    }

    /// Package-manager commands succeed without touching the tree.
    pub fn leave_tree_clean(&self) {
        let mut state = self.state();
        state.tools_change_tree = false;
        state.tools_add_untracked = false;
    }

    /// Package-manager commands also leave an untracked `go.sum` behind.
    pub fn leave_untracked_files(&self) {
        self.state().tools_add_untracked = true;
    }

    pub fn add_remote_branch(&self, branch: &str) {
        self.state().remote_branches.insert(branch.to_string());
    }

    pub fn set_remote_url(&self, url: &str) {
        self.state().remote_url = url.to_string();
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.state().dirty = dirty;
    }

    pub fn set_untracked(&self, untracked: bool) {
        self.state().untracked = untracked;
    }

    /// Modified or untracked files are present.
    pub fn is_dirty(&self) -> bool {
        let state = self.state();
        state.dirty || state.untracked
    }

    pub fn current_branch(&self) -> String {
        self.state().current.clone()
    }

    pub fn remote_branches(&self) -> Vec<String> {
        self.state().remote_branches.iter().cloned().collect()
    }

    /// `(branch, message)` of every commit made.
    pub fn commits(&self) -> Vec<(String, String)> {
        self.state().commits.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

fn failed(command: &str, output: &str) -> CommandError {
    CommandError::Failed {
        command: command.to_string(),
        status: "exit status: 1".to_string(),
        output: output.to_string(),
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String], _dir: &Path) -> Result<CommandOutput, CommandError> {
        let command = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let mut state = self.state();
        state.calls.push(command.clone());
        if state.failures.iter().any(|prefix| command.starts_with(prefix.as_str())) {
            return Err(failed(&command, &format!("fatal: {} failed", command)));
        }

        let mut stdout = String::new();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match (program, args.as_slice()) {
            ("git", ["ls-remote", "--heads", _, branch]) => {
                if state.remote_branches.contains(*branch) {
                    stdout = format!("4b825dc642cb6eb9a060e54bf8d69288fbee4904\trefs/heads/{}\n", branch);
                }
            }
            ("git", ["branch", "--force", branch, _]) => {
                state.local_branches.insert(branch.to_string());
            }
            ("git", ["checkout", branch]) => {
                if !state.local_branches.contains(*branch) {
                    return Err(failed(&command, "error: pathspec did not match"));
                }
                state.current = branch.to_string();
            }
            ("git", ["status", "--porcelain"]) => {
                if state.dirty {
                    stdout.push_str(" M go.mod\n");
                }
                if state.untracked {
                    stdout.push_str("?? go.sum\n");
                }
            }
            ("git", ["commit", "-m", message]) => {
                if !state.dirty && !state.untracked {
                    return Err(failed(&command, "nothing to commit, working tree clean"));
                }
                let branch = state.current.clone();
                state.commits.push((branch, message.to_string()));
                state.dirty = false;
                state.untracked = false;
            }
            ("git", ["reset", "--hard"]) => state.dirty = false,
            ("git", ["clean", "-fd"]) => state.untracked = false,
            ("git", ["remote", "get-url", _]) => stdout = format!("{}\n", state.remote_url),
            ("git", ["push", _, branch]) => {
                state.remote_branches.insert(branch.to_string());
            }
            ("git", _) => {}
            _ => {
                if state.tools_change_tree {
                    state.dirty = true;
                }
                if state.tools_add_untracked {
                    state.untracked = true;
                }
            }
        }
        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

#[derive(Default)]
pub struct RecordingPullRequestClient {
    requests: Mutex<Vec<PullRequest>>,
    reject: bool,
}

impl RecordingPullRequestClient {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<PullRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestClient for RecordingPullRequestClient {
    async fn create_pull_request(&self, request: &PullRequest) -> Result<(), PullRequestError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.reject {
            return Err(PullRequestError::Rejected {
                status: 422,
                body: "Validation Failed".to_string(),
            });
        }
        Ok(())
    }
}

pub struct StaticScanner {
    report: Option<ScanReport>,
}

impl StaticScanner {
    pub fn new(report: ScanReport) -> Self {
        Self { report: Some(report) }
    }

    pub fn failing() -> Self {
        Self { report: None }
    }
}

#[async_trait]
impl Scanner for StaticScanner {
    async fn scan(&self) -> Result<ScanReport, ScanError> {
        self.report
            .clone()
            .ok_or_else(|| ScanError::Service("scanner unavailable".to_string()))
    }
}

#[derive(Default)]
pub struct CountingUsageReporter {
    reports: AtomicUsize,
}

impl CountingUsageReporter {
    pub fn count(&self) -> usize {
        self.reports.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageReporter for CountingUsageReporter {
    async fn report_usage(&self, _command: &str) {
        self.reports.fetch_add(1, Ordering::SeqCst);
    }
}
