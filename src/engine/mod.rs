//! engine
//!
//! The branch-scoped formatting workflows.
//!
//! # Architecture
//!
//! Every workflow composes the same two pieces:
//!
//! ```text
//! resolve_baseline -> FormatRequest -> Invoker -> FormatResult
//! ```
//!
//! - [`baseline`]: where the branch diverged from its upstream
//! - [`branch`]: format the branch (or the index) and leave the result
//!   unstaged
//! - [`check`]: read-only compliance verdict with evidence
//! - [`rewrite`]: replay every branch commit through the formatter
//!
//! The engine never prints. It talks to git only through
//! [`VersionControl`] and to the formatter only through
//! [`FormatterProcess`], and all settings arrive in [`Settings`].
//!
//! # Invariants
//!
//! - The formatter always runs against the divergence point, never against
//!   the moving upstream tip
//! - A branch with no unique commits is "nothing to do" everywhere
//! - History rewrites move the branch ref only after every commit was
//!   rewritten

pub mod baseline;
pub mod branch;
pub mod check;
pub mod rewrite;

pub use baseline::Baseline;
pub use branch::FormatOutcome;
pub use check::{CheckMode, CheckOptions, ComplianceVerdict, Evidence};
pub use rewrite::{RewriteOutcome, RewritePlan, RewriteState};

use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::types::{BranchName, RefName};
use crate::format::{Extensions, FormatError, FormatOptions, FormatterProcess, Invoker, StyleSource};
use crate::git::{GitError, GitState, VersionControl};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
}

impl Context {
    /// Directory commands run in.
    pub fn work_dir(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// Everything the engine needs to know besides the repository itself.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Protected default branch.
    pub trunk: BranchName,
    /// Revisions tried in order to find the upstream tip.
    pub upstream_candidates: Vec<String>,
    pub format: FormatOptions,
}

impl Settings {
    /// Resolve settings from configuration, asking the repository for
    /// anything that is auto-detected.
    ///
    /// The upstream is the configured `upstream` if set. Otherwise the
    /// candidates are the remote's default branch, `<remote>/<trunk>` and
    /// the local `<trunk>`, in that order.
    pub fn resolve(config: &Config, vcs: &dyn VersionControl) -> Result<Self, EngineError> {
        let remote = config.remote();
        let remote_head = vcs.remote_default_branch(remote)?;

        let trunk = match config.trunk() {
            Some(name) => BranchName::new(name)
                .map_err(|e| EngineError::InvalidSetting(e.to_string()))?,
            None => detect_trunk(vcs, remote_head.as_ref())?,
        };

        let upstream_candidates = match config.upstream() {
            Some(upstream) => vec![upstream.to_string()],
            None => {
                let tracking = |branch: &BranchName| {
                    RefName::for_remote(remote, branch)
                        .map(|r| r.to_string())
                        .map_err(|e| EngineError::InvalidSetting(e.to_string()))
                };
                let mut candidates = Vec::new();
                if let Some(head) = &remote_head {
                    candidates.push(tracking(head)?);
                }
                let trunk_tracking = tracking(&trunk)?;
                if !candidates.contains(&trunk_tracking) {
                    candidates.push(trunk_tracking);
                }
                candidates.push(RefName::for_branch(&trunk).to_string());
                candidates
            }
        };

        let format = FormatOptions {
            style: StyleSource::parse(&config.style()),
            extensions: Extensions::new(config.extensions()).map_err(EngineError::InvalidSetting)?,
        };

        tracing::debug!(%trunk, ?upstream_candidates, style = %format.style, extensions = %format.extensions, "settings resolved");

        Ok(Self {
            trunk,
            upstream_candidates,
            format,
        })
    }
}

/// Trunk from the remote's HEAD, else the first of `main`/`master` that
/// exists locally, else `main`.
fn detect_trunk(
    vcs: &dyn VersionControl,
    remote_head: Option<&BranchName>,
) -> Result<BranchName, EngineError> {
    if let Some(head) = remote_head {
        return Ok(head.clone());
    }
    for name in ["main", "master"] {
        if vcs.try_resolve_ref(&format!("refs/heads/{}", name))?.is_some() {
            return BranchName::new(name).map_err(|e| EngineError::InvalidSetting(e.to_string()));
        }
    }
    BranchName::new("main").map_err(|e| EngineError::InvalidSetting(e.to_string()))
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("HEAD is detached")]
    DetachedHead,

    #[error("refusing to rewrite the protected branch '{branch}'")]
    ProtectedBranch { branch: String },

    #[error("working tree is not clean ({details})")]
    DirtyWorktree { details: String },

    #[error("a {operation} is in progress")]
    OperationInProgress { operation: GitState },

    #[error("upstream not found (tried {upstream})")]
    UpstreamNotFound { upstream: String },

    #[error("first commit unique to the branch ({commit}) has no parent to compare against")]
    RootBaseline { commit: String },

    #[error("commit {commit} is a merge; branches with merges cannot be rewritten")]
    MergeCommit { commit: String },

    #[error("branch changes are not formatted")]
    NonCompliant,

    #[error("failed to rewrite commit {position}/{total} ({commit})")]
    Rewrite {
        commit: String,
        position: usize,
        total: usize,
        #[source]
        source: Box<EngineError>,
    },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Git(#[from] GitError),
}

impl EngineError {
    /// A command the user can run to get past this error, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            EngineError::DetachedHead => Some("check out a branch with `git switch <branch>`".into()),
            EngineError::ProtectedBranch { .. } => Some(
                "switch to a feature branch, or set `trunk` in .git/branchfmt/config.toml".into(),
            ),
            EngineError::DirtyWorktree { .. } => {
                Some("commit or stash your changes first".into())
            }
            EngineError::OperationInProgress { operation } => {
                Some(format!("finish or abort the {} first", operation))
            }
            EngineError::UpstreamNotFound { .. } => Some(
                "fetch the remote, or set `upstream` in .git/branchfmt/config.toml".into(),
            ),
            EngineError::MergeCommit { .. } => {
                Some("use `branchfmt branch` and commit the result instead".into())
            }
            EngineError::NonCompliant => Some(
                "run `branchfmt branch` and commit the result, or `branchfmt rewrite-branch` to fix each commit"
                    .into(),
            ),
            EngineError::Rewrite { source, .. } => source.hint(),
            EngineError::Format(err) => format_hint(err),
            EngineError::Git(GitError::CasFailed { .. }) => {
                Some("the branch moved while branchfmt was running; run it again".into())
            }
            _ => None,
        }
    }
}

/// Remedy for a formatter error.
pub fn format_hint(err: &FormatError) -> Option<String> {
    match err {
        FormatError::UnstagedChanges { .. } => {
            Some("stage or stash your changes, or pass --force".into())
        }
        FormatError::Spawn { .. } | FormatError::ToolFailed { .. } => Some(
            "check that git-clang-format works, or set `binary` in .git/branchfmt/config.toml"
                .into(),
        ),
        FormatError::Git(_) => None,
    }
}

/// Runs the workflows against one repository.
pub struct Engine<'a> {
    vcs: &'a dyn VersionControl,
    formatter: &'a dyn FormatterProcess,
    settings: &'a Settings,
    workdir: PathBuf,
}

impl<'a> Engine<'a> {
    pub fn new(
        vcs: &'a dyn VersionControl,
        formatter: &'a dyn FormatterProcess,
        settings: &'a Settings,
    ) -> Result<Self, EngineError> {
        let workdir = vcs.work_dir()?;
        Ok(Self {
            vcs,
            formatter,
            settings,
            workdir,
        })
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Invoker running in the main working tree.
    fn invoker(&self) -> Invoker<'a> {
        self.invoker_in(&self.workdir)
    }

    fn invoker_in(&self, cwd: &Path) -> Invoker<'a> {
        Invoker::new(self.vcs, self.formatter, cwd)
    }
}
