//! engine::rewrite
//!
//! Format every commit on the branch, rewriting history.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Checking -> AlreadyCompliant
//!                  -> Rewriting -> Done
//!      (any failure) -> Aborted
//! ```
//!
//! Commits are replayed oldest first in a detached scratch worktree. Each
//! original commit is checked out there, formatted against the divergence
//! point, snapshotted, and recommitted on top of the previous rewritten
//! commit with its original author, committer and message. The branch ref
//! moves only after the whole fold succeeded, with compare-and-swap from
//! the tip that was read at the start. The old tip is kept under
//! `refs/branchfmt/original/<branch>`.
//!
//! Rewriting is idempotent: formatted content yields the same trees, and the
//! same tree, parent and metadata yield the same commit id.

use std::fmt;

use super::check::CheckOptions;
use super::{Baseline, Engine, EngineError};
use crate::core::types::{Oid, RefName};
use crate::format::{FormatRequest, Invoker, OutputMode};
use crate::git::{CommitInfo, NewCommit, ScratchWorktree};

/// Where a rewrite is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteState {
    Idle,
    Checking,
    AlreadyCompliant,
    Rewriting,
    Done,
    Aborted,
}

impl fmt::Display for RewriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RewriteState::Idle => "idle",
            RewriteState::Checking => "checking",
            RewriteState::AlreadyCompliant => "already-compliant",
            RewriteState::Rewriting => "rewriting",
            RewriteState::Done => "done",
            RewriteState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// The commits to replay, oldest first, and the commit they land on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    /// Divergence point; never rewritten.
    pub onto: Oid,
    pub commits: Vec<CommitInfo>,
}

impl RewritePlan {
    /// Build a plan from a baseline, refusing merge commits.
    pub fn build(engine: &Engine<'_>, baseline: &Baseline) -> Result<Self, EngineError> {
        let commits = baseline
            .commits
            .iter()
            .rev()
            .map(|oid| {
                let info = engine.vcs.commit_info(oid)?;
                if info.parents.len() > 1 {
                    return Err(EngineError::MergeCommit {
                        commit: oid.to_string(),
                    });
                }
                Ok(info)
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        Ok(Self {
            onto: baseline.divergence_point.clone(),
            commits,
        })
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// The commit replacing `original`: the formatted tree on the new parent,
/// everything else carried over.
pub fn replay_commit(original: &CommitInfo, tree: Oid, parent: Oid) -> NewCommit {
    NewCommit {
        tree,
        parent,
        author: original.author.clone(),
        committer: original.committer.clone(),
        message: original.message.clone(),
        encoding: original.encoding.clone(),
    }
}

/// What a rewrite did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// `AlreadyCompliant` or `Done`.
    pub state: RewriteState,
    /// Number of commits replayed.
    pub rewritten: usize,
    pub old_tip: Option<Oid>,
    pub new_tip: Option<Oid>,
    /// Ref holding the pre-rewrite tip, when the branch moved.
    pub backup: Option<RefName>,
}

impl RewriteOutcome {
    fn compliant() -> Self {
        Self {
            state: RewriteState::AlreadyCompliant,
            rewritten: 0,
            old_tip: None,
            new_tip: None,
            backup: None,
        }
    }

    /// Whether the branch ref was moved.
    pub fn moved(&self) -> bool {
        self.backup.is_some()
    }
}

struct Machine {
    state: RewriteState,
}

impl Machine {
    fn advance(&mut self, next: RewriteState) {
        tracing::debug!(from = %self.state, to = %next, "rewrite state");
        self.state = next;
    }
}

impl Engine<'_> {
    /// Rewrite every commit on the current branch so each one is formatted.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DetachedHead`], [`EngineError::ProtectedBranch`],
    ///   [`EngineError::OperationInProgress`], [`EngineError::DirtyWorktree`]
    ///   before anything runs
    /// - [`EngineError::MergeCommit`] when the branch contains a merge
    /// - [`EngineError::Rewrite`] naming the commit whose replay failed; the
    ///   branch is left untouched
    pub fn rewrite_history(&self) -> Result<RewriteOutcome, EngineError> {
        let mut machine = Machine {
            state: RewriteState::Idle,
        };
        let result = self.run_rewrite(&mut machine);
        if let Err(err) = &result {
            tracing::debug!(error = %err, "rewrite failed");
            machine.advance(RewriteState::Aborted);
        }
        result
    }

    fn run_rewrite(&self, machine: &mut Machine) -> Result<RewriteOutcome, EngineError> {
        let branch = self
            .vcs
            .current_branch()?
            .ok_or(EngineError::DetachedHead)?;
        if branch == self.settings.trunk {
            return Err(EngineError::ProtectedBranch {
                branch: branch.to_string(),
            });
        }
        let state = self.vcs.state();
        if state.is_in_progress() {
            return Err(EngineError::OperationInProgress { operation: state });
        }
        let status = self.vcs.worktree_status(false)?;
        if !status.is_clean() {
            return Err(EngineError::DirtyWorktree {
                details: status.describe(),
            });
        }

        machine.advance(RewriteState::Checking);
        let verdict = self.check_compliance(&CheckOptions {
            quiet: true,
            ..Default::default()
        })?;
        let baseline = match self.resolve_baseline()? {
            Some(baseline) if !verdict.compliant => baseline,
            _ => {
                machine.advance(RewriteState::AlreadyCompliant);
                return Ok(RewriteOutcome::compliant());
            }
        };

        machine.advance(RewriteState::Rewriting);
        let plan = RewritePlan::build(self, &baseline)?;
        let old_tip = baseline.tip;
        let new_tip = self.fold_plan(&plan)?;

        let branch_ref = RefName::for_branch(&branch);
        let backup = if new_tip == old_tip {
            None
        } else {
            let backup = RefName::for_backup(&branch);
            let previous = self.vcs.try_resolve_ref(backup.as_str())?;
            self.vcs.update_ref_cas(
                &backup,
                &old_tip,
                previous.as_ref(),
                "branchfmt: backup before rewrite-branch",
            )?;
            self.vcs.update_ref_cas(
                &branch_ref,
                &new_tip,
                Some(&old_tip),
                "branchfmt: rewrite-branch",
            )?;
            self.vcs.checkout_head()?;
            Some(backup)
        };

        tracing::debug!(%branch, old = %old_tip.short(12), new = %new_tip.short(12), "branch rewritten");
        machine.advance(RewriteState::Done);

        Ok(RewriteOutcome {
            state: RewriteState::Done,
            rewritten: plan.len(),
            old_tip: Some(old_tip),
            new_tip: Some(new_tip),
            backup,
        })
    }

    /// Replay the plan in a scratch worktree, returning the new tip.
    ///
    /// The scratch worktree is removed whether or not the fold succeeds.
    fn fold_plan(&self, plan: &RewritePlan) -> Result<Oid, EngineError> {
        let scratch = self.vcs.create_scratch(&plan.onto)?;
        let folded = self.replay_all(plan, &scratch);
        if let Err(err) = self.vcs.remove_scratch(scratch) {
            tracing::warn!(error = %err, "failed to remove scratch worktree");
        }
        folded
    }

    fn replay_all(&self, plan: &RewritePlan, scratch: &ScratchWorktree) -> Result<Oid, EngineError> {
        let invoker = self.invoker_in(scratch.path());
        let request = FormatRequest::new(
            OutputMode::Apply,
            Some(plan.onto.clone()),
            &self.settings.format,
        )
        .allow_unstaged(true);
        let total = plan.len();

        plan.commits
            .iter()
            .enumerate()
            .try_fold(plan.onto.clone(), |parent, (i, original)| {
                self.replay_one(&invoker, &request, scratch, original, parent)
                    .map_err(|err| EngineError::Rewrite {
                        commit: original.oid.short(12).to_string(),
                        position: i + 1,
                        total,
                        source: Box::new(err),
                    })
            })
    }

    fn replay_one(
        &self,
        invoker: &Invoker<'_>,
        request: &FormatRequest,
        scratch: &ScratchWorktree,
        original: &CommitInfo,
        parent: Oid,
    ) -> Result<Oid, EngineError> {
        self.vcs.checkout_scratch(scratch, &original.oid)?;
        let result = invoker.invoke(request)?;
        let tree = if result.changed {
            self.vcs.snapshot_scratch(scratch)?
        } else {
            original.tree.clone()
        };

        let new = self.vcs.write_commit(&replay_commit(original, tree, parent))?;
        tracing::debug!(
            original = %original.oid.short(12),
            rewritten = %new.short(12),
            formatted = result.changed,
            "commit replayed"
        );
        Ok(new)
    }
}
