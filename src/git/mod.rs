//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and writes
//! flow through this interface. No other module imports `git2` or runs the
//! `git` binary. Only the formatter invoker spawns a process of its own.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Ref resolution and CAS updates
//! - Ancestry walks between the upstream and a branch tip
//! - Commit reading and writing with preserved metadata
//! - Scratch worktrees for replaying history
//! - Status and state detection
//!
//! # Invariants
//!
//! - All ref updates use CAS (compare-and-swap) semantics
//! - Writing a commit never moves a ref
//! - All operations return strong types (Oid, BranchName, RefName)
//!
//! The engine talks to git through the [`VersionControl`] trait so its
//! algorithms can run against an in-memory fake.

mod interface;

#[cfg(test)]
pub(crate) mod fake;

pub use interface::{
    CommitInfo, Git, GitError, GitState, NewCommit, RepoInfo, ScratchWorktree, Signature,
    WorktreeStatus,
};

use crate::core::types::{BranchName, Oid, RefName};

/// The repository operations branchfmt needs.
///
/// [`Git`] is the production implementation.
pub trait VersionControl {
    /// Root of the working tree.
    fn work_dir(&self) -> Result<std::path::PathBuf, GitError>;

    /// In-progress operation, if any.
    fn state(&self) -> GitState;

    /// Working tree summary, untracked files counted only when asked.
    fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError>;

    /// Checked-out branch; `None` when detached.
    fn current_branch(&self) -> Result<Option<BranchName>, GitError>;

    fn head_oid(&self) -> Result<Oid, GitError>;

    /// Resolve a revision expression; `None` when it names nothing.
    fn resolve_revision(&self, revspec: &str) -> Result<Option<Oid>, GitError>;

    /// Resolve a full ref name; `None` when absent.
    fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError>;

    /// Default branch recorded for `remote`.
    fn remote_default_branch(&self, remote: &str) -> Result<Option<BranchName>, GitError>;

    /// Commits reachable from `tip` and not from `hide`, newest first.
    fn revisions_between(&self, hide: &Oid, tip: &Oid) -> Result<Vec<Oid>, GitError>;

    fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError>;

    /// Write a commit object without touching refs.
    fn write_commit(&self, commit: &NewCommit) -> Result<Oid, GitError>;

    /// CAS ref update; `expected_old == None` requires the ref to be absent.
    fn update_ref_cas(
        &self,
        refname: &RefName,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError>;

    /// Force the checkout to match HEAD.
    fn checkout_head(&self) -> Result<(), GitError>;

    fn create_scratch(&self, at: &Oid) -> Result<ScratchWorktree, GitError>;

    fn checkout_scratch(&self, scratch: &ScratchWorktree, oid: &Oid) -> Result<(), GitError>;

    /// Record every tracked modification in the scratch worktree as a tree.
    fn snapshot_scratch(&self, scratch: &ScratchWorktree) -> Result<Oid, GitError>;

    fn remove_scratch(&self, scratch: ScratchWorktree) -> Result<(), GitError>;

    /// One line per commit in `hide..tip`: short id and summary.
    fn log(&self, hide: &Oid, tip: &Oid) -> Result<Vec<String>, GitError> {
        self.revisions_between(hide, tip)?
            .iter()
            .map(|oid| {
                let info = self.commit_info(oid)?;
                Ok(format!("{} {}", oid.short(12), info.summary))
            })
            .collect()
    }
}

impl VersionControl for Git {
    fn work_dir(&self) -> Result<std::path::PathBuf, GitError> {
        Ok(self.info()?.work_dir)
    }

    fn state(&self) -> GitState {
        Git::state(self)
    }

    fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        Git::worktree_status(self, include_untracked)
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        Git::current_branch(self)
    }

    fn head_oid(&self) -> Result<Oid, GitError> {
        Git::head_oid(self)
    }

    fn resolve_revision(&self, revspec: &str) -> Result<Option<Oid>, GitError> {
        Git::resolve_revision(self, revspec)
    }

    fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        Git::try_resolve_ref(self, refname)
    }

    fn remote_default_branch(&self, remote: &str) -> Result<Option<BranchName>, GitError> {
        Git::remote_default_branch(self, remote)
    }

    fn revisions_between(&self, hide: &Oid, tip: &Oid) -> Result<Vec<Oid>, GitError> {
        Git::revisions_between(self, hide, tip)
    }

    fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        Git::commit_info(self, oid)
    }

    fn write_commit(&self, commit: &NewCommit) -> Result<Oid, GitError> {
        Git::write_commit(self, commit)
    }

    fn update_ref_cas(
        &self,
        refname: &RefName,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        Git::update_ref_cas(self, refname, new_oid, expected_old, message)
    }

    fn checkout_head(&self) -> Result<(), GitError> {
        Git::checkout_head(self)
    }

    fn create_scratch(&self, at: &Oid) -> Result<ScratchWorktree, GitError> {
        Git::create_scratch(self, at)
    }

    fn checkout_scratch(&self, scratch: &ScratchWorktree, oid: &Oid) -> Result<(), GitError> {
        Git::checkout_scratch(self, scratch, oid)
    }

    fn snapshot_scratch(&self, scratch: &ScratchWorktree) -> Result<Oid, GitError> {
        Git::snapshot_scratch(self, scratch)
    }

    fn remove_scratch(&self, scratch: ScratchWorktree) -> Result<(), GitError> {
        Git::remove_scratch(self, scratch)
    }
}
