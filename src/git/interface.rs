//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! branchfmt. Reads, ref updates and commit creation go through git2;
//! linked worktree management shells out to the `git` CLI because libgit2
//! cannot add a detached worktree without creating a branch.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CasFailed`]: Compare-and-swap precondition failed
//! - [`GitError::CommandFailed`]: A `git` subprocess exited non-zero
//!
//! # Example
//!
//! ```ignore
//! use branchfmt::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head_oid()?;
//! println!("HEAD is at {}", head.short(7));
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tempfile::TempDir;
use thiserror::Error;

use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Compare-and-swap precondition failed.
    ///
    /// The ref moved between reading it and updating it.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// A `git` subprocess could not be started or exited non-zero.
    #[error("`git {command}` failed: {stderr}")]
    CommandFailed {
        /// Arguments passed to git
        command: String,
        /// Captured error output
        stderr: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn internal(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::internal(err),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to .git directory
    pub git_dir: PathBuf,
    /// Path to working directory
    pub work_dir: PathBuf,
}

/// State of in-progress Git operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitState {
    /// No operation in progress.
    Clean,
    /// Rebase in progress.
    Rebase,
    /// Merge in progress.
    Merge,
    /// Cherry-pick in progress.
    CherryPick,
    /// Revert in progress.
    Revert,
    /// Bisect in progress.
    Bisect,
    /// Apply mailbox in progress.
    ApplyMailbox,
}

impl GitState {
    /// Check if any operation is in progress.
    ///
    /// # Example
    ///
    /// ```
    /// use branchfmt::git::GitState;
    ///
    /// assert!(!GitState::Clean.is_in_progress());
    /// assert!(GitState::Rebase.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    /// Get a human-readable description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Rebase => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files (if requested)
    pub untracked: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Check if the worktree is completely clean (no changes at all).
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }

    /// Check if tracked files carry modifications the index does not have.
    pub fn has_unstaged(&self) -> bool {
        self.unstaged > 0 || self.has_conflicts
    }

    /// Short human description, e.g. "2 staged, 1 unstaged".
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.staged > 0 {
            parts.push(format!("{} staged", self.staged));
        }
        if self.unstaged > 0 {
            parts.push(format!("{} unstaged", self.unstaged));
        }
        if self.has_conflicts {
            parts.push("conflicts".to_string());
        }
        if parts.is_empty() {
            "clean".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Identity and timestamp attached to a commit.
///
/// Name and email are kept as the bytes stored in the commit; they are
/// only UTF-8 when the commit's encoding says so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: Vec<u8>,
    pub email: Vec<u8>,
    /// Time including the original UTC offset.
    pub when: DateTime<FixedOffset>,
}

impl Signature {
    pub fn new(name: &str, email: &str, when: DateTime<FixedOffset>) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            email: email.as_bytes().to_vec(),
            when,
        }
    }

    fn from_git2(sig: &git2::Signature<'_>) -> Self {
        let time = sig.when();
        let offset =
            FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
        let when = DateTime::from_timestamp(time.seconds(), 0)
            .unwrap_or(DateTime::UNIX_EPOCH)
            .with_timezone(&offset);

        Self {
            name: sig.name_bytes().to_vec(),
            email: sig.email_bytes().to_vec(),
            when,
        }
    }

    /// The `author`/`committer` header value: `name <email> secs +hhmm`.
    fn header_value(&self) -> Vec<u8> {
        let offset = self.when.offset().local_minus_utc() / 60;
        let sign = if offset < 0 { '-' } else { '+' };
        let offset = offset.abs();

        let mut value = Vec::with_capacity(self.name.len() + self.email.len() + 24);
        value.extend_from_slice(&self.name);
        value.extend_from_slice(b" <");
        value.extend_from_slice(&self.email);
        value.extend_from_slice(
            format!(
                "> {} {}{:02}{:02}",
                self.when.timestamp(),
                sign,
                offset / 60,
                offset % 60
            )
            .as_bytes(),
        );
        value
    }
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// The tree the commit records
    pub tree: Oid,
    /// Parent commits in order
    pub parents: Vec<Oid>,
    /// First line of the commit message, lossily decoded for display
    pub summary: String,
    /// Full commit message, byte for byte
    pub message: Vec<u8>,
    /// Value of the `encoding` header, if the commit has one
    pub encoding: Option<String>,
    pub author: Signature,
    pub committer: Signature,
}

/// A commit to be written: everything git needs except the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub tree: Oid,
    pub parent: Oid,
    pub author: Signature,
    pub committer: Signature,
    pub message: Vec<u8>,
    pub encoding: Option<String>,
}

impl NewCommit {
    /// The raw commit object, laid out the way git writes it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.message.len() + 256);
        buf.extend_from_slice(format!("tree {}\nparent {}\n", self.tree, self.parent).as_bytes());
        buf.extend_from_slice(b"author ");
        buf.extend_from_slice(&self.author.header_value());
        buf.extend_from_slice(b"\ncommitter ");
        buf.extend_from_slice(&self.committer.header_value());
        buf.push(b'\n');
        if let Some(encoding) = &self.encoding {
            buf.extend_from_slice(format!("encoding {}\n", encoding).as_bytes());
        }
        buf.push(b'\n');
        buf.extend_from_slice(&self.message);
        buf
    }
}

/// A detached linked worktree living in a temporary directory.
///
/// Dropping it deletes the directory; [`Git::remove_scratch`] also
/// unregisters the worktree from the repository.
#[derive(Debug)]
pub struct ScratchWorktree {
    path: PathBuf,
    _root: TempDir,
}

impl ScratchWorktree {
    /// Wrap a checkout at `path` inside the temporary directory `root`.
    pub fn new(root: TempDir, path: PathBuf) -> Self {
        Self { path, _root: root }
    }

    /// Root of the scratch checkout.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2` or runs the `git` binary.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Get repository information (git_dir and work_dir paths).
    pub fn info(&self) -> Result<RepoInfo, GitError> {
        let git_dir = self.repo.path().to_path_buf();
        let work_dir = self.repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();

        Ok(RepoInfo { git_dir, work_dir })
    }

    /// Directory shared by all worktrees (where the repo config lives).
    pub fn common_dir(&self) -> &Path {
        self.repo.commondir()
    }

    // =========================================================================
    // State Detection
    // =========================================================================

    /// Get the current Git state (rebase, merge, etc.).
    pub fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => GitState::Rebase,
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    // =========================================================================
    // Working Tree Status
    // =========================================================================

    /// Get working tree status summary.
    ///
    /// If `include_untracked` is false, untracked files are not counted.
    pub fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(include_untracked)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(GitError::internal)?;

        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }

            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a ref to its target commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let oid = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve any revision expression (`origin/main`, `HEAD~2`, an id) to
    /// a commit, returning None if it names nothing.
    pub fn resolve_revision(&self, revspec: &str) -> Result<Option<Oid>, GitError> {
        let object = match self.repo.revparse_single(revspec) {
            Ok(object) => object,
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::NotFound
                        | git2::ErrorCode::InvalidSpec
                        | git2::ErrorCode::Ambiguous
                ) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(GitError::from_git2(e, revspec)),
        };

        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, revspec))?;
        Ok(Some(Oid::new(commit.id().to_string())?))
    }

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (new repository)
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None)
    }

    /// Branch the remote's `HEAD` points at (`refs/remotes/<remote>/HEAD`).
    ///
    /// Returns `None` when the remote has no recorded default branch.
    pub fn remote_default_branch(&self, remote: &str) -> Result<Option<BranchName>, GitError> {
        let head_ref = format!("refs/remotes/{}/HEAD", remote);
        let reference = match self.repo.find_reference(&head_ref) {
            Ok(r) => r,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, &head_ref)),
        };

        let prefix = format!("refs/remotes/{}/", remote);
        let branch = reference
            .symbolic_target()
            .and_then(|target| target.strip_prefix(&prefix))
            .map(BranchName::new)
            .transpose()?;
        Ok(branch)
    }

    // =========================================================================
    // CAS Ref Operations
    // =========================================================================

    /// Update a ref with compare-and-swap semantics.
    ///
    /// The update only succeeds if the ref's current value matches `expected_old`.
    /// If `expected_old` is `None`, the ref must not exist (create case).
    ///
    /// # Errors
    ///
    /// - [`GitError::CasFailed`] if the current value doesn't match expected
    pub fn update_ref_cas(
        &self,
        refname: &RefName,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        let current = self.try_resolve_ref(refname.as_str())?;

        match (expected_old, current.as_ref()) {
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
            (Some(expected), None) => {
                return Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected.to_string(),
                    actual: "<none>".to_string(),
                });
            }
            (None, Some(actual)) => {
                return Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: "<none>".to_string(),
                    actual: actual.to_string(),
                });
            }
            _ => {}
        }

        let oid = to_git2_oid(new_oid)?;
        self.repo
            .reference(refname.as_str(), oid, true, message)
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;

        Ok(())
    }

    /// Force the working tree and index to match HEAD.
    ///
    /// Used after the checked-out branch ref was moved; callers must have
    /// verified the worktree was clean beforehand.
    pub fn checkout_head(&self) -> Result<(), GitError> {
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_head(Some(&mut checkout))
            .map_err(GitError::internal)
    }

    // =========================================================================
    // Ancestry Queries
    // =========================================================================

    /// Commits reachable from `tip` but not from `hide`, newest first.
    ///
    /// Equivalent to `git rev-list <tip> ^<hide>`.
    pub fn revisions_between(&self, hide: &Oid, tip: &Oid) -> Result<Vec<Oid>, GitError> {
        let mut revwalk = self.repo.revwalk().map_err(GitError::internal)?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
            .map_err(GitError::internal)?;
        revwalk.push(to_git2_oid(tip)?).map_err(GitError::internal)?;
        revwalk.hide(to_git2_oid(hide)?).map_err(GitError::internal)?;

        revwalk
            .map(|oid| {
                let oid = oid.map_err(GitError::internal)?;
                Ok(Oid::new(oid.to_string())?)
            })
            .collect()
    }

    // =========================================================================
    // Commit Information
    // =========================================================================

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let parents = commit
            .parent_ids()
            .map(|id| Oid::new(id.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        let info = CommitInfo {
            oid: oid.clone(),
            tree: Oid::new(commit.tree_id().to_string())?,
            parents,
            summary: String::from_utf8_lossy(commit.summary_bytes().unwrap_or_default())
                .into_owned(),
            message: commit.message_raw_bytes().to_vec(),
            encoding: commit.message_encoding().map(str::to_string),
            author: Signature::from_git2(&commit.author()),
            committer: Signature::from_git2(&commit.committer()),
        };
        Ok(info)
    }

    /// Write a commit object without moving any ref.
    ///
    /// The object is assembled from raw bytes so messages and identities in
    /// legacy encodings, and the `encoding` header, survive unchanged.
    pub fn write_commit(&self, commit: &NewCommit) -> Result<Oid, GitError> {
        self.repo
            .find_tree(to_git2_oid(&commit.tree)?)
            .map_err(|e| GitError::from_git2(e, commit.tree.as_str()))?;
        self.repo
            .find_commit(to_git2_oid(&commit.parent)?)
            .map_err(|e| GitError::from_git2(e, commit.parent.as_str()))?;

        let odb = self.repo.odb().map_err(GitError::internal)?;
        let oid = odb
            .write(git2::ObjectType::Commit, &commit.to_bytes())
            .map_err(GitError::internal)?;

        Ok(Oid::new(oid.to_string())?)
    }

    // =========================================================================
    // Scratch Worktrees
    // =========================================================================

    /// Add a detached linked worktree checked out at `at`.
    pub fn create_scratch(&self, at: &Oid) -> Result<ScratchWorktree, GitError> {
        let root = tempfile::Builder::new()
            .prefix("branchfmt-")
            .tempdir()
            .map_err(|e| GitError::Internal {
                message: format!("cannot create scratch directory: {}", e),
            })?;
        let path = root.path().join("tree");
        let path_arg = path.to_string_lossy().into_owned();

        self.run_git(&["worktree", "add", "--detach", &path_arg, at.as_str()])?;
        tracing::debug!(path = %path.display(), at = %at.short(7), "scratch worktree added");

        Ok(ScratchWorktree::new(root, path))
    }

    /// Force-checkout `oid` (index and files) in the scratch worktree.
    pub fn checkout_scratch(&self, scratch: &ScratchWorktree, oid: &Oid) -> Result<(), GitError> {
        let repo = git2::Repository::open(scratch.path()).map_err(GitError::internal)?;
        let target = to_git2_oid(oid)?;
        let commit = repo
            .find_commit(target)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(GitError::internal)?;
        repo.set_head_detached(target).map_err(GitError::internal)?;
        Ok(())
    }

    /// Stage every tracked modification in the scratch worktree and return
    /// the resulting tree.
    pub fn snapshot_scratch(&self, scratch: &ScratchWorktree) -> Result<Oid, GitError> {
        let repo = git2::Repository::open(scratch.path()).map_err(GitError::internal)?;
        let mut index = repo.index().map_err(GitError::internal)?;
        index
            .update_all(["*"].iter(), None)
            .map_err(GitError::internal)?;
        index.write().map_err(GitError::internal)?;
        let tree = index.write_tree().map_err(GitError::internal)?;
        Ok(Oid::new(tree.to_string())?)
    }

    /// Unregister and delete a scratch worktree.
    pub fn remove_scratch(&self, scratch: ScratchWorktree) -> Result<(), GitError> {
        let path_arg = scratch.path().to_string_lossy().into_owned();
        let removed = self.run_git(&["worktree", "remove", "--force", &path_arg]);
        drop(scratch);
        if let Err(err) = removed {
            // The directory is gone either way; drop the stale registration.
            tracing::debug!(error = %err, "worktree remove failed, pruning");
            self.run_git(&["worktree", "prune"])?;
        }
        Ok(())
    }

    /// Run the git CLI in the working directory, capturing all output.
    fn run_git(&self, args: &[&str]) -> Result<String, GitError> {
        let work_dir = self.repo.workdir().ok_or(GitError::BareRepo)?;
        let output = Command::new("git")
            .args(args)
            .current_dir(work_dir)
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: args.join(" "),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}
