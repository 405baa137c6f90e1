//! git::fake
//!
//! In-memory [`VersionControl`] for unit tests.
//!
//! Models a linear history `oid(1) .. oid(n)` where the first `base`
//! commits are on the upstream and the rest are the branch. Commit `i`
//! records tree `oid(100 + i)`.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use tempfile::TempDir;

use super::{
    CommitInfo, GitError, GitState, NewCommit, ScratchWorktree, Signature, VersionControl,
    WorktreeStatus,
};
use crate::core::types::{BranchName, Oid, RefName};

/// Deterministic object id for test number `n`.
pub fn oid(n: u64) -> Oid {
    Oid::new(format!("{:040x}", n)).unwrap()
}

pub fn signature(name: &str) -> Signature {
    Signature::new(
        name,
        &format!("{}@example.com", name.to_lowercase()),
        DateTime::<FixedOffset>::parse_from_rfc3339("2024-03-01T09:30:00+02:00").unwrap(),
    )
}

pub struct FakeVcs {
    pub branch: Option<BranchName>,
    pub state: GitState,
    pub status: WorktreeStatus,
    pub chain: RefCell<Vec<Oid>>,
    pub commits: RefCell<HashMap<Oid, CommitInfo>>,
    pub revisions: HashMap<String, Oid>,
    pub refs: RefCell<HashMap<String, Oid>>,
    pub remote_head: Option<BranchName>,
    /// Trees handed out by `snapshot_scratch`, in order. When empty the
    /// tree of the last checked-out commit is returned.
    pub snapshots: RefCell<VecDeque<Oid>>,
    pub written: RefCell<Vec<NewCommit>>,
    pub scratch_checkouts: RefCell<Vec<Oid>>,
    pub scratch_removed: Cell<usize>,
    pub head_checkouts: Cell<usize>,
    /// Ref moved behind our back on the next `write_commit`.
    pub interfere: RefCell<Option<(String, Oid)>>,
}

impl FakeVcs {
    /// `base` upstream commits followed by `ahead` branch commits on
    /// `feature`, with `main` naming the upstream tip.
    pub fn linear(base: u64, ahead: u64) -> Self {
        let mut commits = HashMap::new();
        let mut chain = Vec::new();
        for i in 1..=base + ahead {
            let parents = if i == 1 { vec![] } else { vec![oid(i - 1)] };
            commits.insert(
                oid(i),
                CommitInfo {
                    oid: oid(i),
                    tree: oid(100 + i),
                    parents,
                    summary: format!("commit {}", i),
                    message: format!("commit {}\n\nbody {}\n", i, i).into_bytes(),
                    encoding: None,
                    author: signature("Author"),
                    committer: signature("Committer"),
                },
            );
            chain.push(oid(i));
        }

        let tip = oid(base + ahead);
        let mut revisions = HashMap::new();
        revisions.insert("main".to_string(), oid(base));
        let mut refs = HashMap::new();
        refs.insert("refs/heads/feature".to_string(), tip.clone());
        refs.insert("refs/heads/main".to_string(), oid(base));

        Self {
            branch: Some(BranchName::new("feature").unwrap()),
            state: GitState::Clean,
            status: WorktreeStatus::default(),
            chain: RefCell::new(chain),
            commits: RefCell::new(commits),
            revisions,
            refs: RefCell::new(refs),
            remote_head: None,
            snapshots: RefCell::new(VecDeque::new()),
            written: RefCell::new(Vec::new()),
            scratch_checkouts: RefCell::new(Vec::new()),
            scratch_removed: Cell::new(0),
            head_checkouts: Cell::new(0),
            interfere: RefCell::new(None),
        }
    }

    pub fn on_branch(mut self, name: &str) -> Self {
        self.branch = Some(BranchName::new(name).unwrap());
        self
    }

    pub fn detached(mut self) -> Self {
        self.branch = None;
        self
    }

    pub fn with_status(mut self, status: WorktreeStatus) -> Self {
        self.status = status;
        self
    }

    /// Make commit `n` a merge of its parent and `other`.
    pub fn make_merge(&self, n: u64, other: u64) {
        if let Some(info) = self.commits.borrow_mut().get_mut(&oid(n)) {
            info.parents.push(oid(other));
        }
    }

    pub fn ref_value(&self, name: &str) -> Option<Oid> {
        self.refs.borrow().get(name).cloned()
    }

    fn head_ref(&self) -> String {
        match &self.branch {
            Some(b) => format!("refs/heads/{}", b),
            None => "HEAD".to_string(),
        }
    }
}

impl VersionControl for FakeVcs {
    fn work_dir(&self) -> Result<PathBuf, GitError> {
        Ok(PathBuf::from("/repo"))
    }

    fn state(&self) -> GitState {
        self.state.clone()
    }

    fn worktree_status(&self, _include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        Ok(self.status.clone())
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        Ok(self.branch.clone())
    }

    fn head_oid(&self) -> Result<Oid, GitError> {
        if let Some(oid) = self.ref_value(&self.head_ref()) {
            return Ok(oid);
        }
        self.chain
            .borrow()
            .last()
            .cloned()
            .ok_or_else(|| GitError::RefNotFound {
                refname: "HEAD".to_string(),
            })
    }

    fn resolve_revision(&self, revspec: &str) -> Result<Option<Oid>, GitError> {
        Ok(self.revisions.get(revspec).cloned())
    }

    fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        Ok(self.ref_value(refname))
    }

    fn remote_default_branch(&self, _remote: &str) -> Result<Option<BranchName>, GitError> {
        Ok(self.remote_head.clone())
    }

    fn revisions_between(&self, hide: &Oid, tip: &Oid) -> Result<Vec<Oid>, GitError> {
        let commits = self.commits.borrow();
        let mut out = Vec::new();
        let mut cursor = Some(tip.clone());
        while let Some(current) = cursor {
            if &current == hide {
                break;
            }
            let info = commits.get(&current).ok_or_else(|| GitError::ObjectNotFound {
                oid: current.to_string(),
            })?;
            cursor = info.parents.first().cloned();
            out.push(current);
        }
        Ok(out)
    }

    fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        self.commits
            .borrow()
            .get(oid)
            .cloned()
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    fn write_commit(&self, commit: &NewCommit) -> Result<Oid, GitError> {
        if let Some((name, target)) = self.interfere.borrow_mut().take() {
            self.refs.borrow_mut().insert(name, target);
        }
        let mut written = self.written.borrow_mut();
        let new = oid(1000 + written.len() as u64);
        written.push(commit.clone());
        self.commits.borrow_mut().insert(
            new.clone(),
            CommitInfo {
                oid: new.clone(),
                tree: commit.tree.clone(),
                parents: vec![commit.parent.clone()],
                summary: String::from_utf8_lossy(&commit.message)
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string(),
                message: commit.message.clone(),
                encoding: commit.encoding.clone(),
                author: commit.author.clone(),
                committer: commit.committer.clone(),
            },
        );
        Ok(new)
    }

    fn update_ref_cas(
        &self,
        refname: &RefName,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        _message: &str,
    ) -> Result<(), GitError> {
        let mut refs = self.refs.borrow_mut();
        let current = refs.get(refname.as_str());
        if current != expected_old {
            return Err(GitError::CasFailed {
                refname: refname.to_string(),
                expected: expected_old.map_or("<none>".to_string(), Oid::to_string),
                actual: current.map_or("<none>".to_string(), Oid::to_string),
            });
        }
        refs.insert(refname.to_string(), new_oid.clone());
        Ok(())
    }

    fn checkout_head(&self) -> Result<(), GitError> {
        self.head_checkouts.set(self.head_checkouts.get() + 1);
        Ok(())
    }

    fn create_scratch(&self, _at: &Oid) -> Result<ScratchWorktree, GitError> {
        let root = TempDir::new().map_err(|e| GitError::Internal {
            message: e.to_string(),
        })?;
        let path = root.path().join("tree");
        Ok(ScratchWorktree::new(root, path))
    }

    fn checkout_scratch(&self, _scratch: &ScratchWorktree, oid: &Oid) -> Result<(), GitError> {
        self.scratch_checkouts.borrow_mut().push(oid.clone());
        Ok(())
    }

    fn snapshot_scratch(&self, _scratch: &ScratchWorktree) -> Result<Oid, GitError> {
        if let Some(tree) = self.snapshots.borrow_mut().pop_front() {
            return Ok(tree);
        }
        let last = self.scratch_checkouts.borrow().last().cloned();
        let last = last.ok_or_else(|| GitError::Internal {
            message: "snapshot before checkout".to_string(),
        })?;
        Ok(self.commit_info(&last)?.tree)
    }

    fn remove_scratch(&self, _scratch: ScratchWorktree) -> Result<(), GitError> {
        self.scratch_removed.set(self.scratch_removed.get() + 1);
        Ok(())
    }
}
