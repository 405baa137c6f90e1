//! engine::baseline
//!
//! Where the current branch left its upstream.
//!
//! The baseline is computed fresh on every invocation: walk from HEAD,
//! hiding everything reachable from the upstream tip, and take the oldest
//! commit that remains. Its parent is the divergence point, which stays
//! fixed even as the upstream moves on.

use super::{Engine, EngineError};
use crate::core::types::Oid;
use crate::git::CommitInfo;

/// The first commit unique to the branch and the commit it was built on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub first_unique: CommitInfo,
    /// Parent of `first_unique`; reachable from the upstream tip.
    pub divergence_point: Oid,
    /// Every commit unique to the branch, newest first.
    pub commits: Vec<Oid>,
    /// HEAD at the time of resolution.
    pub tip: Oid,
}

impl Engine<'_> {
    /// Resolve the upstream tip from the configured candidates.
    pub fn upstream_tip(&self) -> Result<Oid, EngineError> {
        for candidate in &self.settings.upstream_candidates {
            if let Some(oid) = self.vcs.resolve_revision(candidate)? {
                tracing::debug!(upstream = %candidate, tip = %oid.short(12), "upstream resolved");
                return Ok(oid);
            }
        }
        Err(EngineError::UpstreamNotFound {
            upstream: self.settings.upstream_candidates.join(", "),
        })
    }

    /// Find the branch baseline.
    ///
    /// Returns `Ok(None)` when HEAD has no commits the upstream lacks.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UpstreamNotFound`] if no upstream candidate resolves
    /// - [`EngineError::RootBaseline`] if the oldest unique commit has no
    ///   parent
    pub fn resolve_baseline(&self) -> Result<Option<Baseline>, EngineError> {
        let upstream = self.upstream_tip()?;
        let tip = self.vcs.head_oid()?;
        let commits = self.vcs.revisions_between(&upstream, &tip)?;

        let Some(oldest) = commits.last() else {
            tracing::debug!(head = %tip.short(12), "no commits unique to branch");
            return Ok(None);
        };

        let first_unique = self.vcs.commit_info(oldest)?;
        let divergence_point =
            first_unique
                .parents
                .first()
                .cloned()
                .ok_or_else(|| EngineError::RootBaseline {
                    commit: oldest.to_string(),
                })?;

        tracing::debug!(
            first_unique = %first_unique.oid.short(12),
            divergence_point = %divergence_point.short(12),
            commits = commits.len(),
            "baseline resolved"
        );

        Ok(Some(Baseline {
            first_unique,
            divergence_point,
            commits,
            tip,
        }))
    }
}
