//! engine::branch
//!
//! Format the branch delta (or the index) in place.
//!
//! Both workflows leave the formatter's edits in the working tree for the
//! user to review and commit; nothing here creates commits.

use super::{Engine, EngineError};
use crate::format::{FormatRequest, FormatResult, OutputMode};

/// What a formatting run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// The branch has no commits of its own.
    NothingToFormat,
    /// The formatter ran and had nothing to change.
    Unchanged,
    /// The formatter changed files. `files` is empty when it did not say
    /// which.
    Formatted { files: Vec<String> },
}

impl From<FormatResult> for FormatOutcome {
    fn from(result: FormatResult) -> Self {
        if result.changed {
            FormatOutcome::Formatted {
                files: result.paths().into_iter().map(str::to_string).collect(),
            }
        } else {
            FormatOutcome::Unchanged
        }
    }
}

impl Engine<'_> {
    /// Format every line the branch changed, relative to its divergence
    /// point.
    ///
    /// # Errors
    ///
    /// - [`crate::format::FormatError::UnstagedChanges`] (wrapped) when the
    ///   working tree has unstaged edits and `allow_unstaged` is false
    /// - formatter and baseline errors
    pub fn format_branch(&self, allow_unstaged: bool) -> Result<FormatOutcome, EngineError> {
        let Some(baseline) = self.resolve_baseline()? else {
            return Ok(FormatOutcome::NothingToFormat);
        };

        let request = FormatRequest::new(
            OutputMode::Apply,
            Some(baseline.divergence_point),
            &self.settings.format,
        )
        .allow_unstaged(allow_unstaged);

        Ok(self.invoker().invoke(&request)?.into())
    }

    /// Format the staged changes only.
    pub fn format_staged(&self, allow_unstaged: bool) -> Result<FormatOutcome, EngineError> {
        let request = FormatRequest::new(OutputMode::Apply, None, &self.settings.format)
            .allow_unstaged(allow_unstaged);

        Ok(self.invoker().invoke(&request)?.into())
    }
}
