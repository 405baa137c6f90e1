//! engine::check
//!
//! Read-only compliance verdict for the branch.
//!
//! The verdict comes from the formatter's sentinel output alone. Evidence
//! (baseline, diff or diffstat body, commit log) is gathered for display
//! and never influences the verdict.

use super::{Engine, EngineError};
use crate::format::{FileRecord, FormatRequest, OutputMode};
use crate::git::CommitInfo;

/// How much of the would-be change to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    #[default]
    Plain,
    Diff,
    Diffstat,
}

impl CheckMode {
    fn output_mode(self) -> OutputMode {
        match self {
            CheckMode::Plain => OutputMode::Check,
            CheckMode::Diff => OutputMode::Diff,
            CheckMode::Diffstat => OutputMode::Diffstat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckOptions {
    pub mode: CheckMode,
    /// Include the branch's commit log in the evidence.
    pub show_commits: bool,
    /// Skip gathering evidence nobody will see.
    pub quiet: bool,
}

/// Human-readable support for a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    /// First commit unique to the branch; `None` without divergence.
    pub baseline: Option<CommitInfo>,
    /// Diff or diffstat text, when requested and non-compliant.
    pub body: Option<String>,
    pub files: Vec<FileRecord>,
    /// `<short id> <summary>` per branch commit, newest first.
    pub commits: Vec<String>,
    /// The formatter's own "nothing to do" line, when compliant.
    pub sentinel: Option<String>,
}

impl Evidence {
    /// Render for the terminal.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        match &self.baseline {
            None => out.push("no commits unique to branch".to_string()),
            Some(commit) => out.push(format!(
                "first branch commit: {} {}",
                commit.oid, commit.summary
            )),
        }
        if let Some(line) = &self.sentinel {
            out.push(line.clone());
        }
        if !self.commits.is_empty() {
            out.push("commits:".to_string());
            out.extend(self.commits.iter().map(|line| format!("  {}", line)));
        }
        if let Some(body) = &self.body {
            let body = body.trim_end();
            if !body.is_empty() {
                out.push(body.to_string());
            }
        }
        out.join("\n")
    }
}

/// Whether the branch's changes are already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceVerdict {
    pub compliant: bool,
    pub evidence: Evidence,
}

impl Engine<'_> {
    /// Check the branch without touching the working tree.
    ///
    /// A branch with no unique commits is compliant.
    pub fn check_compliance(&self, options: &CheckOptions) -> Result<ComplianceVerdict, EngineError> {
        let Some(baseline) = self.resolve_baseline()? else {
            return Ok(ComplianceVerdict {
                compliant: true,
                evidence: Evidence::default(),
            });
        };

        let request = FormatRequest::new(
            options.mode.output_mode(),
            Some(baseline.divergence_point.clone()),
            &self.settings.format,
        );
        let result = self.invoker().invoke(&request)?;
        let compliant = !result.changed;
        tracing::debug!(compliant, mode = ?options.mode, "compliance checked");

        let mut evidence = Evidence {
            baseline: Some(baseline.first_unique),
            sentinel: result.sentinel.map(str::to_string),
            ..Default::default()
        };
        if options.quiet {
            return Ok(ComplianceVerdict { compliant, evidence });
        }

        if options.show_commits {
            evidence.commits = self.vcs.log(&baseline.divergence_point, &baseline.tip)?;
        }
        if !compliant && options.mode != CheckMode::Plain {
            evidence.body = Some(result.raw);
            evidence.files = result.files;
        }

        Ok(ComplianceVerdict { compliant, evidence })
    }
}
