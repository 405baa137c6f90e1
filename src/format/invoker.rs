//! format::invoker
//!
//! Runs the external formatter.
//!
//! # Architecture
//!
//! [`Invoker`] owns the policy (the unstaged-changes guard, exit status
//! interpretation, result classification). [`FormatterProcess`] owns the
//! mechanics of starting a program and capturing its output, so tests can
//! swap in canned output.
//!
//! Output is always captured completely through pipes before it is
//! inspected.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use super::{FormatRequest, FormatResult};
use crate::git::{GitError, VersionControl};

/// Errors from running the formatter.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Apply mode would touch files with modifications outside the index.
    #[error("working tree has unstaged changes ({count} file(s))")]
    UnstagedChanges { count: usize },

    /// The formatter could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The formatter ran and failed.
    #[error("formatter exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn status_text(&self) -> String {
        match self.status {
            Some(code) => format!("status {}", code),
            None => "a signal".to_string(),
        }
    }
}

/// Something that can run the formatter with arguments in a directory.
pub trait FormatterProcess {
    fn run(&self, args: &[String], cwd: &Path) -> Result<ToolOutput, FormatError>;
}

/// The real formatter, `git clang-format` unless configured otherwise.
#[derive(Debug, Clone)]
pub struct GitClangFormat {
    program: String,
    base_args: Vec<String>,
}

impl GitClangFormat {
    /// Build from command words such as `["git", "clang-format"]`.
    ///
    /// Returns `None` when `words` is empty.
    pub fn from_words(words: &[String]) -> Option<Self> {
        let (program, base_args) = words.split_first()?;
        Some(Self {
            program: program.clone(),
            base_args: base_args.to_vec(),
        })
    }
}

impl FormatterProcess for GitClangFormat {
    fn run(&self, args: &[String], cwd: &Path) -> Result<ToolOutput, FormatError> {
        let output = Command::new(&self.program)
            .args(&self.base_args)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|source| FormatError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Turns a [`FormatRequest`] into a [`FormatResult`].
pub struct Invoker<'a> {
    vcs: &'a dyn VersionControl,
    process: &'a dyn FormatterProcess,
    cwd: PathBuf,
}

impl<'a> Invoker<'a> {
    /// Run the formatter in `cwd`, consulting `vcs` for the unstaged guard.
    pub fn new(
        vcs: &'a dyn VersionControl,
        process: &'a dyn FormatterProcess,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vcs,
            process,
            cwd: cwd.into(),
        }
    }

    /// Run one request.
    ///
    /// # Errors
    ///
    /// - [`FormatError::UnstagedChanges`] in apply mode when the working
    ///   tree has unstaged modifications and the request does not allow them
    /// - [`FormatError::Spawn`] / [`FormatError::ToolFailed`] when the
    ///   formatter cannot run or fails
    pub fn invoke(&self, request: &FormatRequest) -> Result<FormatResult, FormatError> {
        if !request.mode.is_read_only() && !request.allow_unstaged {
            let status = self.vcs.worktree_status(false)?;
            if status.has_unstaged() {
                return Err(FormatError::UnstagedChanges {
                    count: status.unstaged.max(1),
                });
            }
        }

        let args = request.args();
        tracing::debug!(?args, cwd = %self.cwd.display(), mode = ?request.mode, "running formatter");
        let output = self.process.run(&args, &self.cwd)?;
        tracing::trace!(status = ?output.status, stdout = %output.stdout, stderr = %output.stderr, "formatter finished");

        // `--diff` style modes exit 1 when they have something to show.
        let reported_changes =
            request.mode.is_read_only() && output.status == Some(1) && !output.stdout.trim().is_empty();

        if !output.success() && !reported_changes {
            if let Some(count) = unstaged_refusal(&output.stderr) {
                return Err(FormatError::UnstagedChanges { count });
            }
            return Err(FormatError::ToolFailed {
                status: output.status_text(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        let result = FormatResult::from_output(request.mode, &output.stdout, &output.stderr);
        tracing::debug!(changed = result.changed, files = result.files.len(), "formatter result");
        Ok(result)
    }
}

/// Detect the formatter's own refusal to touch files with unstaged edits,
/// returning how many files it listed.
fn unstaged_refusal(stderr: &str) -> Option<usize> {
    let mut lines = stderr
        .lines()
        .skip_while(|line| !line.contains("have unstaged changes"));
    lines.next()?;
    let count = lines
        .take_while(|line| line.starts_with(char::is_whitespace) && !line.trim().is_empty())
        .count();
    Some(count.max(1))
}
