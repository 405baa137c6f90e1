//! format
//!
//! Everything about talking to the line-level formatter.
//!
//! # Architecture
//!
//! - [`FormatRequest`] describes one formatter run and renders its command
//!   line.
//! - [`invoker::Invoker`] enforces the unstaged-changes guard and runs the
//!   request through a [`invoker::FormatterProcess`].
//! - [`result`] turns captured output into a [`FormatResult`]. Callers never
//!   look at raw text to decide whether something changed.
//!
//! The formatter is only ever told about the base revision; it decides
//! which changed lines to touch. Apply mode writes to the working tree,
//! every other mode is read-only.

pub mod invoker;
pub mod result;

pub use invoker::{FormatError, FormatterProcess, GitClangFormat, Invoker, ToolOutput};
pub use result::{classify, FileDetail, FileRecord, FormatResult, SENTINELS};

use std::fmt;

use crate::core::types::Oid;

/// What the formatter should do with the changes it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Rewrite files in the working tree.
    Apply,
    /// Report whether anything would change.
    Check,
    /// Print the would-be changes as a unified diff.
    Diff,
    /// Print a per-file summary of the would-be changes.
    Diffstat,
}

impl OutputMode {
    /// Whether this mode leaves the working tree alone.
    pub fn is_read_only(self) -> bool {
        !matches!(self, OutputMode::Apply)
    }

    fn flag(self) -> Option<&'static str> {
        match self {
            OutputMode::Apply => None,
            OutputMode::Check | OutputMode::Diff => Some("--diff"),
            OutputMode::Diffstat => Some("--diffstat"),
        }
    }
}

/// Where the formatter gets its style from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    /// The nearest `.clang-format` file.
    File,
    /// A named or inline style, passed through verbatim.
    Named(String),
}

impl StyleSource {
    /// Parse the configured style value.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "file" => StyleSource::File,
            other => StyleSource::Named(other.to_string()),
        }
    }
}

impl fmt::Display for StyleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleSource::File => f.write_str("file"),
            StyleSource::Named(name) => f.write_str(name),
        }
    }
}

/// A validated set of file extensions (without leading dots).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions(Vec<String>);

impl Extensions {
    /// Check that `ext` is a bare suffix such as `cpp`.
    ///
    /// # Example
    ///
    /// ```
    /// use branchfmt::format::Extensions;
    ///
    /// assert!(Extensions::check("cpp").is_ok());
    /// assert!(Extensions::check(".cpp").is_err());
    /// assert!(Extensions::check("c,h").is_err());
    /// ```
    pub fn check(ext: &str) -> Result<(), String> {
        if ext.is_empty() {
            return Err("extension cannot be empty".to_string());
        }
        if ext.contains('.') {
            return Err(format!("extension '{}' must not contain '.'", ext));
        }
        if ext.contains(',') {
            return Err(format!("extension '{}' must not contain ','", ext));
        }
        if ext.chars().any(char::is_whitespace) {
            return Err(format!("extension '{}' must not contain whitespace", ext));
        }
        Ok(())
    }

    /// Build a set from individual extensions, validating each one.
    pub fn new<I, S>(exts: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exts: Vec<String> = exts.into_iter().map(Into::into).collect();
        if exts.is_empty() {
            return Err("extension set cannot be empty".to_string());
        }
        for ext in &exts {
            Self::check(ext)?;
        }
        Ok(Self(exts))
    }
}

impl fmt::Display for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Style and extension settings shared by every request in a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub style: StyleSource,
    pub extensions: Extensions,
}

/// One formatter invocation.
///
/// Immutable once built; the builder methods consume and return it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    /// Base revision; `None` formats staged changes only.
    pub revision: Option<Oid>,
    pub extensions: Extensions,
    pub style: StyleSource,
    /// Let apply mode run over a working tree with unstaged modifications.
    pub allow_unstaged: bool,
    pub mode: OutputMode,
}

impl FormatRequest {
    pub fn new(mode: OutputMode, revision: Option<Oid>, options: &FormatOptions) -> Self {
        Self {
            revision,
            extensions: options.extensions.clone(),
            style: options.style.clone(),
            allow_unstaged: false,
            mode,
        }
    }

    pub fn allow_unstaged(mut self, allow: bool) -> Self {
        self.allow_unstaged = allow;
        self
    }

    /// Formatter arguments, after the program words.
    ///
    /// `[--style s] [--extensions e] [--force] [--diff|--diffstat] [rev]`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--style".to_string(),
            self.style.to_string(),
            "--extensions".to_string(),
            self.extensions.to_string(),
        ];
        if self.allow_unstaged {
            args.push("--force".to_string());
        }
        if let Some(flag) = self.mode.flag() {
            args.push(flag.to_string());
        }
        if let Some(rev) = &self.revision {
            args.push(rev.to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FormatOptions {
        FormatOptions {
            style: StyleSource::File,
            extensions: Extensions::new(["c", "h"]).unwrap(),
        }
    }

    fn rev() -> Oid {
        Oid::new("a".repeat(40)).unwrap()
    }

    mod extensions {
        use super::*;

        #[test]
        fn rejects_bad_suffixes() {
            assert!(Extensions::check("").is_err());
            assert!(Extensions::check("c pp").is_err());
            assert!(Extensions::new(Vec::<String>::new()).is_err());
        }

        #[test]
        fn displays_comma_joined() {
            let exts = Extensions::new(["c", "cpp", "h"]).unwrap();
            assert_eq!(exts.to_string(), "c,cpp,h");
        }
    }

    mod style {
        use super::*;

        #[test]
        fn file_is_special() {
            assert_eq!(StyleSource::parse("file"), StyleSource::File);
            assert_eq!(
                StyleSource::parse("{BasedOnStyle: llvm}"),
                StyleSource::Named("{BasedOnStyle: llvm}".to_string())
            );
        }
    }

    mod args {
        use super::*;

        #[test]
        fn apply_against_revision() {
            let request = FormatRequest::new(OutputMode::Apply, Some(rev()), &options());
            insta::assert_debug_snapshot!(request.args(), @r###"
            [
                "--style",
                "file",
                "--extensions",
                "c,h",
                "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            ]
            "###);
        }

        #[test]
        fn forced_diffstat() {
            let request =
                FormatRequest::new(OutputMode::Diffstat, Some(rev()), &options()).allow_unstaged(true);
            insta::assert_debug_snapshot!(request.args(), @r###"
            [
                "--style",
                "file",
                "--extensions",
                "c,h",
                "--force",
                "--diffstat",
                "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            ]
            "###);
        }

        #[test]
        fn check_uses_diff_flag() {
            let request = FormatRequest::new(OutputMode::Check, Some(rev()), &options());
            assert!(request.args().contains(&"--diff".to_string()));
        }

        #[test]
        fn staged_has_no_revision() {
            let request = FormatRequest::new(OutputMode::Apply, None, &options());
            assert_eq!(request.args().len(), 4);
        }
    }

    #[test]
    fn read_only_modes() {
        assert!(!OutputMode::Apply.is_read_only());
        assert!(OutputMode::Check.is_read_only());
        assert!(OutputMode::Diff.is_read_only());
        assert!(OutputMode::Diffstat.is_read_only());
    }
}
