//! format::result
//!
//! Reading the formatter's output.
//!
//! The formatter's exit status does not say whether anything changed. It
//! prints one of a fixed set of phrases when there was nothing to do, and
//! anything else means changes were made (apply) or are needed (read-only
//! modes). [`classify`] is the only place that looks for those phrases.

use super::OutputMode;

/// Lines the formatter prints when the requested changes are already
/// formatted.
pub const SENTINELS: &[&str] = &[
    "no modified files to format",
    "clang-format did not modify any files",
];

/// The sentinel line in `output`, if it reports that no change was needed.
///
/// A line matches when its trimmed text equals a sentinel exactly.
pub fn sentinel(output: &str) -> Option<&'static str> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| SENTINELS.iter().copied().find(|s| *s == line))
}

/// Whether `output` reports that no change was needed.
pub fn is_unchanged(output: &str) -> bool {
    sentinel(output).is_some()
}

/// Whether `output` reports changes made or needed.
///
/// # Example
///
/// ```
/// use branchfmt::format::classify;
///
/// assert!(!classify("no modified files to format\n"));
/// assert!(classify("changed files:\n    src/main.c\n"));
/// ```
pub fn classify(output: &str) -> bool {
    !is_unchanged(output)
}

/// What is known about one touched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDetail {
    /// Unified diff body for the file, headers included.
    Patch(String),
    /// Number of changed lines from a diffstat.
    Stat { changes: usize },
    /// The file was rewritten in place.
    Modified,
}

/// One file the formatter touched or would touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub detail: FileDetail,
}

/// Outcome of one formatter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    /// Changes were made (apply) or are needed (read-only modes).
    pub changed: bool,
    /// Standard output, as captured.
    pub raw: String,
    /// Per-file records. Empty in check mode and when nothing changed.
    pub files: Vec<FileRecord>,
    /// The line that reported nothing to do.
    pub sentinel: Option<&'static str>,
}

impl FormatResult {
    /// Interpret captured output for a run in `mode`.
    pub fn from_output(mode: OutputMode, stdout: &str, stderr: &str) -> Self {
        let matched = sentinel(stdout).or_else(|| sentinel(stderr));
        let changed = matched.is_none();
        let files = if !changed {
            Vec::new()
        } else {
            match mode {
                OutputMode::Check => Vec::new(),
                OutputMode::Diff => parse_patches(stdout),
                OutputMode::Diffstat => parse_diffstat(stdout),
                OutputMode::Apply => parse_changed_files(stdout),
            }
        };

        Self {
            changed,
            raw: stdout.to_string(),
            files,
            sentinel: matched,
        }
    }

    /// Paths of the touched files.
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }
}

struct PatchBuilder<'a> {
    path: Option<String>,
    body: Vec<&'a str>,
    has_hunk: bool,
}

impl<'a> PatchBuilder<'a> {
    fn new(header: &'a str) -> Self {
        let path = header
            .strip_prefix("diff --git ")
            .and_then(|rest| rest.rsplit_once(" b/"))
            .map(|(_, path)| path.to_string());
        Self {
            path,
            body: Vec::new(),
            has_hunk: false,
        }
    }

    fn finish(self) -> Option<FileRecord> {
        let path = self.path?;
        Some(FileRecord {
            path,
            detail: FileDetail::Patch(self.body.join("\n")),
        })
    }
}

/// Split a unified diff into one record per file.
///
/// Handles both `diff --git` headers and bare `---`/`+++` pairs. Bare pairs
/// only start a file when the input has no `diff --git` line at all.
pub fn parse_patches(raw: &str) -> Vec<FileRecord> {
    let lines: Vec<&str> = raw.lines().collect();
    let git_headers = lines.iter().any(|line| line.starts_with("diff --git "));
    let mut records = Vec::new();
    let mut current: Option<PatchBuilder<'_>> = None;

    for (i, line) in lines.iter().enumerate() {
        let bare_header = !git_headers
            && line.starts_with("--- ")
            && lines.get(i + 1).is_some_and(|next| next.starts_with("+++ "))
            && current.as_ref().map_or(true, |c| c.has_hunk);

        if line.starts_with("diff --git ") || bare_header {
            if let Some(done) = current.take().and_then(PatchBuilder::finish) {
                records.push(done);
            }
            current = Some(PatchBuilder::new(line));
        }

        let Some(builder) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            builder.has_hunk = true;
        } else if let Some(target) = line.strip_prefix("+++ ").filter(|_| !builder.has_hunk) {
            let target = target.split('\t').next().unwrap_or(target).trim();
            if target != "/dev/null" {
                let path = target.strip_prefix("b/").unwrap_or(target);
                builder.path = Some(path.to_string());
            }
        }
        builder.body.push(line);
    }

    if let Some(done) = current.and_then(PatchBuilder::finish) {
        records.push(done);
    }
    records
}

/// Parse ` path | N +-` lines.
pub fn parse_diffstat(raw: &str) -> Vec<FileRecord> {
    raw.lines()
        .filter_map(|line| {
            let (path, stat) = line.split_once('|')?;
            let changes = stat.split_whitespace().next()?.parse().ok()?;
            let path = path.trim();
            if path.is_empty() {
                return None;
            }
            Some(FileRecord {
                path: path.to_string(),
                detail: FileDetail::Stat { changes },
            })
        })
        .collect()
}

/// Parse the indented list after `changed files:` in apply output.
pub fn parse_changed_files(raw: &str) -> Vec<FileRecord> {
    raw.lines()
        .skip_while(|line| line.trim() != "changed files:")
        .skip(1)
        .take_while(|line| line.starts_with(char::is_whitespace) && !line.trim().is_empty())
        .map(|line| FileRecord {
            path: line.trim().to_string(),
            detail: FileDetail::Modified,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Captured from git-clang-format runs.
    const APPLY_CHANGED: &str = "changed files:\n    src/lexer.c\n    include/lexer.h\n";
    const APPLY_CLEAN: &str = "clang-format did not modify any files\n";
    const DIFF_CLEAN: &str = "no modified files to format\n";
    const DIFF_TWO_FILES: &str = "\
diff --git a/src/lexer.c b/src/lexer.c
index 3b18e51..a2c1f0d 100644
--- a/src/lexer.c
+++ b/src/lexer.c
@@ -1,3 +1,3 @@
 int next(void) {
-\treturn 0;
+  return 0;
 }
diff --git a/src/parse.c b/src/parse.c
index 1111111..2222222 100644
--- a/src/parse.c
+++ b/src/parse.c
@@ -4 +4 @@
-int  x;
+int x;
";
    const DIFFSTAT: &str = " src/lexer.c | 4 ++--\n src/parse.c | 2 +-\n 2 files changed, 3 insertions(+), 3 deletions(-)\n";

    mod classify {
        use super::*;

        #[test]
        fn sentinels_mean_unchanged() {
            assert!(!classify(APPLY_CLEAN));
            assert!(!classify(DIFF_CLEAN));
        }

        #[test]
        fn sentinel_with_surrounding_noise() {
            assert!(!classify("Running clang-format\n  no modified files to format  \n"));
        }

        #[test]
        fn sentinel_must_be_whole_line() {
            assert!(classify("warning: no modified files to format yet\n"));
        }

        #[test]
        fn sentinel_returns_matched_phrase() {
            assert_eq!(
                sentinel("Running\n  no modified files to format\n"),
                Some("no modified files to format")
            );
            assert_eq!(sentinel(APPLY_CHANGED), None);
        }

        #[test]
        fn anything_else_is_changed() {
            assert!(classify(APPLY_CHANGED));
            assert!(classify(DIFF_TWO_FILES));
            assert!(classify(""));
        }
    }

    mod from_output {
        use super::*;

        #[test]
        fn apply_lists_changed_files() {
            let result = FormatResult::from_output(OutputMode::Apply, APPLY_CHANGED, "");
            assert!(result.changed);
            assert_eq!(result.paths(), vec!["src/lexer.c", "include/lexer.h"]);
            assert_eq!(result.files[0].detail, FileDetail::Modified);
        }

        #[test]
        fn diff_splits_per_file() {
            let result = FormatResult::from_output(OutputMode::Diff, DIFF_TWO_FILES, "");
            assert!(result.changed);
            assert_eq!(result.paths(), vec!["src/lexer.c", "src/parse.c"]);
            match &result.files[1].detail {
                FileDetail::Patch(body) => {
                    assert!(body.starts_with("diff --git a/src/parse.c"));
                    assert!(body.ends_with("+int x;"));
                }
                other => panic!("unexpected detail {:?}", other),
            }
        }

        #[test]
        fn check_hides_records() {
            let result = FormatResult::from_output(OutputMode::Check, DIFF_TWO_FILES, "");
            assert!(result.changed);
            assert!(result.files.is_empty());
        }

        #[test]
        fn diffstat_counts_lines() {
            let result = FormatResult::from_output(OutputMode::Diffstat, DIFFSTAT, "");
            assert_eq!(
                result.files,
                vec![
                    FileRecord {
                        path: "src/lexer.c".to_string(),
                        detail: FileDetail::Stat { changes: 4 },
                    },
                    FileRecord {
                        path: "src/parse.c".to_string(),
                        detail: FileDetail::Stat { changes: 2 },
                    },
                ]
            );
        }

        #[test]
        fn sentinel_on_stderr_counts() {
            let result = FormatResult::from_output(OutputMode::Apply, "", APPLY_CLEAN);
            assert!(!result.changed);
            assert!(result.files.is_empty());
            assert_eq!(result.sentinel, Some("clang-format did not modify any files"));
        }
    }

    #[test]
    fn bare_unified_diff_without_git_headers() {
        let raw = "--- a/one.c\n+++ b/one.c\n@@ -1 +1 @@\n-a\n+b\n--- a/two.c\n+++ b/two.c\n@@ -1 +1 @@\n-c\n+d\n";
        let records = parse_patches(raw);
        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["one.c", "two.c"]);
    }

    #[test]
    fn dash_and_plus_lines_inside_git_hunk_stay_in_the_file() {
        let raw = "\
diff --git a/gen.c b/gen.c
--- a/gen.c
+++ b/gen.c
@@ -1,3 +1,3 @@
 int a;
--- x
+++ y
 int b;
";
        let records = parse_patches(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "gen.c");
        match &records[0].detail {
            FileDetail::Patch(body) => assert!(body.ends_with("+++ y\n int b;")),
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn removed_line_starting_with_dashes_is_not_a_header() {
        let raw = "--- a/one.c\n+++ b/one.c\n@@ -1,2 +1 @@\n--- old comment\n+new\n";
        assert_eq!(parse_patches(raw).len(), 1);
    }
}
