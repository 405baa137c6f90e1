//! Architecture enforcement tests.
//!
//! The layering rules are:
//!
//! - Only `src/git/` talks to libgit2.
//! - Only the git interface and the formatter invoker spawn processes.
//! - Command handlers go through the engine; they never touch the
//!   repository themselves.
//! - Library code propagates errors instead of panicking.
//!
//! These tests catch violations in CI.

use std::fs;
use std::path::{Path, PathBuf};

/// Files allowed to spawn child processes.
const PROCESS_SPAWNERS: &[&str] = &["src/git/interface.rs", "src/format/invoker.rs"];

/// Collect every `.rs` file under `dir`.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).expect("Failed to read source directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            files.extend(rust_files(&path));
        } else if path.extension().is_some_and(|e| e == "rs") {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Files compiled only for tests.
const TEST_ONLY: &[&str] = &["src/git/fake.rs"];

/// Source text with inline `#[cfg(test)]` modules removed.
///
/// Everything from the first `#[cfg(test)]` attribute that opens an inline
/// module is dropped, which matches the convention of keeping test modules
/// at the bottom of each file. Test-only files come back empty.
fn non_test_source(path: &Path) -> String {
    if TEST_ONLY.contains(&rel(path).as_str()) {
        return String::new();
    }
    let content = fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim() == "#[cfg(test)]" {
            let next = content[offset + line.len()..].lines().next().unwrap_or("");
            if next.trim_end().ends_with('{') {
                return content[..offset].to_string();
            }
        }
        offset += line.len();
    }
    content
}

/// Code lines only: comments and doc comments stripped.
fn code_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.starts_with("//"))
}

fn rel(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// =============================================================================
// Layering
// =============================================================================

/// libgit2 stays behind the git interface.
#[test]
fn only_git_module_uses_git2() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src")) {
        let name = rel(&path);
        if name.starts_with("src/git/") {
            continue;
        }
        let source = fs::read_to_string(&path).unwrap();
        for (line_no, line) in code_lines(&source) {
            if line.contains("git2::") {
                violations.push(format!("{}:{}: {}", name, line_no, line));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "git2 used outside src/git/:\n  {}",
        violations.join("\n  ")
    );
}

/// Process spawning is confined to two files.
#[test]
fn only_known_files_spawn_processes() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src")) {
        let name = rel(&path);
        if PROCESS_SPAWNERS.contains(&name.as_str()) {
            continue;
        }
        let source = non_test_source(&path);
        for (line_no, line) in code_lines(&source) {
            if line.contains("process::Command") || line.contains("Command::new(") {
                violations.push(format!("{}:{}: {}", name, line_no, line));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Process spawned outside {:?}:\n  {}",
        PROCESS_SPAWNERS,
        violations.join("\n  ")
    );
}

/// Command handlers reach the repository only through the engine.
///
/// `mod.rs` opens the session and is the one place that names `Git`.
#[test]
fn command_handlers_do_not_touch_git() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src/cli/commands")) {
        let name = rel(&path);
        if name.ends_with("/mod.rs") {
            continue;
        }
        let source = non_test_source(&path);
        for (line_no, line) in code_lines(&source) {
            if line.contains("crate::git") || line.contains("Git::open") {
                violations.push(format!("{}:{}: {}", name, line_no, line));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Command handlers must go through the engine:\n  {}",
        violations.join("\n  ")
    );
}

/// The engine depends on the `VersionControl` trait, not the concrete type.
#[test]
fn engine_depends_on_trait_not_git() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src/engine")) {
        let name = rel(&path);
        let source = non_test_source(&path);
        for (line_no, line) in code_lines(&source) {
            let names_concrete = line.contains("Git::open")
                || line.contains("&Git")
                || line.contains("git::Git,")
                || line.contains("git::Git}")
                || line.contains("git::Git;");
            if names_concrete {
                violations.push(format!("{}:{}: {}", name, line_no, line));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Engine must use VersionControl:\n  {}",
        violations.join("\n  ")
    );
}

// =============================================================================
// Error handling
// =============================================================================

/// Library code propagates errors instead of unwrapping.
#[test]
fn no_unwrap_outside_tests() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src")) {
        let name = rel(&path);
        let source = non_test_source(&path);
        for (line_no, line) in code_lines(&source) {
            if line.contains(".unwrap()") || line.contains(".expect(") {
                violations.push(format!("{}:{}: {}", name, line_no, line));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "unwrap/expect in library code:\n  {}",
        violations.join("\n  ")
    );
}

/// The formatter's "nothing changed" phrases are matched in one place.
#[test]
fn sentinels_only_in_result_module() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src")) {
        let name = rel(&path);
        if name == "src/format/result.rs" {
            continue;
        }
        let source = non_test_source(&path);
        for (line_no, line) in code_lines(&source) {
            if line.contains("no modified files to format")
                || line.contains("did not modify any files")
            {
                violations.push(format!("{}:{}: {}", name, line_no, line));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Formatter sentinels matched outside format::result:\n  {}",
        violations.join("\n  ")
    );
}
