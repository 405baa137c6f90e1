//! branchfmt - format only what your branch changed
//!
//! branchfmt wraps `git clang-format` with branch-scoped workflows: format
//! the lines a branch changed, format the index, check a branch for
//! compliance, or rewrite every commit on a branch so each one is formatted.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Baseline resolution and the four workflows
//! - [`format`] - Formatter requests, invocation and output classification
//! - [`core`] - Domain types and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Only lines changed since the divergence point are formatted
//! 2. Nothing is committed except by `rewrite-branch`
//! 3. A history rewrite either moves the branch to a fully formatted history
//!    or leaves it untouched
//! 4. Re-running any command on a formatted branch changes nothing

pub mod cli;
pub mod core;
pub mod engine;
pub mod format;
pub mod git;
pub mod ui;
