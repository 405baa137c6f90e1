//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// branchfmt - format only what your branch changed
#[derive(Parser, Debug)]
#[command(name = "branchfmt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if branchfmt was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Format the lines changed on this branch, leaving the fix unstaged
    #[command(
        name = "branch",
        long_about = "Format the lines changed on this branch, leaving the fix unstaged.\n\n\
            Finds the commit where the current branch left its upstream and runs \
            git-clang-format against it, so only lines the branch touched are \
            reformatted. The result stays in the working tree for you to review \
            and commit; nothing is committed for you.",
        after_help = "\
EXAMPLES:
    # Fix formatting, then review and commit it
    branchfmt branch
    git diff
    git commit -am 'Fix formatting'

    # Run even though some files have unstaged edits
    branchfmt branch --force"
    )]
    Branch {
        /// Allow formatting files that have unstaged changes
        #[arg(long)]
        force: bool,
    },

    /// Format the staged changes only
    #[command(
        name = "cached",
        long_about = "Format the staged changes only.\n\n\
            Runs git-clang-format without a base revision, so only changes in \
            the index are considered. Useful before the first commit of a branch \
            or from a pre-commit hook."
    )]
    Cached {
        /// Allow formatting files that have unstaged changes
        #[arg(long)]
        force: bool,
    },

    /// Check that the branch's changes are formatted
    #[command(
        name = "check-branch",
        long_about = "Check that the branch's changes are formatted.\n\n\
            Exits 0 when every line the branch changed is already formatted and 1 \
            otherwise. Nothing in the working tree is modified.",
        after_help = "\
EXAMPLES:
    # Show what would change
    branchfmt check-branch --diff

    # Per-file summary with the branch's commits
    branchfmt check-branch --diffstat --show-commits

    # In CI or a hook: no output, exit status only
    branchfmt check-branch --quiet"
    )]
    CheckBranch {
        /// Show the formatting changes as a diff
        #[arg(long, conflicts_with = "diffstat")]
        diff: bool,

        /// Show a per-file summary of the formatting changes
        #[arg(long)]
        diffstat: bool,

        /// List the commits on the branch
        #[arg(long)]
        show_commits: bool,

        /// Print nothing; report through the exit status
        #[arg(short, long)]
        quiet: bool,
    },

    /// Format every commit on the branch, rewriting history
    #[command(
        name = "rewrite-branch",
        long_about = "Format every commit on the branch, rewriting history.\n\n\
            Each commit since the branch left its upstream is checked out in a \
            scratch worktree, formatted, and recommitted with its original author, \
            committer, dates and message. The branch moves only once every commit \
            was rewritten; the old tip is kept in refs/branchfmt/original/<branch>.\n\n\
            Refuses to run on the default branch, on a detached HEAD, or with \
            uncommitted changes.",
        after_help = "\
EXAMPLES:
    # Rewrite, then compare with the old history
    branchfmt rewrite-branch
    git range-diff refs/branchfmt/original/my-feature...HEAD

    # Undo a rewrite
    git reset --hard refs/branchfmt/original/my-feature"
    )]
    RewriteBranch,
}

impl Command {
    /// Name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Branch { .. } => "branch",
            Command::Cached { .. } => "cached",
            Command::CheckBranch { .. } => "check-branch",
            Command::RewriteBranch => "rewrite-branch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("branchfmt").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["branch", "--force", "--cwd", "/tmp/repo", "--debug"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.cwd, Some(PathBuf::from("/tmp/repo")));
        assert!(matches!(cli.command, Command::Branch { force: true }));
    }

    #[test]
    fn check_branch_flags() {
        let cli = parse(&["check-branch", "--diffstat", "--show-commits", "-q"]).unwrap();
        match cli.command {
            Command::CheckBranch {
                diff,
                diffstat,
                show_commits,
                quiet,
            } => {
                assert!(!diff);
                assert!(diffstat);
                assert!(show_commits);
                assert!(quiet);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn diff_and_diffstat_conflict() {
        let err = parse(&["check-branch", "--diff", "--diffstat"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rewrite_takes_no_force() {
        assert!(parse(&["rewrite-branch", "--force"]).is_err());
    }

    #[test]
    fn command_required() {
        assert!(parse(&[]).is_err());
    }
}
