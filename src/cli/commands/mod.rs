//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens a [`Session`] (repository, configuration, formatter)
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT touch the repository directly.

mod branch;
mod cached;
mod check;
mod rewrite;

pub use branch::branch;
pub use cached::cached;
pub use check::check_branch;
pub use rewrite::rewrite_branch;

use std::process::ExitCode;

use anyhow::{anyhow, Context as _, Result};

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::engine::{Context, Engine, FormatOutcome, Settings};
use crate::format::GitClangFormat;
use crate::git::Git;
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Branch { force } => branch::branch(ctx, force),
        Command::Cached { force } => cached::cached(ctx, force),
        Command::CheckBranch {
            diff,
            diffstat,
            show_commits,
            quiet,
        } => check::check_branch(ctx, diff, diffstat, show_commits, quiet),
        Command::RewriteBranch => rewrite::rewrite_branch(ctx),
    }
}

/// Everything a command needs, opened once per invocation.
pub(crate) struct Session {
    git: Git,
    settings: Settings,
    formatter: GitClangFormat,
}

impl Session {
    pub(crate) fn open(ctx: &Context) -> Result<Self> {
        let cwd = ctx.work_dir().context("Failed to determine working directory")?;
        let git = Git::open(&cwd).context("Failed to open repository")?;

        let config = Config::load(Some(git.common_dir())).context("Failed to load config")?;
        let settings = Settings::resolve(&config, &git)?;
        let binary = config.binary();
        let formatter = GitClangFormat::from_words(&binary)
            .ok_or_else(|| anyhow!("no formatter command configured"))?;

        tracing::debug!(
            ?binary,
            global = ?config.global_config_loaded_from(),
            repo = ?config.repo_config_loaded_from(),
            "session opened"
        );
        Ok(Self {
            git,
            settings,
            formatter,
        })
    }

    pub(crate) fn engine(&self) -> Result<Engine<'_>> {
        Ok(Engine::new(&self.git, &self.formatter, &self.settings)?)
    }
}

/// Report a branch/cached formatting outcome.
fn report_outcome(outcome: &FormatOutcome, verbosity: Verbosity) {
    match outcome {
        FormatOutcome::NothingToFormat => {
            output::print("no commits unique to branch; nothing to format", verbosity)
        }
        FormatOutcome::Unchanged => output::print("nothing to format", verbosity),
        FormatOutcome::Formatted { files } if files.is_empty() => output::success(
            "formatted; review the changes and commit them",
            verbosity,
        ),
        FormatOutcome::Formatted { files } => {
            output::success("formatted:", verbosity);
            output::print(output::format_list(files, "    "), verbosity);
            output::print("review the changes and commit them", verbosity);
        }
    }
}
