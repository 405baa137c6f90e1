//! rewrite-branch command - Format every commit on the branch

use std::process::ExitCode;

use anyhow::Result;

use super::Session;
use crate::engine::{Context, RewriteState};
use crate::ui::output::{self, Verbosity};

/// Rewrite the branch so that every commit is formatted.
pub fn rewrite_branch(ctx: &Context) -> Result<ExitCode> {
    let verbosity = Verbosity::from_flags(false, ctx.debug);
    let session = Session::open(ctx)?;
    let outcome = session.engine()?.rewrite_history()?;

    match (outcome.state, &outcome.backup) {
        (RewriteState::AlreadyCompliant, _) => {
            output::print("branch is already formatted; nothing to rewrite", verbosity);
        }
        (_, Some(backup)) => {
            output::success(
                format!("rewrote {} commit(s)", outcome.rewritten),
                verbosity,
            );
            output::print(format!("previous tip saved as {}", backup), verbosity);
        }
        (_, None) => {
            output::warn(
                "formatter reported changes but every commit was already formatted",
                verbosity,
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
