//! branch command - Format the branch's changes, leaving the fix unstaged

use std::process::ExitCode;

use anyhow::Result;

use super::{report_outcome, Session};
use crate::engine::Context;
use crate::ui::output::Verbosity;

/// Format every line changed since the branch left its upstream.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `force` - Format even when files have unstaged changes
pub fn branch(ctx: &Context, force: bool) -> Result<ExitCode> {
    let session = Session::open(ctx)?;
    let outcome = session.engine()?.format_branch(force)?;

    report_outcome(&outcome, Verbosity::from_flags(false, ctx.debug));
    Ok(ExitCode::SUCCESS)
}
