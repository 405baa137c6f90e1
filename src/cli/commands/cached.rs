//! cached command - Format staged changes only

use std::process::ExitCode;

use anyhow::Result;

use super::{report_outcome, Session};
use crate::engine::Context;
use crate::ui::output::Verbosity;

/// Format the changes in the index.
pub fn cached(ctx: &Context, force: bool) -> Result<ExitCode> {
    let session = Session::open(ctx)?;
    let outcome = session.engine()?.format_staged(force)?;

    report_outcome(&outcome, Verbosity::from_flags(false, ctx.debug));
    Ok(ExitCode::SUCCESS)
}
