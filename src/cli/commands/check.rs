//! check-branch command - Report whether the branch's changes are formatted

use std::process::ExitCode;

use anyhow::Result;

use super::Session;
use crate::engine::{CheckMode, CheckOptions, Context, EngineError};
use crate::ui::output::{self, Verbosity};

/// Check the branch and print the evidence.
///
/// Exits 0 when compliant. A non-compliant branch is an error carrying a
/// hint, except in quiet mode where only the exit status reports it.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `diff` - Include the formatting diff
/// * `diffstat` - Include a per-file summary
/// * `show_commits` - Include the branch's commit log
/// * `quiet` - Print nothing
pub fn check_branch(
    ctx: &Context,
    diff: bool,
    diffstat: bool,
    show_commits: bool,
    quiet: bool,
) -> Result<ExitCode> {
    let mode = match (diff, diffstat) {
        (true, _) => CheckMode::Diff,
        (false, true) => CheckMode::Diffstat,
        (false, false) => CheckMode::Plain,
    };
    let options = CheckOptions {
        mode,
        show_commits,
        quiet,
    };
    let verbosity = Verbosity::from_flags(quiet, ctx.debug);

    let session = Session::open(ctx)?;
    let verdict = session.engine()?.check_compliance(&options)?;

    output::print(verdict.evidence.render(), verbosity);
    if verdict.compliant {
        output::success("branch changes are formatted", verbosity);
        Ok(ExitCode::SUCCESS)
    } else if quiet {
        Ok(ExitCode::FAILURE)
    } else {
        Err(EngineError::NonCompliant.into())
    }
}
