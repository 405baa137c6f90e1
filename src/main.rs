//! branchfmt binary entry point.

use std::process::ExitCode;

use branchfmt::cli;
use branchfmt::ui::output;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(err) => {
            output::error(format!("{:#}", err));
            if let Some(hint) = cli::hint_for(&err) {
                output::hint(hint);
            }
            ExitCode::FAILURE
        }
    }
}
