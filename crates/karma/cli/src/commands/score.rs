//! Single-subject score lookup and operator corrections

use crate::error::CliResult;
use crate::output::{self, print_success, OutputFormat};
use karma_engine::{Delta, Ledger, Standing, SubjectKey};

/// Print the score for `subject_key`.
pub fn get(ledger: &Ledger, subject_key: SubjectKey, format: OutputFormat) -> CliResult<()> {
    let score = ledger.get(subject_key.as_str())?;
    let standing = Standing { subject_key, score };

    match format {
        OutputFormat::Table => println!("{}: {}", standing.subject_key, standing.score),
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(&standing, format)?,
    }
    Ok(())
}

/// Apply one increment (or decrement with `down`) to `subject_key` directly.
///
/// Bypasses the self-bump check; this is an operator correction, not a
/// chat event.
pub fn bump(
    ledger: &Ledger,
    subject_key: SubjectKey,
    down: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let delta = if down { Delta::Decrement } else { Delta::Increment };
    let score = ledger.apply(&subject_key, delta)?;
    let standing = Standing { subject_key, score };

    match format {
        OutputFormat::Table => print_success(&format!(
            "{}{} -> {}",
            standing.subject_key, delta, standing.score
        )),
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(&standing, format)?,
    }
    Ok(())
}
