//! Run a chat message through the engine

use crate::error::CliResult;
use crate::output::{self, print_error, print_success, print_warning, OutputFormat};
use colored::*;
use karma_engine::{EventOutcome, EventResult, KarmaEngine};

/// Process `text` as if `author` had posted it, and report each event.
pub fn execute(engine: &KarmaEngine, author: &str, text: &str, format: OutputFormat) -> CliResult<()> {
    let results = engine.process(author, text);

    match format {
        OutputFormat::Table => print_results(&results),
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(&results, format)?,
    }
    Ok(())
}

fn print_results(results: &[EventResult]) {
    if results.is_empty() {
        println!("{}", "No karma events in message".dimmed());
        return;
    }

    for result in results {
        let line = result.to_string();
        match result.outcome {
            EventOutcome::Applied { .. } => print_success(&line),
            EventOutcome::Rejected { .. } => print_warning(&line),
            EventOutcome::Failed { .. } => print_error(&line),
        }
    }
}
