//! Leaderboard display

use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use colored::*;
use karma_engine::{Ledger, Standing};
use tabled::Tabled;

/// Table row for a leaderboard entry
#[derive(Debug, Tabled)]
struct StandingRow {
    /// Position in the list
    rank: usize,
    /// Subject key
    subject: String,
    /// Net karma
    score: i64,
}

fn rows(standings: &[Standing]) -> Vec<StandingRow> {
    standings
        .iter()
        .enumerate()
        .map(|(i, s)| StandingRow {
            rank: i + 1,
            subject: s.subject_key.to_string(),
            score: s.score,
        })
        .collect()
}

/// Show the top users and topics, at most `limit` each (0 for all).
pub fn execute(ledger: &Ledger, limit: usize, format: OutputFormat) -> CliResult<()> {
    let board = ledger.leaderboard(limit)?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(&board, format)?,
        OutputFormat::Table => {
            if board.is_empty() {
                println!("No karma yet!");
                return Ok(());
            }
            for (title, standings) in [("Users", &board.users), ("Topics", &board.topics)] {
                if standings.is_empty() {
                    continue;
                }
                println!("{}", title.bold());
                output::print_table(rows(standings));
            }
        }
    }
    Ok(())
}
