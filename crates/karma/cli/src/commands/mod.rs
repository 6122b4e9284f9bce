//! Command implementations

pub mod leaderboard;
pub mod process;
pub mod score;

use crate::error::{CliError, CliResult};
use karma_engine::{Subject, SubjectKey};

/// Turn an operator-supplied subject into a ledger key.
///
/// Platform references (`<@U1>`, `<!here>`) resolve to their mention key.
/// With `user`, the input is a bare platform id and is kept verbatim.
/// Anything else is topic text (an optional `#`/`@` prefix is dropped) and
/// gets the same canonical key the chat parser gives it.
pub fn resolve_subject_key(raw: &str, user: bool) -> CliResult<SubjectKey> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidInput("subject must not be empty".into()));
    }
    let subject = if user && !trimmed.starts_with('<') {
        Some(Subject::mention(trimmed))
    } else {
        Subject::from_legacy_name(trimmed)
    };
    subject
        .map(Subject::into_key)
        .ok_or_else(|| CliError::InvalidInput(format!("unrecognised subject reference {:?}", raw)))
}
