//! Karma token grammar.
//!
//! A karma token is a subject immediately followed by an operator:
//!
//! | Subject form            | Example             | Key           |
//! |-------------------------|---------------------|---------------|
//! | user mention            | `<@U1>`, `<@U1|al>` | `U1`          |
//! | broadcast mention       | `<!here>`           | `!here`       |
//! | bare topic              | `pizza`, `#Rust`    | `pizza`, `rust` |
//! | quoted phrase           | `"Ice Cream"`       | `ice cream`   |
//!
//! Operators are exactly `++` or `--`. A single em or en dash also counts as
//! `--`, because some clients autocorrect a typed double hyphen into one dash
//! glyph. The regex crate has no lookaround, so the surrounding rules are
//! explicit predicates checked on every candidate match:
//!
//! - [`operator_boundary_ok`]: the operator is not followed by another
//!   operator character or by a word character, so `c+++` and
//!   `great–thanks` are not events.
//! - a bare topic is not glued to a preceding word or `+`/`-`, so
//!   `well-known++` does not score `known`. A dash glyph is punctuation here,
//!   so `think—pizza++` still scores `pizza`.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::event::{Delta, KarmaEvent};
use crate::subject::Subject;

const TOKEN_PATTERN: &str = r#"(?x)
    (?:
        <@(?P<user>[A-Za-z0-9]+)(?:\|[^>]*)?>
      | <!(?P<broadcast>here|channel|everyone)(?:\|[^>]*)?>
      | "(?P<quoted>[^"\n]*)"
      | “(?P<smart>[^”\n]*)”
      | [\#@]?(?P<topic>[\p{L}\p{N}_.']+)
    )
    (?P<op>\+\+|--|[\x{2013}\x{2014}])
"#;

/// Dash glyphs that stand in for a typed `--`.
pub(crate) const DASH_GLYPHS: [char; 2] = ['\u{2014}', '\u{2013}'];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("karma token pattern compiles"))
}

/// Extract karma events from `text`, in left-to-right order.
///
/// Never fails: text without a well-formed token yields no events.
pub fn parse(text: &str) -> Vec<KarmaEvent> {
    let mut events = Vec::new();
    let mut pos = 0;

    while let Some(caps) = token_pattern().captures_at(text, pos) {
        let (Some(whole), Some(op)) = (caps.get(0), caps.name("op")) else {
            break;
        };
        match event_from_captures(text, &caps) {
            Some(event) => {
                events.push(event);
                pos = whole.end();
            }
            // Rescan from the operator so a token right after it (for
            // example past a dash used as punctuation) is still found.
            None => pos = op.start(),
        }
    }

    if !events.is_empty() {
        debug!(count = events.len(), "parsed karma events");
    }
    events
}

fn is_operator_char(ch: char) -> bool {
    ch == '+' || ch == '-' || DASH_GLYPHS.contains(&ch)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// True when the operator ending at byte offset `op_end` stands alone: it is
/// not followed by another operator character or by a word character.
pub fn operator_boundary_ok(text: &str, op_end: usize) -> bool {
    match text[op_end..].chars().next() {
        None => true,
        Some(ch) => !(is_operator_char(ch) || is_word_char(ch)),
    }
}

/// True when a bare topic starting at byte offset `start` is not glued to a
/// preceding word or `+`/`-`.
fn topic_boundary_ok(text: &str, start: usize) -> bool {
    match text[..start].chars().next_back() {
        None => true,
        Some(ch) => !(is_topic_char(ch) || ch == '+' || ch == '-'),
    }
}

fn is_topic_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '.' | '\'')
}

fn event_from_captures(text: &str, caps: &Captures<'_>) -> Option<KarmaEvent> {
    let whole = caps.get(0)?;
    let op = caps.name("op")?;
    if !operator_boundary_ok(text, op.end()) {
        return None;
    }
    let delta = Delta::from_operator(op.as_str())?;

    let subject = if let Some(user) = caps.name("user") {
        Subject::mention(user.as_str())
    } else if let Some(broadcast) = caps.name("broadcast") {
        Subject::broadcast(broadcast.as_str())
    } else if let Some(phrase) = caps.name("quoted").or_else(|| caps.name("smart")) {
        Subject::topic(phrase.as_str())?
    } else {
        let topic = caps.name("topic")?;
        if !topic_boundary_ok(text, whole.start()) {
            return None;
        }
        Subject::topic(topic.as_str())?
    };

    Some(KarmaEvent::new(subject, delta))
}
