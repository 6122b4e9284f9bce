//! Subjects: the identities that accrue karma.
//!
//! A subject is either a *mention* of a chat-platform user (keyed by the
//! platform's opaque identifier, verbatim) or a free-text *topic* (keyed by
//! its trimmed, lowercased text). Broadcast mentions such as `<!here>` are
//! keyed with a leading `!`, which can never appear in a topic key.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical ledger key for a subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the subject kind from a stored key.
    ///
    /// Topic keys are fixed points of [`canonical_topic`]; anything else
    /// (platform ids carry uppercase characters, broadcasts carry `!`) is a
    /// mention. A platform whose ids are entirely lowercase would be
    /// classified as topics here.
    pub fn kind(&self) -> SubjectKind {
        if self.0.starts_with(BROADCAST_PREFIX) || canonical_topic(&self.0) != self.0 {
            SubjectKind::Mention
        } else {
            SubjectKind::Topic
        }
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SubjectKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubjectKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SubjectKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The two kinds of scored subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Mention,
    Topic,
}

const BROADCAST_PREFIX: char = '!';

/// A scored identity, carrying its canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Subject {
    Mention(SubjectKey),
    Topic(SubjectKey),
}

impl Subject {
    /// A platform user mention, keyed by its identifier verbatim.
    pub fn mention(id: impl Into<String>) -> Self {
        Subject::Mention(SubjectKey::new(id))
    }

    /// A broadcast mention (`<!here>`, `<!channel>`, `<!everyone>`).
    pub fn broadcast(name: &str) -> Self {
        Subject::Mention(SubjectKey::new(format!("{BROADCAST_PREFIX}{name}")))
    }

    /// A topic subject. Returns `None` when the text is blank.
    pub fn topic(text: &str) -> Option<Self> {
        let key = canonical_topic(text);
        if key.is_empty() {
            None
        } else {
            Some(Subject::Topic(SubjectKey(key)))
        }
    }

    /// Map a subject name from the legacy `{name, pluses, minuses}` records.
    ///
    /// Legacy names were stored as the raw message token: `<@U1>` for users,
    /// `<!here>` for broadcasts, and free text (possibly `#`/`@` prefixed)
    /// for things.
    pub fn from_legacy_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(inner) = name.strip_prefix("<@").and_then(|s| s.strip_suffix('>')) {
            let id = inner.split('|').next().unwrap_or_default();
            return (!id.is_empty()).then(|| Subject::mention(id));
        }
        if let Some(inner) = name.strip_prefix("<!").and_then(|s| s.strip_suffix('>')) {
            let broadcast = inner.split('|').next().unwrap_or_default();
            return (!broadcast.is_empty()).then(|| Subject::broadcast(broadcast));
        }
        let bare = name
            .strip_prefix('#')
            .or_else(|| name.strip_prefix('@'))
            .unwrap_or(name);
        Subject::topic(bare)
    }

    pub fn key(&self) -> &SubjectKey {
        match self {
            Subject::Mention(key) | Subject::Topic(key) => key,
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Mention(_) => SubjectKind::Mention,
            Subject::Topic(_) => SubjectKind::Topic,
        }
    }

    pub fn into_key(self) -> SubjectKey {
        match self {
            Subject::Mention(key) | Subject::Topic(key) => key,
        }
    }
}

impl fmt::Display for Subject {
    /// Mentions render in platform reference syntax so the chat client
    /// resolves the display name; topics render as their key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Mention(key) => match key.as_str().strip_prefix(BROADCAST_PREFIX) {
                Some(broadcast) => write!(f, "<!{broadcast}>"),
                None => write!(f, "<@{key}>"),
            },
            Subject::Topic(key) => write!(f, "{key}"),
        }
    }
}

/// Canonical topic key: trimmed and lowercased.
pub fn canonical_topic(text: &str) -> String {
    text.trim().to_lowercase()
}
