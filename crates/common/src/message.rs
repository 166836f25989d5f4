//! Conversation message types.

use serde::{Deserialize, Serialize};

/// Which node of the workflow produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Supervisor,
    Researcher,
    Coder,
    Validator,
}

impl Origin {
    /// True for nodes that produce candidate answers rather than routing chatter.
    pub fn is_specialist(self) -> bool {
        matches!(self, Origin::Researcher | Origin::Coder)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Origin::User => "user",
            Origin::Supervisor => "supervisor",
            Origin::Researcher => "researcher",
            Origin::Coder => "coder",
            Origin::Validator => "validator",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a conversation history. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Node that produced the message
    pub origin: Origin,

    /// Message content
    pub content: String,

    /// Timestamp (Unix millis)
    pub timestamp_ms: u64,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::from_node(Origin::User, content)
    }

    pub fn from_node(origin: Origin, content: impl Into<String>) -> Self {
        Self {
            origin,
            content: content.into(),
            timestamp_ms: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
