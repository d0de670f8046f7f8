//! Conversation messages
//!
//! A transcript is an ordered, append-only sequence of these messages.
//! Ordering is insertion order and is significant: the history is replayed
//! to the upstream service as conversation context, never reordered.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of a conversation transcript.
///
/// Immutable once appended; `kind` and `data` carry the coarse response
/// type tag and opaque upstream metadata for assistant messages.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationMessage {
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::User,
            timestamp: Utc::now(),
            kind: None,
            data: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::Assistant,
            timestamp: Utc::now(),
            kind: None,
            data: None,
        }
    }
}
