//! Submission events

use serde::{Deserialize, Serialize};

/// Events that drive one submission's state transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionEvent {
    /// The user submitted a new message.
    MessageSubmitted,

    /// A chunk frame arrived from the relay.
    ChunkReceived,

    /// A done frame arrived; the reply is complete.
    DoneReceived,

    /// An error frame arrived; the exchange is rolled back.
    ErrorReceived { message: String },

    /// The connection dropped or a frame could not be decoded; treated
    /// the same as an error frame.
    ConnectionLost { message: String },
}

impl SubmissionEvent {
    /// Whether this event ends the submission in failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ErrorReceived { .. } | Self::ConnectionLost { .. }
        )
    }

    /// Whether this event ends the submission (either way).
    pub fn is_terminal(&self) -> bool {
        self.is_failure() || matches!(self, Self::DoneReceived)
    }
}
