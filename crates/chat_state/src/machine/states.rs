//! Submission states
//!
//! One submission moves through: idle, sent (awaiting the first frame),
//! receiving chunks, then back to idle on done, error, or rollback.
//! Nothing here survives a page reload; the machine is session-local.

use serde::{Deserialize, Serialize};

/// The possible states of one chat submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    /// Awaiting user input. The only state that accepts a new submission.
    #[default]
    Idle,

    /// The message was sent; no frame has arrived yet.
    AwaitingFrames,

    /// Chunk frames are arriving and being appended to the placeholder
    /// assistant message.
    ReceivingChunks,
}

impl SubmissionState {
    /// Whether a new message may be submitted right now.
    pub fn accepts_user_input(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether a request is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Human-readable description of the current state.
    pub fn description(&self) -> &str {
        match self {
            Self::Idle => "Ready for input",
            Self::AwaitingFrames => "Waiting for reply",
            Self::ReceivingChunks => "Receiving reply",
        }
    }
}
