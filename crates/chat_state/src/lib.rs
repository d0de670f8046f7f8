//! chat_state - Consumer-side state for the chat relay
//!
//! This crate provides the state a chat consumer keeps for one session:
//! the visible transcript (with optimistic append and rollback) and the
//! state machine of a single submission.

pub mod machine;
pub mod transcript;

// Re-export commonly used types
pub use machine::{StateMachine, StateTransition, SubmissionEvent, SubmissionState};
pub use transcript::{Transcript, TranscriptError};
