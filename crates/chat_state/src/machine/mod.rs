//! State machine module
//!
//! Tracks the lifecycle of one chat submission.

mod events;
mod states;
mod transitions;

pub use events::SubmissionEvent;
pub use states::SubmissionState;
pub use transitions::{StateMachine, StateTransition};
