//! Submission transition logic

use super::events::SubmissionEvent;
use super::states::SubmissionState;

/// The result of feeding one event to the machine.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: SubmissionState,
    pub to: SubmissionState,
    pub event: SubmissionEvent,
    /// Whether the state actually changed.
    pub changed: bool,
}

/// State machine for one chat submission.
///
/// Invalid (state, event) pairs leave the state unchanged rather than
/// failing; the transition is still recorded with `changed = false`.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current_state: SubmissionState,
    history: Vec<StateTransition>,
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current_state: SubmissionState::Idle,
            history: Vec::new(),
            max_history: 50,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.current_state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Handle an event and transition to the next state.
    pub fn handle_event(&mut self, event: SubmissionEvent) -> StateTransition {
        let old_state = self.current_state.clone();
        let new_state = compute_next_state(&old_state, &event);
        let changed = old_state != new_state;

        if !changed {
            tracing::debug!(state = ?old_state, event = ?event, "submission event left state unchanged");
        }

        self.current_state = new_state.clone();

        let transition = StateTransition {
            from: old_state,
            to: new_state,
            event,
            changed,
        };

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }
}

fn compute_next_state(state: &SubmissionState, event: &SubmissionEvent) -> SubmissionState {
    use SubmissionEvent::*;
    use SubmissionState::*;

    match (state, event) {
        (Idle, MessageSubmitted) => AwaitingFrames,

        (AwaitingFrames, ChunkReceived) => ReceivingChunks,
        (ReceivingChunks, ChunkReceived) => ReceivingChunks,

        // A reply may complete without any chunk (empty response).
        (AwaitingFrames, DoneReceived) => Idle,
        (ReceivingChunks, DoneReceived) => Idle,

        // Failure from any in-flight state rolls back to idle.
        (_, ErrorReceived { .. }) | (_, ConnectionLost { .. }) => Idle,

        // Anything else is not a valid transition; hold the state.
        (state, _) => state.clone(),
    }
}
