//! The session-local transcript
//!
//! Append-only: committed entries are never mutated or reordered. A
//! submission first appends the user message and an empty assistant
//! placeholder optimistically; the placeholder grows chunk by chunk and
//! is either finalized on completion or removed (together with the user
//! message) on failure, restoring the typed input for resubmission.

use relay_core::ConversationMessage;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("an exchange is already in flight")]
    ExchangeInFlight,

    #[error("no exchange is in flight")]
    NoExchange,
}

#[derive(Debug, Clone)]
struct PendingExchange {
    user_index: usize,
    assistant_index: usize,
    typed_input: String,
}

/// Ordered list of conversation messages, held in memory for the
/// duration of a session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ConversationMessage>,
    pending: Option<PendingExchange>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed and in-progress entries, in insertion order.
    pub fn entries(&self) -> &[ConversationMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an exchange is awaiting its outcome.
    pub fn has_pending_exchange(&self) -> bool {
        self.pending.is_some()
    }

    /// The history to replay upstream: every committed entry, excluding
    /// the optimistic pair of the in-flight exchange.
    pub fn committed(&self) -> &[ConversationMessage] {
        match &self.pending {
            Some(pending) => &self.entries[..pending.user_index],
            None => &self.entries,
        }
    }

    /// Optimistically append the user message and an empty assistant
    /// placeholder.
    pub fn begin_exchange(&mut self, typed_input: &str) -> Result<(), TranscriptError> {
        if self.pending.is_some() {
            return Err(TranscriptError::ExchangeInFlight);
        }

        let user_index = self.entries.len();
        self.entries.push(ConversationMessage::user(typed_input));
        self.entries.push(ConversationMessage::assistant(""));

        self.pending = Some(PendingExchange {
            user_index,
            assistant_index: user_index + 1,
            typed_input: typed_input.to_string(),
        });

        Ok(())
    }

    /// Append a chunk's text to the placeholder assistant message.
    pub fn append_chunk(&mut self, text: &str) -> Result<(), TranscriptError> {
        let pending = self.pending.as_ref().ok_or(TranscriptError::NoExchange)?;
        self.entries[pending.assistant_index].content.push_str(text);
        Ok(())
    }

    /// Commit the exchange, stamping the reply's type tag and metadata.
    /// Returns the finalized assistant message.
    pub fn finalize(
        &mut self,
        kind: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Result<&ConversationMessage, TranscriptError> {
        let pending = self.pending.take().ok_or(TranscriptError::NoExchange)?;
        let message = &mut self.entries[pending.assistant_index];
        message.kind = Some(kind.into());
        message.data = data;
        Ok(&self.entries[pending.assistant_index])
    }

    /// Remove both optimistic entries and hand back the typed input so
    /// the user can resubmit it. Partial reply text is discarded.
    pub fn rollback(&mut self) -> Result<String, TranscriptError> {
        let pending = self.pending.take().ok_or(TranscriptError::NoExchange)?;
        self.entries.truncate(pending.user_index);
        tracing::debug!("rolled back optimistic exchange");
        Ok(pending.typed_input)
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Role;

    #[test]
    fn begin_exchange_appends_optimistic_pair() {
        let mut transcript = Transcript::new();
        transcript.begin_exchange("hello").unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries()[0].role, Role::User);
        assert_eq!(transcript.entries()[0].content, "hello");
        assert_eq!(transcript.entries()[1].role, Role::Assistant);
        assert_eq!(transcript.entries()[1].content, "");
    }

    #[test]
    fn chunks_grow_the_placeholder() {
        let mut transcript = Transcript::new();
        transcript.begin_exchange("hello").unwrap();
        transcript.append_chunk("He").unwrap();
        transcript.append_chunk("llo").unwrap();

        assert_eq!(transcript.last().unwrap().content, "Hello");
    }

    #[test]
    fn finalize_commits_tag_and_data() {
        let mut transcript = Transcript::new();
        transcript.begin_exchange("hello").unwrap();
        transcript.append_chunk("Hello").unwrap();

        let message = transcript
            .finalize("stream", Some(serde_json::json!({"frames": 1})))
            .unwrap();
        assert_eq!(message.kind.as_deref(), Some("stream"));

        assert!(!transcript.has_pending_exchange());
        assert_eq!(transcript.committed().len(), 2);
    }

    #[test]
    fn rollback_removes_pair_and_restores_input() {
        let mut transcript = Transcript::new();
        transcript.begin_exchange("first").unwrap();
        transcript.append_chunk("reply").unwrap();
        transcript.finalize("stream", None).unwrap();

        transcript.begin_exchange("second").unwrap();
        transcript.append_chunk("partial").unwrap();

        let restored = transcript.rollback().unwrap();
        assert_eq!(restored, "second");

        // The committed first exchange is untouched.
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries()[0].content, "first");
        assert_eq!(transcript.entries()[1].content, "reply");
    }

    #[test]
    fn committed_excludes_in_flight_pair() {
        let mut transcript = Transcript::new();
        transcript.begin_exchange("first").unwrap();
        transcript.finalize("stream", None).unwrap();

        transcript.begin_exchange("second").unwrap();
        assert_eq!(transcript.committed().len(), 2);
        assert_eq!(transcript.entries().len(), 4);
    }

    #[test]
    fn concurrent_exchanges_are_rejected() {
        let mut transcript = Transcript::new();
        transcript.begin_exchange("one").unwrap();
        assert_eq!(
            transcript.begin_exchange("two"),
            Err(TranscriptError::ExchangeInFlight)
        );
    }

    #[test]
    fn operations_without_exchange_fail() {
        let mut transcript = Transcript::new();
        assert_eq!(
            transcript.append_chunk("x"),
            Err(TranscriptError::NoExchange)
        );
        assert_eq!(transcript.rollback(), Err(TranscriptError::NoExchange));
    }
}
