//! One consumer's chat session.
//!
//! Ties the relay client to the transcript and submission machine. A
//! submission optimistically appends the user message and an assistant
//! placeholder, grows the placeholder per chunk frame, and finalizes it
//! on `done`. An `error` frame, an undecodable frame, a dropped
//! connection, or a stream that ends without `done` all roll the
//! optimistic pair back; the typed input is handed back for manual
//! resubmission. No retry is attempted.

use futures_util::StreamExt;
use relay_core::{ConversationMessage, RelayFrame};
use thiserror::Error;

use chat_state::{StateMachine, SubmissionEvent, Transcript};

use crate::client::{ClientError, RelayClient};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("another submission is in flight")]
    Busy,

    /// The exchange failed and was rolled back; `restored_input` is the
    /// text to put back into the input box.
    #[error("exchange failed: {source}")]
    Failed {
        restored_input: String,
        #[source]
        source: ClientError,
    },
}

pub struct ChatSession {
    client: RelayClient,
    transcript: Transcript,
    machine: StateMachine,
}

impl ChatSession {
    pub fn new(client: RelayClient) -> Self {
        Self {
            client,
            transcript: Transcript::new(),
            machine: StateMachine::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Submit a message in streaming mode and drive the transcript until
    /// the exchange completes or fails. Returns the finalized reply.
    pub async fn submit(&mut self, input: &str) -> Result<ConversationMessage, SubmitError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SubmitError::EmptyMessage);
        }
        if !self.machine.state().accepts_user_input() {
            return Err(SubmitError::Busy);
        }

        let history = self.transcript.committed().to_vec();
        self.transcript
            .begin_exchange(input)
            .map_err(|_| SubmitError::Busy)?;
        self.machine.handle_event(SubmissionEvent::MessageSubmitted);

        let mut stream = match self.client.send_chat_message(input, &history).await {
            Ok(stream) => stream,
            Err(err) => return Err(self.fail(err)),
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(RelayFrame::Chunk { text }) => {
                    // begin_exchange above guarantees a pending exchange.
                    let _ = self.transcript.append_chunk(&text);
                    self.machine.handle_event(SubmissionEvent::ChunkReceived);
                }
                Ok(RelayFrame::Done) => {
                    self.machine.handle_event(SubmissionEvent::DoneReceived);
                    if let Ok(message) = self.transcript.finalize("stream", None) {
                        return Ok(message.clone());
                    }
                    return Err(self.fail(ClientError::Stream(
                        "exchange already closed".to_string(),
                    )));
                }
                Ok(RelayFrame::Error { message }) => {
                    return Err(self.fail(ClientError::Stream(message)));
                }
                Err(err) => return Err(self.fail(err)),
            }
        }

        Err(self.fail(ClientError::TruncatedStream))
    }

    /// Submit a message in buffered mode.
    pub async fn submit_buffered(
        &mut self,
        input: &str,
    ) -> Result<ConversationMessage, SubmitError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SubmitError::EmptyMessage);
        }
        if !self.machine.state().accepts_user_input() {
            return Err(SubmitError::Busy);
        }

        let history = self.transcript.committed().to_vec();
        self.transcript
            .begin_exchange(input)
            .map_err(|_| SubmitError::Busy)?;
        self.machine.handle_event(SubmissionEvent::MessageSubmitted);

        match self.client.send_chat_message_buffered(input, &history).await {
            Ok(response) => {
                let _ = self.transcript.append_chunk(&response.message);
                self.machine.handle_event(SubmissionEvent::ChunkReceived);
                self.machine.handle_event(SubmissionEvent::DoneReceived);
                if let Ok(message) = self.transcript.finalize(response.kind, response.data) {
                    return Ok(message.clone());
                }
                Err(self.fail(ClientError::Stream(
                    "exchange already closed".to_string(),
                )))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, source: ClientError) -> SubmitError {
        log::warn!("chat exchange failed: {source}");

        let event = match &source {
            ClientError::Api { message, .. } | ClientError::Stream(message) => {
                SubmissionEvent::ErrorReceived {
                    message: message.clone(),
                }
            }
            other => SubmissionEvent::ConnectionLost {
                message: other.to_string(),
            },
        };
        self.machine.handle_event(event);

        let restored_input = self.transcript.rollback().unwrap_or_default();
        SubmitError::Failed {
            restored_input,
            source,
        }
    }
}
