//! Request and response bodies of the relay endpoint

use serde::{Deserialize, Serialize};

use crate::message::ConversationMessage;

/// Body of `POST /api/chat`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
    /// Overrides the server's default delivery mode when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Buffered-mode response body.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatResponse {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<serde_json::Value>,
}

impl ChatResponse {
    /// Materialize the reply as a transcript entry.
    pub fn into_assistant_message(self) -> ConversationMessage {
        let mut message = ConversationMessage::assistant(self.message);
        message.kind = Some(self.kind);
        message.data = self.data;
        message
    }
}
