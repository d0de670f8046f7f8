//! Wire-level frames
//!
//! A `RelayFrame` is the unit the relay endpoint sends to the browser in
//! streaming mode, one frame per SSE `data:` line.

use serde::{Deserialize, Serialize};

/// One discrete unit of the relay's event stream.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayFrame {
    /// An incremental fragment of the assistant reply.
    Chunk { text: String },
    /// Normal end of the reply. Always the last frame on success.
    Done,
    /// Terminal failure. Always the last frame on error; the HTTP status
    /// stays 200 once the stream has begun, so this is the only failure
    /// signal after the first byte.
    Error { message: String },
}

impl RelayFrame {
    pub fn chunk(text: impl Into<String>) -> Self {
        Self::Chunk { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Encode this frame as one SSE event: `data: <JSON>\n\n`.
    pub fn to_sse(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"kind":"error","message":"frame serialization failed"}"#.to_string()
        });
        format!("data: {json}\n\n")
    }
}
