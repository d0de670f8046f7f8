use relay_core::ChatResponse;
use serde::{Deserialize, Serialize};

/// One unit of an upstream response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationChunk {
    /// An incremental text fragment.
    Token(String),
    /// Explicit upstream end-of-reply marker. Streams that just close the
    /// connection never emit this; consumers must treat end-of-stream as
    /// completion too.
    Done,
}

/// Coarse tag for how a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// Extracted from a single buffered upstream response.
    Text,
    /// Accumulated from an incremental stream.
    Stream,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Text => "text",
            GenerationKind::Stream => "stream",
        }
    }
}

/// A complete upstream reply.
#[derive(Debug, Clone)]
pub struct Generation {
    pub message: String,
    pub kind: GenerationKind,
    /// Opaque upstream metadata, forwarded verbatim.
    pub data: Option<serde_json::Value>,
}

impl From<Generation> for ChatResponse {
    fn from(generation: Generation) -> Self {
        ChatResponse {
            message: generation.message,
            kind: generation.kind.as_str().to_string(),
            data: generation.data,
        }
    }
}
