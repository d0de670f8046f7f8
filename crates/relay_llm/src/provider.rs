use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use relay_core::ConversationMessage;
use thiserror::Error;

use crate::types::{Generation, GenerationChunk};

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Upstream did not respond within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

pub type UpstreamStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk>> + Send>>;

/// Turns (latest user message, prior transcript) into model output.
///
/// Implementations must replay `history` in its given order; the relay
/// never mutates or reorders prior messages.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Open an incremental response from the upstream service.
    ///
    /// Any connection failure, non-success status, or malformed frame
    /// surfaces as a stream item error; the caller decides what to do
    /// with text accumulated before the failure.
    async fn chat_stream(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<UpstreamStream>;

    /// Wait for the complete upstream response.
    async fn complete(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<Generation>;
}
