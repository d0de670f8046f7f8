//! HTTP client for the relay endpoint.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::Stream;
use futures_util::StreamExt;
use relay_core::{ChatRequest, ChatResponse, ConversationMessage, RelayFrame};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode frame: {0}")]
    Decode(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("stream ended without completion")]
    TruncatedStream,
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub type FrameStream = Pin<Box<dyn Stream<Item = Result<RelayFrame>> + Send>>;

/// Client for the relay's chat endpoint.
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let mut builder = self.client.post(self.chat_url()).json(request);
        if let Some(token) = &self.session_token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = match response.json::<serde_json::Value>().await {
                Ok(body) => body["error"]
                    .as_str()
                    .unwrap_or("failed to send message")
                    .to_string(),
                Err(_) => "failed to send message".to_string(),
            };
            return Err(ClientError::Api { status, message });
        }

        Ok(response)
    }

    /// Send a message in streaming mode and decode the frame stream.
    ///
    /// Frames arrive in the exact order the relay emitted them. A frame
    /// that fails to decode surfaces as a stream item error.
    pub async fn send_chat_message(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<FrameStream> {
        let request = ChatRequest {
            message: message.to_string(),
            history: history.to_vec(),
            stream: Some(true),
        };

        let response = self.post_chat(&request).await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .map(|event| {
                let event = event.map_err(|e| ClientError::Stream(e.to_string()))?;
                serde_json::from_str::<RelayFrame>(&event.data)
                    .map_err(|e| ClientError::Decode(e.to_string()))
            })
            .boxed();

        Ok(stream)
    }

    /// Send a message in buffered mode and wait for the full reply.
    pub async fn send_chat_message_buffered(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<ChatResponse> {
        let request = ChatRequest {
            message: message.to_string(),
            history: history.to_vec(),
            stream: Some(false),
        };

        let response = self.post_chat(&request).await?;
        Ok(response.json::<ChatResponse>().await?)
    }
}
