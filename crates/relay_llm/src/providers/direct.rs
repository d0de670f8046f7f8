//! Direct chat-completions upstream.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use relay_core::ConversationMessage;
use reqwest::Client;

use crate::provider::{GenerationProvider, Result, UpstreamError, UpstreamStream};
use crate::types::{Generation, GenerationChunk, GenerationKind};

use super::common::chat_compat::{build_chat_body, parse_chat_sse_data};
use super::common::sse::text_stream_from_sse;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct DirectProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl DirectProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the request, bounding the connect/header phase. Body reads are
    /// not bounded; an open stream stays live as long as frames arrive.
    async fn send_stream_request(&self, body: serde_json::Value) -> Result<reqwest::Response> {
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))??;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(UpstreamError::Api(format!("HTTP {status}: {text}")));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerationProvider for DirectProvider {
    async fn chat_stream(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<UpstreamStream> {
        let body = build_chat_body(&self.model, message, history);
        let response = self.send_stream_request(body).await?;

        let stream = text_stream_from_sse(response, |_event, data| {
            if data.trim().is_empty() {
                return Ok(None);
            }

            match parse_chat_sse_data(data)? {
                GenerationChunk::Token(text) if text.is_empty() => Ok(None),
                other => Ok(Some(other)),
            }
        });

        Ok(stream)
    }

    async fn complete(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<Generation> {
        // Buffered mode is bounded end to end; the caller gets nothing
        // until the reply is complete, so a stalled stream must not hang
        // the handler.
        let collect = async {
            let mut stream = self.chat_stream(message, history).await?;

            let mut content = String::new();
            while let Some(chunk) = stream.next().await {
                match chunk? {
                    GenerationChunk::Token(text) => content.push_str(&text),
                    GenerationChunk::Done => break,
                }
            }

            Ok(Generation {
                message: content,
                kind: GenerationKind::Text,
                data: None,
            })
        };

        tokio::time::timeout(self.timeout, collect)
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))?
    }
}
