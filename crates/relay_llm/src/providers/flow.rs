//! Flow-execution upstream.
//!
//! Forwards the conversation to an external flow-execution service that
//! runs a configured workflow and replies with a loosely-shaped JSON
//! document. The reply text can live at several places in that document
//! depending on the workflow's output component, so extraction walks a
//! fallback chain of candidate paths.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::ConversationMessage;
use reqwest::Client;
use serde_json::{json, Value};

use crate::provider::{GenerationProvider, Result, UpstreamError, UpstreamStream};
use crate::types::{Generation, GenerationChunk, GenerationKind};

use super::common::sse::text_stream_from_sse;

/// Candidate locations of the reply text, tried in order.
const MESSAGE_PATHS: &[&str] = &[
    "/outputs/0/outputs/0/results/message/data/text",
    "/outputs/0/outputs/0/messages/0/message",
    "/outputs/0/outputs/0/artifacts/message",
];

pub struct FlowProvider {
    client: Client,
    base_url: String,
    flow_id: String,
    timeout: Duration,
}

impl FlowProvider {
    pub fn new(base_url: impl Into<String>, flow_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            flow_id: flow_id.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn flow_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.flow_id)
    }

    fn build_body(&self, message: &str, history: &[ConversationMessage], stream: bool) -> Value {
        let formatted_history: Vec<Value> = history
            .iter()
            .map(|m| json!({"role": m.role.to_string(), "content": m.content}))
            .collect();

        json!({
            "input_value": flatten_context(message, history),
            "output_type": "chat",
            "input_type": "chat",
            "conversation_history": formatted_history,
            "stream": stream,
        })
    }
}

/// Flatten the transcript into one prompt string, one `role: content`
/// line per message, ending with the current user line.
fn flatten_context(message: &str, history: &[ConversationMessage]) -> String {
    let mut lines: Vec<String> = history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect();
    lines.push(format!("user: {message}"));
    lines.join("\n")
}

/// Walk the fallback chain of candidate paths for the reply text.
fn extract_message(payload: &Value) -> Option<&str> {
    MESSAGE_PATHS
        .iter()
        .find_map(|path| payload.pointer(path).and_then(Value::as_str))
}

/// Pull a text fragment out of one streamed flow event, if it carries one.
fn extract_stream_fragment(payload: &Value) -> Option<String> {
    if payload["type"] == "stream" {
        if let Some(text) = payload["message"].as_str() {
            return Some(text.to_string());
        }
    }
    extract_message(payload).map(str::to_string)
}

#[async_trait]
impl GenerationProvider for FlowProvider {
    async fn chat_stream(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<UpstreamStream> {
        let body = self.build_body(message, history, true);
        let request = self
            .client
            .post(self.flow_url())
            .header("Accept", "text/event-stream")
            .json(&body);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))??;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(UpstreamError::Api(format!("HTTP {status}: {text}")));
        }

        let stream = text_stream_from_sse(response, |_event, data| {
            if data.trim().is_empty() {
                return Ok(None);
            }

            // The flow engine's event payloads are not strictly shaped;
            // events without a recognizable fragment are skipped.
            let Ok(payload) = serde_json::from_str::<Value>(data) else {
                log::debug!("skipping non-JSON flow event");
                return Ok(None);
            };

            match extract_stream_fragment(&payload) {
                Some(text) if !text.is_empty() => Ok(Some(GenerationChunk::Token(text))),
                _ => Ok(None),
            }
        });

        Ok(stream)
    }

    async fn complete(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<Generation> {
        let body = self.build_body(message, history, false);
        let response = self
            .client
            .post(format!("{}?stream=false", self.flow_url()))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(UpstreamError::Api(format!("HTTP {status}: {text}")));
        }

        let payload: Value = response.json().await?;
        let message = extract_message(&payload)
            .ok_or_else(|| UpstreamError::Api("flow response carried no message".to_string()))?
            .to_string();

        Ok(Generation {
            message,
            kind: GenerationKind::Text,
            data: Some(payload),
        })
    }
}
