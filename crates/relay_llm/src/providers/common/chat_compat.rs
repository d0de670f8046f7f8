//! Chat-completions request/stream helpers.
//!
//! The direct upstream accepts the widely-implemented chat completions
//! shape: a `messages` array of `{role, content}` objects and an SSE
//! stream of `choices[].delta` chunks terminated by `[DONE]`. These
//! helpers build the request body without leaking internal message
//! fields (`timestamp`, `type`, `data`) and parse the stream back.

use relay_core::ConversationMessage;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::Result;
use crate::types::GenerationChunk;

/// Convert transcript history plus the current user message to the wire
/// `messages` array, preserving history order.
pub fn messages_to_wire_json(message: &str, history: &[ConversationMessage]) -> Vec<Value> {
    history
        .iter()
        .map(|m| {
            json!({
                "role": m.role.to_string(),
                "content": m.content,
            })
        })
        .chain(std::iter::once(json!({
            "role": "user",
            "content": message,
        })))
        .collect()
}

/// Build a streaming chat-completions request body.
pub fn build_chat_body(model: &str, message: &str, history: &[ConversationMessage]) -> Value {
    json!({
        "model": model,
        "messages": messages_to_wire_json(message, history),
        "stream": true,
    })
}

// --- streaming chunk parsing ---

#[derive(Debug, Deserialize)]
pub struct ChatStreamChunk {
    #[allow(dead_code)]
    id: Option<String>,
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    delta: ChatStreamDelta,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ChatStreamDelta {
    content: Option<String>,
    #[allow(dead_code)]
    role: Option<String>,
}

/// Parse an SSE `data:` payload in strict mode.
///
/// - `"[DONE]"` -> `GenerationChunk::Done`
/// - Invalid JSON -> error
pub fn parse_chat_sse_data(data: &str) -> Result<GenerationChunk> {
    if data.trim() == "[DONE]" {
        return Ok(GenerationChunk::Done);
    }

    let chunk: ChatStreamChunk = serde_json::from_str(data)?;
    let content = chunk
        .choices
        .first()
        .and_then(|choice| choice.delta.content.clone())
        .unwrap_or_default();

    Ok(GenerationChunk::Token(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::ConversationMessage;

    #[test]
    fn wire_messages_omit_internal_fields() {
        let mut prior = ConversationMessage::assistant("Hi there");
        prior.kind = Some("stream".to_string());
        let history = vec![ConversationMessage::user("Hello"), prior];

        let out = messages_to_wire_json("How are you?", &history);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["role"], "user");
        assert_eq!(out[1]["role"], "assistant");
        assert_eq!(out[2], json!({"role": "user", "content": "How are you?"}));
        assert!(out[1].get("timestamp").is_none());
        assert!(out[1].get("type").is_none());
    }

    #[test]
    fn wire_messages_with_empty_history() {
        let out = messages_to_wire_json("2+2", &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["content"], "2+2");
    }

    #[test]
    fn body_includes_required_fields() {
        let body = build_chat_body("gpt-4o-mini", "Hello", &[]);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn content_delta_yields_token() {
        let data = r#"{"id":"chatcmpl_1","choices":[{"delta":{"content":"Hello"}}]}"#;
        let chunk = parse_chat_sse_data(data).unwrap();
        assert_eq!(chunk, GenerationChunk::Token("Hello".to_string()));
    }

    #[test]
    fn empty_delta_yields_empty_token() {
        let data = r#"{"id":"chatcmpl_1","choices":[{"delta":{}}]}"#;
        let chunk = parse_chat_sse_data(data).unwrap();
        assert_eq!(chunk, GenerationChunk::Token(String::new()));
    }

    #[test]
    fn no_choices_yields_empty_token() {
        let data = r#"{"id":"chatcmpl_1","choices":[]}"#;
        let chunk = parse_chat_sse_data(data).unwrap();
        assert_eq!(chunk, GenerationChunk::Token(String::new()));
    }

    #[test]
    fn done_marker_yields_done() {
        assert_eq!(parse_chat_sse_data("[DONE]").unwrap(), GenerationChunk::Done);
        assert_eq!(
            parse_chat_sse_data("  [DONE]  ").unwrap(),
            GenerationChunk::Done
        );
    }

    #[test]
    fn invalid_json_errors() {
        assert!(parse_chat_sse_data("{not valid json}").is_err());
    }
}
