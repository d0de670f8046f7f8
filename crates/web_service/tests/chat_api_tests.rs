use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    test, web, App, Error,
};
use async_trait::async_trait;
use relay_core::{ChatResponse, ConversationMessage, RelayFrame};
use relay_llm::{
    Generation, GenerationChunk, GenerationKind, GenerationProvider, UpstreamError,
    UpstreamStream,
};
use web_service::server::{app_config, AppState};
use web_service::session::StaticSessionStore;

const TOKEN: &str = "s3ss10n";

/// Scripted upstream: emits the configured fragments, optionally failing
/// part-way through, and counts invocations.
struct StubProvider {
    fragments: Vec<&'static str>,
    fail_after: Option<usize>,
    calls: Arc<AtomicUsize>,
}

impl StubProvider {
    fn healthy(fragments: Vec<&'static str>) -> Self {
        Self {
            fragments,
            fail_after: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing_after(fragments: Vec<&'static str>, fail_after: usize) -> Self {
        Self {
            fragments,
            fail_after: Some(fail_after),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn items(&self) -> Vec<Result<GenerationChunk, UpstreamError>> {
        let mut items: Vec<Result<GenerationChunk, UpstreamError>> = Vec::new();
        for (i, fragment) in self.fragments.iter().enumerate() {
            if Some(i) == self.fail_after {
                items.push(Err(UpstreamError::Stream("connection reset".to_string())));
                return items;
            }
            items.push(Ok(GenerationChunk::Token(fragment.to_string())));
        }
        if let Some(n) = self.fail_after {
            if n >= self.fragments.len() {
                items.push(Err(UpstreamError::Stream("connection reset".to_string())));
                return items;
            }
        }
        items.push(Ok(GenerationChunk::Done));
        items
    }
}

#[async_trait]
impl GenerationProvider for StubProvider {
    async fn chat_stream(
        &self,
        _message: &str,
        _history: &[ConversationMessage],
    ) -> Result<UpstreamStream, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::pin(futures::stream::iter(self.items())))
    }

    async fn complete(
        &self,
        _message: &str,
        _history: &[ConversationMessage],
    ) -> Result<Generation, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some() {
            return Err(UpstreamError::Api("upstream unavailable".to_string()));
        }
        Ok(Generation {
            message: self.fragments.concat(),
            kind: GenerationKind::Text,
            data: None,
        })
    }
}

async fn service_with(
    provider: StubProvider,
    default_streaming: bool,
) -> (
    impl Service<Request, Response = ServiceResponse, Error = Error>,
    Arc<AtomicUsize>,
) {
    let calls = provider.calls.clone();
    let app_state = web::Data::new(AppState {
        provider: Arc::new(provider),
        sessions: Arc::new(StaticSessionStore::new([TOKEN.to_string()])),
        default_streaming,
    });

    let app =
        test::init_service(App::new().app_data(app_state.clone()).configure(app_config)).await;
    (app, calls)
}

fn chat_request(body: serde_json::Value) -> Request {
    test::TestRequest::post()
        .uri("/api/chat")
        .insert_header(("Authorization", format!("Bearer {TOKEN}")))
        .set_json(body)
        .to_request()
}

fn parse_frames(body: &[u8]) -> Vec<RelayFrame> {
    std::str::from_utf8(body)
        .expect("utf8 body")
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("valid frame"))
        .collect()
}

#[actix_web::test]
async fn missing_session_is_rejected_before_upstream() {
    let (app, calls) = service_with(StubProvider::healthy(vec!["hi"]), true).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(serde_json::json!({"message": "hello"}))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), 401);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn unknown_token_is_rejected_before_upstream() {
    let (app, calls) = service_with(StubProvider::healthy(vec!["hi"]), true).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .insert_header(("Authorization", "Bearer wrong"))
        .set_json(serde_json::json!({"message": "hello"}))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), 401);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn empty_message_is_rejected_before_upstream() {
    let (app, calls) = service_with(StubProvider::healthy(vec!["hi"]), true).await;

    let res = test::call_service(&app, chat_request(serde_json::json!({"message": ""}))).await;

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "message is required");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn absent_message_field_is_a_client_error() {
    let (app, calls) = service_with(StubProvider::healthy(vec!["hi"]), true).await;

    let res = test::call_service(&app, chat_request(serde_json::json!({"history": []}))).await;

    assert!(res.status().is_client_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn streaming_relays_chunks_in_order_then_done() {
    let (app, _) = service_with(StubProvider::healthy(vec!["He", "llo"]), true).await;

    let res = test::call_service(&app, chat_request(serde_json::json!({"message": "hello"}))).await;

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let body = test::read_body(res).await;
    let frames = parse_frames(&body);
    assert_eq!(
        frames,
        vec![
            RelayFrame::chunk("He"),
            RelayFrame::chunk("llo"),
            RelayFrame::Done,
        ]
    );

    // Concatenated chunk texts equal the full reply.
    let text: String = frames
        .iter()
        .filter_map(|f| match f {
            RelayFrame::Chunk { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Hello");
}

#[actix_web::test]
async fn mid_stream_failure_emits_chunk_then_error_frame() {
    let (app, _) = service_with(StubProvider::failing_after(vec!["He", "llo"], 1), true).await;

    let res = test::call_service(&app, chat_request(serde_json::json!({"message": "hello"}))).await;

    // The stream began, so the status is already 200.
    assert_eq!(res.status(), 200);

    let body = test::read_body(res).await;
    let frames = parse_frames(&body);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], RelayFrame::chunk("He"));
    assert!(matches!(frames[1], RelayFrame::Error { .. }));
}

#[actix_web::test]
async fn buffered_mode_returns_single_json_body() {
    let (app, _) = service_with(StubProvider::healthy(vec!["4"]), false).await;

    let res = test::call_service(
        &app,
        chat_request(serde_json::json!({"message": "2+2", "history": []})),
    )
    .await;

    assert_eq!(res.status(), 200);
    let body: ChatResponse = test::read_body_json(res).await;
    assert!(!body.message.is_empty());
    assert_eq!(body.message, "4");
    assert_eq!(body.kind, "text");
    assert!(body.data.is_none());
}

#[actix_web::test]
async fn buffered_upstream_failure_is_a_gateway_error() {
    let (app, _) = service_with(StubProvider::failing_after(vec![], 0), false).await;

    let res = test::call_service(&app, chat_request(serde_json::json!({"message": "hello"}))).await;

    assert_eq!(res.status(), 502);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("upstream"));
}

#[actix_web::test]
async fn stream_override_flag_beats_server_default() {
    let (app, _) = service_with(StubProvider::healthy(vec!["4"]), true).await;

    let res = test::call_service(
        &app,
        chat_request(serde_json::json!({"message": "2+2", "stream": false})),
    )
    .await;

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/json"
    );
}

#[actix_web::test]
async fn identical_requests_reach_upstream_independently() {
    let (app, calls) = service_with(StubProvider::healthy(vec!["hi"]), true).await;

    for _ in 0..2 {
        let res =
            test::call_service(&app, chat_request(serde_json::json!({"message": "hello"}))).await;
        assert_eq!(res.status(), 200);
        test::read_body(res).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn health_needs_no_session() {
    let (app, _) = service_with(StubProvider::healthy(vec![]), true).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), 200);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
}
