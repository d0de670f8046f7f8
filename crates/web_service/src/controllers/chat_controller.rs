//! The chat relay endpoint.
//!
//! Validates the inbound request, invokes the upstream provider, and
//! re-encodes its output for the caller: either an incrementally
//! forwarded event stream or one buffered JSON body. Holds no state
//! across requests; every invocation is independent.

use actix_web::{post, web, HttpRequest, HttpResponse};
use bytes::Bytes;
use futures_util::StreamExt;
use relay_core::{ChatRequest, ChatResponse, RelayFrame};
use relay_llm::{GenerationChunk, GenerationProvider};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AppError;
use crate::server::AppState;
use crate::session::bearer_token;

const FRAME_CHANNEL_CAPACITY: usize = 16;

#[post("/chat")]
pub async fn chat(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req).ok_or(AppError::Unauthorized)?;
    if !state.sessions.validate(token) {
        return Err(AppError::Unauthorized);
    }

    let request = body.into_inner();
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::MissingMessage);
    }

    let streaming = request.stream.unwrap_or(state.default_streaming);
    tracing::debug!(streaming, history_len = request.history.len(), "relaying chat message");

    if streaming {
        relay_stream(&state, &message, &request).await
    } else {
        relay_buffered(&state, &message, &request).await
    }
}

/// Open the upstream stream and forward it frame by frame.
///
/// Frames are forwarded in production order, one `chunk` per upstream
/// fragment, then `done`. A failure after the stream has begun is
/// reported in-band as an `error` frame; the HTTP status is already 200
/// by then. Failures before the first upstream fragment surface as a
/// plain error response.
async fn relay_stream(
    state: &web::Data<AppState>,
    message: &str,
    request: &ChatRequest,
) -> Result<HttpResponse, AppError> {
    let mut upstream = state.provider.chat_stream(message, &request.history).await?;

    let (tx, rx) = mpsc::channel::<Bytes>(FRAME_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        while let Some(item) = upstream.next().await {
            let (frame, last) = match item {
                Ok(GenerationChunk::Token(text)) if text.is_empty() => continue,
                Ok(GenerationChunk::Token(text)) => (RelayFrame::chunk(text), false),
                Ok(GenerationChunk::Done) => (RelayFrame::Done, true),
                Err(err) => {
                    tracing::error!(error = %err, "upstream stream failed");
                    (RelayFrame::error(err.to_string()), true)
                }
            };

            // A send error means the client went away; stop reading.
            if send_frame(&tx, &frame).await.is_err() {
                return;
            }
            if last {
                return;
            }
        }

        // Upstream closed without an explicit end marker.
        let _ = send_frame(&tx, &RelayFrame::Done).await;
    });

    let body = ReceiverStream::new(rx).map(Ok::<_, AppError>);

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(body))
}

async fn relay_buffered(
    state: &web::Data<AppState>,
    message: &str,
    request: &ChatRequest,
) -> Result<HttpResponse, AppError> {
    let generation = state.provider.complete(message, &request.history).await?;
    Ok(HttpResponse::Ok().json(ChatResponse::from(generation)))
}

async fn send_frame(
    tx: &mpsc::Sender<Bytes>,
    frame: &RelayFrame,
) -> Result<(), mpsc::error::SendError<Bytes>> {
    tx.send(Bytes::from(frame.to_sse())).await
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(chat);
}
