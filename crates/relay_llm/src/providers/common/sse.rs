//! Shared SSE -> [`UpstreamStream`] adapter.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Response;

use crate::provider::{Result, UpstreamError, UpstreamStream};
use crate::types::GenerationChunk;

fn to_stream_error(err: UpstreamError) -> UpstreamError {
    match err {
        UpstreamError::Stream(msg) => UpstreamError::Stream(msg),
        other => UpstreamError::Stream(other.to_string()),
    }
}

/// Convert an SSE HTTP [`Response`] into an [`UpstreamStream`].
///
/// `handler` receives the SSE event name and data payload for each event,
/// and can either:
/// - return `Ok(Some(chunk))` to emit a chunk
/// - return `Ok(None)` to skip an event
/// - return `Err(_)` to emit a stream error (mapped to `UpstreamError::Stream`)
pub fn text_stream_from_sse<H>(response: Response, mut handler: H) -> UpstreamStream
where
    H: FnMut(&str, &str) -> Result<Option<GenerationChunk>> + Send + 'static,
{
    let stream = response
        .bytes_stream()
        .eventsource()
        .map(move |event| {
            let event = event.map_err(|e| UpstreamError::Stream(e.to_string()))?;
            handler(event.event.as_str(), event.data.as_str()).map_err(to_stream_error)
        })
        .filter_map(|result| async move {
            match result {
                Ok(Some(chunk)) => Some(Ok(chunk)),
                Ok(None) => None,
                Err(err) => Some(Err(err)),
            }
        });

    Box::pin(stream)
}
