//! Server-Sent Events support

use crate::event::Event;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::DropGuard;

/// One frame per event, ending after the final event.
///
/// `guard` lives as long as the response stream, so a client disconnect
/// cancels the turn feeding `rx`.
#[must_use]
pub fn sse_stream(
    rx: UnboundedReceiver<Event>,
    guard: DropGuard,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = async_stream::stream! {
        let _guard = guard;
        let mut rx = rx;
        while let Some(event) = rx.recv().await {
            let done = event.is_final;
            yield Ok(to_sse(&event));
            if done {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_sse(event: &Event) -> SseEvent {
    match serde_json::to_string(event) {
        Ok(data) => SseEvent::default().data(data),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode event");
            SseEvent::default().data("{}")
        }
    }
}
