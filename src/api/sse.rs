//! Server-Sent Events for live transcripts

use crate::chat::{ChatEvent, ChatSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Stream an init snapshot followed by every appended turn
pub fn sse_stream(
    init: ChatSnapshot,
    events: broadcast::Receiver<ChatEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init_event = Event::default()
        .event("init")
        .data(json!({ "type": "init", "conversation": init }).to_string());
    let init = futures::stream::once(async move { Ok(init_event) });

    let broadcasts = BroadcastStream::new(events).filter_map(|result| match result {
        Ok(event) => Some(Ok(chat_event_to_axum(event))),
        Err(e) => {
            // Lagged receivers skip ahead; clients resync from GET
            tracing::debug!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn chat_event_to_axum(event: ChatEvent) -> Event {
    let (event_type, data) = match event {
        ChatEvent::TurnAppended(turn) => ("turn", json!({ "type": "turn", "turn": turn })),
    };

    Event::default().event(event_type).data(data.to_string())
}
