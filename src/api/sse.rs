//! Server-Sent Events support

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;

pub type EventStream = BoxStream<'static, Result<Event, Infallible>>;

/// Turn a projection into named SSE events, one per value
pub fn projection_events<T, S>(event_type: &'static str, values: S) -> EventStream
where
    T: Serialize,
    S: Stream<Item = T> + Send + 'static,
{
    values
        .map(move |value| Ok(to_event(event_type, &value)))
        .boxed()
}

pub fn sse_stream(events: EventStream) -> Sse<EventStream> {
    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_event<T: Serialize>(event_type: &str, value: &T) -> Event {
    let data = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    Event::default().event(event_type).data(data)
}
