use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::api::AppState;

/// Streams `{"table": ...}` change announcements to remote viewers.
pub async fn change_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.feed.receiver());

    let event_stream = stream.filter_map(|result| match result {
        Ok(change) => serde_json::to_string(&change)
            .ok()
            .map(|json| Ok(Event::default().event("change").data(json))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
