//! Server-sent event push channel.
//!
//! `GET /api/v1/events` opens a stream that starts with a `snapshot` event
//! and continues with one event per committed change, named after the
//! change (`seatUpdate`, `queueUpdate`, ...) and carrying its sequence as
//! the SSE id. An observer that falls behind the buffer receives a `resync`
//! event holding a fresh snapshot instead of the events it missed; envelopes
//! with a sequence not greater than a snapshot's can be discarded.
//!
//! Streams end when the floor actor stops so graceful shutdown can drain.

use crate::broadcast::{BroadcastCoordinator, Subscription};
use crate::floor::{EventEnvelope, Snapshot};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use common::types::ParticipantId;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// End `stream` once `token` is cancelled.
fn until_cancelled<S: Stream>(stream: S, token: CancellationToken) -> impl Stream<Item = S::Item> {
    stream.take_until(token.cancelled_owned())
}

/// Keeps the observer gauge current for the lifetime of one stream.
struct ObserverGuard {
    broadcast: Arc<BroadcastCoordinator>,
    observer: ParticipantId,
}

impl ObserverGuard {
    fn new(broadcast: Arc<BroadcastCoordinator>, observer: ParticipantId) -> Self {
        metrics::set_observers_active(broadcast.observer_count());
        Self {
            broadcast,
            observer,
        }
    }

    fn resync_event(&self, skipped: u64) -> Result<Event, axum::Error> {
        metrics::record_observer_lagged(skipped);
        let snapshot = self.broadcast.resync();
        tracing::warn!(
            target: "floor.handlers.events",
            observer = %self.observer,
            skipped,
            sequence = snapshot.sequence,
            "Observer lagged, sending resync"
        );
        snapshot_event("resync", &snapshot)
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        metrics::set_observers_active(self.broadcast.observer_count());
        tracing::debug!(
            target: "floor.handlers.events",
            observer = %self.observer,
            "Observer disconnected"
        );
    }
}

fn snapshot_event(name: &str, snapshot: &Snapshot) -> Result<Event, axum::Error> {
    Event::default()
        .event(name)
        .id(snapshot.sequence.to_string())
        .json_data(snapshot)
}

fn envelope_event(envelope: &EventEnvelope) -> Result<Event, axum::Error> {
    Event::default()
        .event(envelope.event.name())
        .id(envelope.sequence.to_string())
        .json_data(envelope)
}

/// Handler for GET /api/v1/events
#[instrument(skip_all, name = "floor.handlers.events")]
pub async fn event_stream(
    State(state): State<Arc<AppState>>,
    Extension(observer): Extension<ParticipantId>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let Subscription { snapshot, events } = state.broadcast.subscribe();
    tracing::debug!(
        target: "floor.handlers.events",
        observer = %observer,
        sequence = snapshot.sequence,
        "Observer connected"
    );

    let initial = tokio_stream::once(snapshot_event("snapshot", &snapshot));

    let guard = ObserverGuard::new(Arc::clone(&state.broadcast), observer);
    let updates = BroadcastStream::new(events).map(move |item| match item {
        Ok(envelope) => envelope_event(&envelope),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => guard.resync_event(skipped),
    });

    let stream = until_cancelled(initial.chain(updates), state.floor.cancellation_token());
    Sse::new(stream).keep_alive(KeepAlive::default())
}
