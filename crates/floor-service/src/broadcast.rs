//! Broadcast coordinator.
//!
//! Fans committed events out to every connected observer and holds the
//! latest snapshot for resynchronization. It never authorizes or mutates
//! anything; it only sees what the floor actor has already committed.
//!
//! Delivery is at-least-once from an observer's point of view: a new
//! subscriber receives the current snapshot and may then also receive events
//! already reflected in it. Events whose `sequence` is not greater than the
//! snapshot's `sequence` can be skipped.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

use crate::floor::{EventEnvelope, Snapshot};
use crate::observability::metrics;

/// Default number of events buffered per observer before it lags.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// A new observer's starting point.
pub struct Subscription {
    pub snapshot: Arc<Snapshot>,
    pub events: broadcast::Receiver<EventEnvelope>,
}

#[derive(Debug)]
pub struct BroadcastCoordinator {
    events: broadcast::Sender<EventEnvelope>,
    snapshot: watch::Sender<Arc<Snapshot>>,
}

impl BroadcastCoordinator {
    #[must_use]
    pub fn new(buffer: usize, initial: Snapshot) -> Self {
        let (events, _) = broadcast::channel(buffer.max(1));
        let (snapshot, _) = watch::channel(Arc::new(initial));
        Self { events, snapshot }
    }

    /// Replace the snapshot, then send every envelope in order.
    pub fn publish(&self, envelopes: Vec<EventEnvelope>, snapshot: Snapshot) {
        self.snapshot.send_replace(Arc::new(snapshot));

        for envelope in envelopes {
            let name = envelope.event.name();
            let sequence = envelope.sequence;
            match self.events.send(envelope) {
                Ok(receivers) => {
                    trace!(target: "floor.broadcast", event = name, sequence, receivers, "Event published");
                }
                Err(_) => {
                    trace!(target: "floor.broadcast", event = name, sequence, "Event published with no observers");
                }
            }
            metrics::record_event_published(name);
        }
    }

    /// Current authoritative snapshot.
    #[must_use]
    pub fn resync(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Subscribe to events, starting from the current snapshot.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        // Receiver first so nothing published after the snapshot read is missed
        let events = self.events.subscribe();
        let snapshot = self.resync();
        debug!(
            target: "floor.broadcast",
            sequence = snapshot.sequence,
            observers = self.events.receiver_count(),
            "Observer subscribed"
        );
        Subscription { snapshot, events }
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.events.receiver_count()
    }
}
