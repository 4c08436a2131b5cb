//! `FloorActor` - single owner of the authoritative floor state.
//!
//! Every command is applied to completion before the next message is
//! dequeued, so concurrent callers can never interleave inside a command.
//! Committed events are handed to the broadcast coordinator before the
//! caller's reply is sent.
//!
//! When a pending timeout is configured, a periodic sweep expires speaker
//! requests and objections that have waited longer than the timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::types::{ParticipantId, QueueItemId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::messages::FloorMessage;
use super::metrics::MailboxMonitor;
use crate::broadcast::BroadcastCoordinator;
use crate::errors::FloorError;
use crate::floor::{
    Command, EventEnvelope, FineRecord, FloorEvent, FloorSettings, FloorState, QueueChange,
    QueueItemKind,
};
use crate::observability::metrics;

/// Channel buffer size for the floor mailbox.
const FLOOR_CHANNEL_BUFFER: usize = 1000;

/// How often pending items are checked against the timeout.
const PENDING_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct FloorActorConfig {
    pub floor_id: String,
    pub settings: FloorSettings,
    /// Expire pending speaker requests and objections after this long.
    pub pending_timeout: Option<Duration>,
}

/// Handle to the `FloorActor`.
#[derive(Clone)]
pub struct FloorActorHandle {
    sender: mpsc::Sender<FloorMessage>,
    cancel_token: CancellationToken,
    mailbox: Arc<MailboxMonitor>,
}

impl FloorActorHandle {
    /// Build the floor state and spawn the actor task.
    ///
    /// The initial snapshot (bootstrap president) is published before the
    /// actor accepts commands.
    pub fn spawn(
        config: FloorActorConfig,
        broadcast: Arc<BroadcastCoordinator>,
        cancel_token: CancellationToken,
    ) -> Result<(Self, JoinHandle<()>), FloorError> {
        let state = FloorState::new(&config.settings)?;
        broadcast.publish(Vec::new(), state.snapshot());

        let (sender, receiver) = mpsc::channel(FLOOR_CHANNEL_BUFFER);
        let mailbox = Arc::new(MailboxMonitor::new(&config.floor_id));

        let actor = FloorActor {
            floor_id: config.floor_id,
            state,
            receiver,
            cancel_token: cancel_token.clone(),
            broadcast,
            mailbox: Arc::clone(&mailbox),
            pending_timeout: config.pending_timeout,
            pending_since: HashMap::new(),
        };

        let task_handle = tokio::spawn(actor.run());

        Ok((
            Self {
                sender,
                cancel_token,
                mailbox,
            },
            task_handle,
        ))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> FloorMessage,
    ) -> Result<T, FloorError> {
        let (tx, rx) = oneshot::channel();
        self.mailbox.record_enqueue();
        if let Err(e) = self.sender.send(build(tx)).await {
            self.mailbox.record_send_failed();
            return Err(FloorError::Internal(format!("channel send failed: {e}")));
        }
        rx.await
            .map_err(|e| FloorError::Internal(format!("response receive failed: {e}")))
    }

    /// Apply a command on behalf of `actor`, returning the committed events.
    pub async fn execute(
        &self,
        actor: ParticipantId,
        command: Command,
    ) -> Result<Vec<EventEnvelope>, FloorError> {
        self.request(|respond_to| FloorMessage::Execute {
            actor,
            command,
            respond_to,
        })
        .await?
    }

    pub async fn fines(&self) -> Result<Vec<FineRecord>, FloorError> {
        self.request(|respond_to| FloorMessage::GetFines { respond_to })
            .await
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Token cancelled when the actor stops; long-lived streams end with it.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

pub struct FloorActor {
    floor_id: String,
    state: FloorState,
    receiver: mpsc::Receiver<FloorMessage>,
    cancel_token: CancellationToken,
    broadcast: Arc<BroadcastCoordinator>,
    mailbox: Arc<MailboxMonitor>,
    pending_timeout: Option<Duration>,
    /// When each pending speaker request or objection entered the queue.
    pending_since: HashMap<QueueItemId, Instant>,
}

impl FloorActor {
    #[instrument(skip_all, name = "floor.actor", fields(floor_id = %self.floor_id))]
    async fn run(mut self) {
        info!(
            target: "floor.actor",
            floor_id = %self.floor_id,
            pending_timeout_secs = self.pending_timeout.map(|t| t.as_secs()),
            "FloorActor started"
        );

        let mut sweep = tokio::time::interval(PENDING_SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "floor.actor",
                        floor_id = %self.floor_id,
                        "FloorActor received cancellation signal"
                    );
                    break;
                }

                _ = sweep.tick(), if self.pending_timeout.is_some() => {
                    self.expire_stale_pending();
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.handle_message(message);
                            self.mailbox.record_dequeue();
                        }
                        None => {
                            info!(
                                target: "floor.actor",
                                floor_id = %self.floor_id,
                                "FloorActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "floor.actor",
            floor_id = %self.floor_id,
            sequence = self.state.sequence(),
            messages_processed = self.mailbox.messages_processed(),
            "FloorActor stopped"
        );
    }

    fn handle_message(&mut self, message: FloorMessage) {
        match message {
            FloorMessage::Execute {
                actor,
                command,
                respond_to,
            } => {
                let result = self.execute(&actor, command);
                let _ = respond_to.send(result);
            }

            FloorMessage::GetFines { respond_to } => {
                let _ = respond_to.send(self.state.fines().to_vec());
            }
        }
    }

    fn execute(&mut self, actor: &ParticipantId, command: Command) -> Result<Vec<EventEnvelope>, FloorError> {
        let name = command.name();
        let started = std::time::Instant::now();

        let result = self.state.execute(actor, command);
        match &result {
            Ok(events) => {
                debug!(
                    target: "floor.actor",
                    actor = %actor,
                    command = name,
                    events = events.len(),
                    "Command committed"
                );
                self.commit(events.clone());
                metrics::record_command(name, "success", started.elapsed());
            }
            Err(e) => {
                debug!(
                    target: "floor.actor",
                    actor = %actor,
                    command = name,
                    error = e.error_code(),
                    "Command rejected"
                );
                metrics::record_command(name, e.error_code(), started.elapsed());
            }
        }
        result
    }

    /// Track pending items, then publish events with the new snapshot.
    fn commit(&mut self, events: Vec<EventEnvelope>) {
        if events.is_empty() {
            return;
        }
        if self.pending_timeout.is_some() {
            self.track_pending(&events);
        }
        self.broadcast.publish(events, self.state.snapshot());
    }

    fn track_pending(&mut self, events: &[EventEnvelope]) {
        let now = Instant::now();
        for envelope in events {
            match &envelope.event {
                FloorEvent::QueueUpdate { item, change } => {
                    if *change == QueueChange::Enqueued
                        && item.kind != QueueItemKind::ProposalDiscussion
                    {
                        self.pending_since.insert(item.id, now);
                    } else {
                        self.pending_since.remove(&item.id);
                    }
                }
                FloorEvent::EndSession => self.pending_since.clear(),
                _ => {}
            }
        }
    }

    fn expire_stale_pending(&mut self) {
        let Some(timeout) = self.pending_timeout else {
            return;
        };
        let now = Instant::now();
        let mut stale: Vec<QueueItemId> = self
            .pending_since
            .iter()
            .filter(|(_, since)| now.duration_since(**since) >= timeout)
            .map(|(id, _)| *id)
            .collect();
        if stale.is_empty() {
            return;
        }
        stale.sort();

        let mut expired = 0;
        for id in stale {
            match self.state.expire_pending(id) {
                Ok(events) => {
                    expired += 1;
                    self.commit(events);
                }
                Err(e) => {
                    warn!(
                        target: "floor.actor",
                        floor_id = %self.floor_id,
                        item_id = %id,
                        error = %e,
                        "Could not expire pending item"
                    );
                    self.pending_since.remove(&id);
                }
            }
        }

        info!(
            target: "floor.actor",
            floor_id = %self.floor_id,
            expired,
            "Expired pending queue items"
        );
        metrics::record_pending_expired(expired);
    }
}
