//! Outbound change events and the resync snapshot.

use common::types::{ParticipantId, ProposalId};
use serde::{Deserialize, Serialize};

use super::ledger::{Proposal, ProposalCategory};
use super::lifecycle::SessionMode;
use super::queue::QueueItem;
use super::registry::Participant;
use super::rules::Tally;
use super::seat::SeatStatus;

/// How a queue item changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueChange {
    Enqueued,
    Activated,
    Completed,
    /// Left the queue without being completed.
    Withdrawn,
}

/// A proposal together with its current tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalView {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub tally: Option<Tally>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FloorEvent {
    /// Registration, presence or attribute change.
    ParticipantUpdate {
        participant: Participant,
    },
    SeatUpdate {
        participant_id: ParticipantId,
        old_status: SeatStatus,
        new_status: SeatStatus,
    },
    QueueUpdate {
        item: QueueItem,
        change: QueueChange,
    },
    ProposalUpdate {
        proposal: ProposalView,
    },
    ProposalsClosed {
        category: ProposalCategory,
        proposals: Vec<ProposalView>,
    },
    ProposalDelete {
        proposal_id: ProposalId,
    },
    FineImposed {
        participant_id: ParticipantId,
        amount: u64,
        reason: String,
        total: u64,
    },
    Break,
    EndBreak,
    EndSession,
}

impl FloorEvent {
    /// Wire name, also used as the SSE event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FloorEvent::ParticipantUpdate { .. } => "participantUpdate",
            FloorEvent::SeatUpdate { .. } => "seatUpdate",
            FloorEvent::QueueUpdate { .. } => "queueUpdate",
            FloorEvent::ProposalUpdate { .. } => "proposalUpdate",
            FloorEvent::ProposalsClosed { .. } => "proposalsClosed",
            FloorEvent::ProposalDelete { .. } => "proposalDelete",
            FloorEvent::FineImposed { .. } => "fineImposed",
            FloorEvent::Break => "break",
            FloorEvent::EndBreak => "endBreak",
            FloorEvent::EndSession => "endSession",
        }
    }
}

/// A committed event with its position in the floor's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub event: FloorEvent,
}

/// Full authoritative state, as returned by resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    /// Sequence of the last event reflected in this snapshot.
    pub sequence: u64,
    pub session_mode: SessionMode,
    pub participants: Vec<Participant>,
    pub queue: Vec<QueueItem>,
    pub proposals: Vec<ProposalView>,
}
