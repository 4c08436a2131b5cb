//! Business queue: the ordered worklist of matters awaiting the president.
//!
//! Live items (pending or active) are kept in a vector sorted by
//! `(priority, sequence)`. Completed and withdrawn items leave the vector;
//! their last state travels in the queue event that removed them.

use common::types::{ParticipantId, ProposalId, QueueItemId};
use serde::{Deserialize, Serialize};

use super::ledger::ProposalCategory;
use crate::errors::FloorError;

/// Objections jump ahead of everything else.
pub const OBJECTION_PRIORITY: u32 = 0;
pub const SPEAKER_REQUEST_PRIORITY: u32 = 1;
pub const CONSTITUTIONAL_PRIORITY: u32 = 2;
pub const PRIORITY_CATEGORY_PRIORITY: u32 = 8;
pub const NORMAL_PRIORITY: u32 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueItemKind {
    SpeakerRequest,
    Objection,
    ProposalDiscussion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueItemStatus {
    Pending,
    Active,
    Completed,
}

/// What a queue item is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueSubject {
    Participant(ParticipantId),
    Proposal(ProposalId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub kind: QueueItemKind,
    pub subject: QueueSubject,
    pub status: QueueItemStatus,
    pub priority: u32,
    /// Insertion order, breaks ties within a priority.
    pub sequence: u64,
}

impl QueueItem {
    /// Participant owning a speaker request or objection.
    #[must_use]
    pub fn participant(&self) -> Option<&ParticipantId> {
        match &self.subject {
            QueueSubject::Participant(id) => Some(id),
            QueueSubject::Proposal(_) => None,
        }
    }

    #[must_use]
    pub fn proposal(&self) -> Option<ProposalId> {
        match &self.subject {
            QueueSubject::Proposal(id) => Some(*id),
            QueueSubject::Participant(_) => None,
        }
    }
}

/// Priority for a new item of the given kind.
#[must_use]
pub fn priority_for(kind: QueueItemKind, category: Option<ProposalCategory>) -> u32 {
    match (kind, category) {
        (QueueItemKind::Objection, _) => OBJECTION_PRIORITY,
        (QueueItemKind::SpeakerRequest, _) => SPEAKER_REQUEST_PRIORITY,
        (QueueItemKind::ProposalDiscussion, Some(ProposalCategory::Constitutional)) => {
            CONSTITUTIONAL_PRIORITY
        }
        (QueueItemKind::ProposalDiscussion, Some(ProposalCategory::Priority)) => {
            PRIORITY_CATEGORY_PRIORITY
        }
        (QueueItemKind::ProposalDiscussion, _) => NORMAL_PRIORITY,
    }
}

#[derive(Debug, Clone)]
pub struct BusinessQueue {
    items: Vec<QueueItem>,
    next_id: u64,
    next_sequence: u64,
    max_active: usize,
}

impl BusinessQueue {
    #[must_use]
    pub fn new(max_active: usize) -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            next_sequence: 0,
            max_active: max_active.max(1),
        }
    }

    /// Fail with `Conflict` if the subject already holds a live item of this kind.
    pub fn check_enqueue(&self, kind: QueueItemKind, subject: &QueueSubject) -> Result<(), FloorError> {
        if self
            .items
            .iter()
            .any(|item| item.kind == kind && item.subject == *subject)
        {
            return Err(FloorError::Conflict(format!(
                "{subject:?} already has a live {kind:?} item"
            )));
        }
        Ok(())
    }

    /// Insert a pending item, stable FIFO within a priority.
    pub fn enqueue(
        &mut self,
        kind: QueueItemKind,
        subject: QueueSubject,
        priority: u32,
    ) -> Result<QueueItem, FloorError> {
        self.check_enqueue(kind, &subject)?;

        let item = QueueItem {
            id: QueueItemId(self.next_id),
            kind,
            subject,
            status: QueueItemStatus::Pending,
            priority,
            sequence: self.next_sequence,
        };
        self.next_id += 1;
        self.next_sequence += 1;

        let position = self.items.partition_point(|i| i.priority <= priority);
        self.items.insert(position, item.clone());
        Ok(item)
    }

    #[must_use]
    pub fn get(&self, id: QueueItemId) -> Option<&QueueItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn require(&self, id: QueueItemId) -> Result<&QueueItem, FloorError> {
        self.get(id)
            .ok_or_else(|| FloorError::NotFound(format!("Queue item {id}")))
    }

    /// Live item of `kind` owned by a participant.
    #[must_use]
    pub fn participant_item(&self, participant: &ParticipantId, kind: QueueItemKind) -> Option<&QueueItem> {
        self.items
            .iter()
            .find(|item| item.kind == kind && item.participant() == Some(participant))
    }

    /// All live items owned by a participant.
    pub fn participant_items<'a>(
        &'a self,
        participant: &'a ParticipantId,
    ) -> impl Iterator<Item = &'a QueueItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.participant() == Some(participant))
    }

    #[must_use]
    pub fn proposal_item(&self, proposal: ProposalId) -> Option<&QueueItem> {
        self.items
            .iter()
            .find(|item| item.proposal() == Some(proposal))
    }

    pub fn active_items(&self) -> impl Iterator<Item = &QueueItem> + Clone {
        self.items
            .iter()
            .filter(|item| item.status == QueueItemStatus::Active)
    }

    /// Check that `id` can move pending → active.
    pub fn check_activate(&self, id: QueueItemId) -> Result<&QueueItem, FloorError> {
        let item = self.require(id)?;
        if item.status != QueueItemStatus::Pending {
            return Err(FloorError::InvalidTransition(format!(
                "Queue item {id} is already active"
            )));
        }
        let active = self.active_items().count();
        if active >= self.max_active {
            return Err(FloorError::Conflict(format!(
                "{active} matter(s) already active; complete one first"
            )));
        }
        Ok(item)
    }

    pub fn activate(&mut self, id: QueueItemId) -> Result<QueueItem, FloorError> {
        self.check_activate(id)?;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| FloorError::NotFound(format!("Queue item {id}")))?;
        item.status = QueueItemStatus::Active;
        Ok(item.clone())
    }

    /// Mark an item completed and drop it from the live queue.
    pub fn complete(&mut self, id: QueueItemId) -> Result<QueueItem, FloorError> {
        let mut item = self.take(id)?;
        item.status = QueueItemStatus::Completed;
        Ok(item)
    }

    /// Drop an item from the live queue without completing it.
    pub fn withdraw(&mut self, id: QueueItemId) -> Result<QueueItem, FloorError> {
        self.take(id)
    }

    fn take(&mut self, id: QueueItemId) -> Result<QueueItem, FloorError> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| FloorError::NotFound(format!("Queue item {id}")))?;
        Ok(self.items.remove(position))
    }

    /// Remove every live item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Live items ordered by `(priority, insertion order)`.
    ///
    /// The iterator borrows the queue and can be cloned to restart the walk.
    pub fn view_ordered(&self) -> impl Iterator<Item = &QueueItem> + Clone {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for BusinessQueue {
    fn default() -> Self {
        Self::new(1)
    }
}
