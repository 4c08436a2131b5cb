//! The floor coordinator: applies commands to the components and produces
//! sequenced change events.
//!
//! `FloorState` is synchronous and owns no I/O. Each command is authorized
//! once, validated completely, then applied; a failing command leaves the
//! state untouched and produces no events.

use common::types::{ParticipantId, ProposalId, QueueItemId};
use tracing::debug;

use super::command::Command;
use super::events::{EventEnvelope, FloorEvent, ProposalView, QueueChange, Snapshot};
use super::ledger::{Ledger, Proposal, ProposalCategory};
use super::lifecycle::{SessionLifecycle, SessionMode};
use super::policy;
use super::queue::{self, BusinessQueue, QueueItemKind, QueueItemStatus, QueueSubject};
use super::registry::{FineRecord, Registry};
use super::rules::RequirementDefaults;
use super::seat::SeatStatus;
use crate::errors::FloorError;

/// Construction parameters for a floor.
#[derive(Debug, Clone)]
pub struct FloorSettings {
    /// Identity registered as president at startup.
    pub president: ParticipantId,
    /// Concurrent active queue items (at least 1).
    pub max_active_items: usize,
    pub requirements: RequirementDefaults,
}

impl FloorSettings {
    #[must_use]
    pub fn new(president: ParticipantId) -> Self {
        Self {
            president,
            max_active_items: 1,
            requirements: RequirementDefaults::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FloorState {
    registry: Registry,
    queue: BusinessQueue,
    ledger: Ledger,
    lifecycle: SessionLifecycle,
    sequence: u64,
}

impl FloorState {
    pub fn new(settings: &FloorSettings) -> Result<Self, FloorError> {
        Ok(Self {
            registry: Registry::with_president(settings.president.clone())?,
            queue: BusinessQueue::new(settings.max_active_items),
            ledger: Ledger::new(settings.requirements),
            lifecycle: SessionLifecycle::default(),
            sequence: 0,
        })
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.lifecycle.mode()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn queue(&self) -> &BusinessQueue {
        &self.queue
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Sequence of the last committed event.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn fines(&self) -> &[FineRecord] {
        self.registry.fines()
    }

    fn view(&self, proposal: &Proposal) -> ProposalView {
        ProposalView {
            proposal: proposal.clone(),
            tally: proposal.tally(|id| self.registry.strength_of(id)),
        }
    }

    /// Project the full current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sequence: self.sequence,
            session_mode: self.mode(),
            participants: self.registry.iter().cloned().collect(),
            queue: self.queue.view_ordered().cloned().collect(),
            proposals: self.ledger.iter().map(|p| self.view(p)).collect(),
        }
    }

    /// Authorize and apply a command on behalf of `actor`.
    pub fn execute(
        &mut self,
        actor: &ParticipantId,
        command: Command,
    ) -> Result<Vec<EventEnvelope>, FloorError> {
        let events = if command == Command::Register {
            let is_president = self
                .registry
                .get(actor)
                .is_some_and(|p| p.is_president());
            policy::gate_lifecycle(is_president, self.mode())?;
            let participant = self.registry.register(actor)?.clone();
            vec![FloorEvent::ParticipantUpdate { participant }]
        } else {
            let participant = self.registry.require(actor)?;
            policy::authorize(participant, &command, self)?;
            self.apply(actor, command)?
        };
        Ok(self.stamp(events))
    }

    /// Expire a pending speaker request or objection on behalf of the floor.
    ///
    /// Emits the same events as the owner cancelling it.
    pub fn expire_pending(&mut self, id: QueueItemId) -> Result<Vec<EventEnvelope>, FloorError> {
        policy::gate_lifecycle(true, self.mode())?;
        let item = self.queue.require(id)?;
        if item.status != QueueItemStatus::Pending {
            return Err(FloorError::InvalidTransition(format!(
                "Queue item {id} is not pending"
            )));
        }
        let owner = item
            .participant()
            .cloned()
            .ok_or_else(|| FloorError::Validation(format!("Queue item {id} has no owner")))?;
        let events = self.change_seat(&owner, SeatStatus::Neutral)?;
        Ok(self.stamp(events))
    }

    fn stamp(&mut self, events: Vec<FloorEvent>) -> Vec<EventEnvelope> {
        events
            .into_iter()
            .map(|event| {
                self.sequence += 1;
                EventEnvelope {
                    sequence: self.sequence,
                    event,
                }
            })
            .collect()
    }

    fn participant_event(&self, id: &ParticipantId) -> Result<FloorEvent, FloorError> {
        Ok(FloorEvent::ParticipantUpdate {
            participant: self.registry.require(id)?.clone(),
        })
    }

    fn apply(&mut self, actor: &ParticipantId, command: Command) -> Result<Vec<FloorEvent>, FloorError> {
        debug!(target: "floor.state", actor = %actor, command = command.name(), "Applying command");

        match command {
            Command::Register => Err(FloorError::Internal(
                "registration is handled before dispatch".to_string(),
            )),
            Command::JoinSeat => self.join_seat(actor),
            Command::LeaveSeat => self.leave_seat(actor),
            Command::SetSeatStatus { target, status } => self.change_seat(&target, status),
            Command::RequestSpeak => self.change_seat(actor, SeatStatus::RequestingToSpeak),
            Command::ObjectFloor => self.change_seat(actor, SeatStatus::Objecting),
            Command::SetQueueItemActive(id) => self.activate_item(id),
            Command::CompleteQueueItem(id) => self.complete_item(id),
            Command::CompleteActiveQueueItem => {
                let id = self
                    .queue
                    .active_items()
                    .next()
                    .map(|item| item.id)
                    .ok_or_else(|| FloorError::NotFound("No active queue item".to_string()))?;
                self.complete_item(id)
            }
            Command::CreateProposal(spec) => {
                self.ledger.check_spec(&spec)?;
                let category = spec.category;
                let proposal = self.ledger.create(spec)?;
                let item = self.queue.enqueue(
                    QueueItemKind::ProposalDiscussion,
                    QueueSubject::Proposal(proposal.id),
                    queue::priority_for(QueueItemKind::ProposalDiscussion, Some(category)),
                )?;
                Ok(vec![
                    FloorEvent::ProposalUpdate {
                        proposal: self.view(&proposal),
                    },
                    FloorEvent::QueueUpdate {
                        item,
                        change: QueueChange::Enqueued,
                    },
                ])
            }
            Command::UpdateProposal(id, patch) => {
                let proposal = self.ledger.update(id, patch)?.clone();
                Ok(vec![FloorEvent::ProposalUpdate {
                    proposal: self.view(&proposal),
                }])
            }
            Command::CastVote(id, choice) => {
                let present = self.registry.require(actor)?.present;
                let proposal = self.ledger.cast_vote(id, actor, present, choice)?.clone();
                Ok(vec![FloorEvent::ProposalUpdate {
                    proposal: self.view(&proposal),
                }])
            }
            Command::SetStupid(id, stupid) => {
                let proposal = self.ledger.set_stupid(id, stupid)?.clone();
                Ok(vec![FloorEvent::ProposalUpdate {
                    proposal: self.view(&proposal),
                }])
            }
            Command::EndVoting(category) => Ok(self.end_voting(category)),
            Command::RemoveProposal(id) => self.remove_proposal(id),
            Command::UpdateAttributes(target, patch) => {
                let changed = self.registry.apply_patch(&target, patch)?;
                changed
                    .iter()
                    .map(|id| self.participant_event(id))
                    .collect()
            }
            Command::ImposeFine {
                target,
                amount,
                reason,
            } => {
                let record = self.registry.impose_fine(&target, amount, &reason, actor)?;
                let total = self.registry.require(&target)?.fines;
                Ok(vec![FloorEvent::FineImposed {
                    participant_id: record.participant_id,
                    amount: record.amount,
                    reason: record.reason,
                    total,
                }])
            }
            Command::CallBreak => {
                self.lifecycle.call_break()?;
                Ok(vec![FloorEvent::Break])
            }
            Command::EndBreak => {
                self.lifecycle.end_break()?;
                Ok(vec![FloorEvent::EndBreak])
            }
            Command::EndSession => self.end_session(),
        }
    }

    fn join_seat(&mut self, actor: &ParticipantId) -> Result<Vec<FloorEvent>, FloorError> {
        let participant = self.registry.require_mut(actor)?;
        if participant.present {
            return Err(FloorError::Conflict(format!("{actor} is already seated")));
        }
        participant.present = true;
        Ok(vec![self.participant_event(actor)?])
    }

    fn leave_seat(&mut self, actor: &ParticipantId) -> Result<Vec<FloorEvent>, FloorError> {
        let participant = self.registry.require(actor)?;
        if !participant.present {
            return Err(FloorError::NotEligible(format!("{actor} is not seated")));
        }
        let old_status = participant.seat_status;

        let owned: Vec<QueueItemId> = self.queue.participant_items(actor).map(|i| i.id).collect();
        let mut events = Vec::with_capacity(owned.len() + 2);
        for id in owned {
            let item = self.queue.withdraw(id)?;
            events.push(FloorEvent::QueueUpdate {
                item,
                change: QueueChange::Withdrawn,
            });
        }

        let participant = self.registry.require_mut(actor)?;
        participant.present = false;
        participant.seat_status = SeatStatus::Neutral;
        if old_status != SeatStatus::Neutral {
            events.insert(
                0,
                FloorEvent::SeatUpdate {
                    participant_id: actor.clone(),
                    old_status,
                    new_status: SeatStatus::Neutral,
                },
            );
        }
        events.push(self.participant_event(actor)?);
        Ok(events)
    }

    /// Move a participant along a table edge and keep the queue in step.
    ///
    /// The edge itself has already been authorized.
    fn change_seat(&mut self, target: &ParticipantId, to: SeatStatus) -> Result<Vec<FloorEvent>, FloorError> {
        let participant = self.registry.require(target)?;
        if !participant.present {
            return Err(FloorError::NotEligible(format!("{target} is not seated")));
        }
        let from = participant.seat_status;

        let queue_event = match (from.queue_kind(), to.queue_kind()) {
            // Entering a waiting state
            (None, Some(kind)) if from == SeatStatus::Neutral => {
                let priority = queue::priority_for(kind, None);
                let item = self.queue.enqueue(kind, QueueSubject::Participant(target.clone()), priority)?;
                Some(FloorEvent::QueueUpdate {
                    item,
                    change: QueueChange::Enqueued,
                })
            }
            // Recognition
            (Some(kind), None) if to == SeatStatus::Speaking => {
                match self.queue.participant_item(target, kind).map(|i| i.id) {
                    Some(id) => Some(FloorEvent::QueueUpdate {
                        item: self.queue.activate(id)?,
                        change: QueueChange::Activated,
                    }),
                    None => None,
                }
            }
            // Cancelling a request that was never activated
            (Some(kind), None) => match self.queue.participant_item(target, kind).map(|i| i.id) {
                Some(id) => Some(FloorEvent::QueueUpdate {
                    item: self.queue.withdraw(id)?,
                    change: QueueChange::Withdrawn,
                }),
                None => None,
            },
            // Yielding the floor
            (None, None) if from == SeatStatus::Speaking => {
                let active = self
                    .queue
                    .participant_items(target)
                    .find(|i| i.status == QueueItemStatus::Active)
                    .map(|i| i.id);
                match active {
                    Some(id) => Some(FloorEvent::QueueUpdate {
                        item: self.queue.complete(id)?,
                        change: QueueChange::Completed,
                    }),
                    None => None,
                }
            }
            _ => None,
        };

        self.registry.require_mut(target)?.seat_status = to;
        debug!(target: "floor.state", participant = %target, %from, %to, "Seat transition");

        let mut events = vec![FloorEvent::SeatUpdate {
            participant_id: target.clone(),
            old_status: from,
            new_status: to,
        }];
        events.extend(queue_event);
        Ok(events)
    }

    fn activate_item(&mut self, id: QueueItemId) -> Result<Vec<FloorEvent>, FloorError> {
        let item = self.queue.check_activate(id)?;
        match item.participant().cloned() {
            Some(owner) => self.change_seat(&owner, SeatStatus::Speaking),
            None => Ok(vec![FloorEvent::QueueUpdate {
                item: self.queue.activate(id)?,
                change: QueueChange::Activated,
            }]),
        }
    }

    fn complete_item(&mut self, id: QueueItemId) -> Result<Vec<FloorEvent>, FloorError> {
        let owner = self.queue.require(id)?.participant().cloned();
        let mut events = Vec::with_capacity(2);

        if let Some(owner) = owner {
            let participant = self.registry.require_mut(&owner)?;
            let old_status = participant.seat_status;
            if old_status != SeatStatus::Neutral {
                participant.seat_status = SeatStatus::Neutral;
                events.push(FloorEvent::SeatUpdate {
                    participant_id: owner,
                    old_status,
                    new_status: SeatStatus::Neutral,
                });
            }
        }

        events.push(FloorEvent::QueueUpdate {
            item: self.queue.complete(id)?,
            change: QueueChange::Completed,
        });
        Ok(events)
    }

    fn end_voting(&mut self, category: ProposalCategory) -> Vec<FloorEvent> {
        let registry = &self.registry;
        let eligible = registry.eligible_weight();
        let closed = self
            .ledger
            .end_voting(category, |id| registry.strength_of(id), eligible);
        if closed.is_empty() {
            return Vec::new();
        }
        debug!(target: "floor.state", %category, closed = closed.len(), eligible, "Voting ended");
        let proposals = closed.iter().map(|p| self.view(p)).collect();
        vec![FloorEvent::ProposalsClosed {
            category,
            proposals,
        }]
    }

    fn remove_proposal(&mut self, id: ProposalId) -> Result<Vec<FloorEvent>, FloorError> {
        self.ledger.remove(id)?;
        let mut events = vec![FloorEvent::ProposalDelete { proposal_id: id }];
        if let Some(item_id) = self.queue.proposal_item(id).map(|i| i.id) {
            events.push(FloorEvent::QueueUpdate {
                item: self.queue.withdraw(item_id)?,
                change: QueueChange::Withdrawn,
            });
        }
        Ok(events)
    }

    fn end_session(&mut self) -> Result<Vec<FloorEvent>, FloorError> {
        self.lifecycle.end()?;
        let ids: Vec<ParticipantId> = self.registry.iter().map(|p| p.id.clone()).collect();
        for id in &ids {
            let participant = self.registry.require_mut(id)?;
            participant.present = false;
            participant.seat_status = SeatStatus::Neutral;
        }
        self.queue.clear();
        Ok(vec![FloorEvent::EndSession])
    }
}
