//! Inbound commands. One variant per mutating operation.

use common::types::{ParticipantId, ProposalId, QueueItemId};

use super::ledger::{ProposalCategory, ProposalPatch, ProposalSpec, VoteChoice};
use super::registry::AttributePatch;
use super::seat::SeatStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register the acting identity as a member.
    Register,
    JoinSeat,
    LeaveSeat,
    SetSeatStatus {
        target: ParticipantId,
        status: SeatStatus,
    },
    RequestSpeak,
    ObjectFloor,
    SetQueueItemActive(QueueItemId),
    CompleteQueueItem(QueueItemId),
    CompleteActiveQueueItem,
    CreateProposal(ProposalSpec),
    UpdateProposal(ProposalId, ProposalPatch),
    CastVote(ProposalId, VoteChoice),
    SetStupid(ProposalId, bool),
    EndVoting(ProposalCategory),
    RemoveProposal(ProposalId),
    UpdateAttributes(ParticipantId, AttributePatch),
    ImposeFine {
        target: ParticipantId,
        amount: u64,
        reason: String,
    },
    CallBreak,
    EndBreak,
    EndSession,
}

impl Command {
    /// Stable name used in logs and metric labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register => "register",
            Command::JoinSeat => "join_seat",
            Command::LeaveSeat => "leave_seat",
            Command::SetSeatStatus { .. } => "set_seat_status",
            Command::RequestSpeak => "request_speak",
            Command::ObjectFloor => "object_floor",
            Command::SetQueueItemActive(_) => "set_queue_item_active",
            Command::CompleteQueueItem(_) => "complete_queue_item",
            Command::CompleteActiveQueueItem => "complete_active_queue_item",
            Command::CreateProposal(_) => "create_proposal",
            Command::UpdateProposal(..) => "update_proposal",
            Command::CastVote(..) => "cast_vote",
            Command::SetStupid(..) => "set_stupid",
            Command::EndVoting(_) => "end_voting",
            Command::RemoveProposal(_) => "remove_proposal",
            Command::UpdateAttributes(..) => "update_attributes",
            Command::ImposeFine { .. } => "impose_fine",
            Command::CallBreak => "call_break",
            Command::EndBreak => "end_break",
            Command::EndSession => "end_session",
        }
    }
}
