//! Authorization gate.
//!
//! Every command passes through [`authorize`] before any component is
//! touched. The lifecycle gate runs first, then the command's declared
//! permission is checked against the actor's role.

use common::types::ParticipantId;

use super::command::Command;
use super::lifecycle::SessionMode;
use super::registry::Participant;
use super::seat::{self, SeatAuthority, SeatStatus};
use super::state::FloorState;
use crate::errors::FloorError;

/// Who may issue a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    AnyParticipant,
    PresidentOnly,
    SelfOnly(ParticipantId),
    SelfOrPresident(ParticipantId),
}

/// Reject everything once ended, and non-president commands during a break.
pub fn gate_lifecycle(is_president: bool, mode: SessionMode) -> Result<(), FloorError> {
    match mode {
        SessionMode::Ended => Err(FloorError::SessionEnded),
        SessionMode::OnBreak if !is_president => Err(FloorError::OnBreak),
        _ => Ok(()),
    }
}

fn seat_permission(
    target: &ParticipantId,
    from: SeatStatus,
    to: SeatStatus,
) -> Result<Permission, FloorError> {
    match seat::transition(from, to) {
        Some(SeatAuthority::SelfOnly) => Ok(Permission::SelfOnly(target.clone())),
        Some(SeatAuthority::SelfOrPresident) => Ok(Permission::SelfOrPresident(target.clone())),
        Some(SeatAuthority::PresidentOnly) => Ok(Permission::PresidentOnly),
        None => Err(FloorError::InvalidTransition(format!(
            "{target}: {from} -> {to}"
        ))),
    }
}

/// Resolve the permission a command requires in the current state.
pub fn required_permission(
    actor: &Participant,
    command: &Command,
    state: &FloorState,
) -> Result<Permission, FloorError> {
    match command {
        Command::Register | Command::JoinSeat | Command::LeaveSeat | Command::CastVote(..) => {
            Ok(Permission::AnyParticipant)
        }
        Command::RequestSpeak => {
            seat_permission(&actor.id, actor.seat_status, SeatStatus::RequestingToSpeak)
        }
        Command::ObjectFloor => seat_permission(&actor.id, actor.seat_status, SeatStatus::Objecting),
        Command::SetSeatStatus { target, status } => {
            let from = state.registry().require(target)?.seat_status;
            seat_permission(target, from, *status)
        }
        Command::SetQueueItemActive(_)
        | Command::CompleteQueueItem(_)
        | Command::CompleteActiveQueueItem
        | Command::CreateProposal(_)
        | Command::UpdateProposal(..)
        | Command::SetStupid(..)
        | Command::EndVoting(_)
        | Command::RemoveProposal(_)
        | Command::UpdateAttributes(..)
        | Command::ImposeFine { .. }
        | Command::CallBreak
        | Command::EndBreak
        | Command::EndSession => Ok(Permission::PresidentOnly),
    }
}

/// Check a resolved permission against the actor.
pub fn check_permission(actor: &Participant, permission: &Permission) -> Result<(), FloorError> {
    let allowed = match permission {
        Permission::AnyParticipant => true,
        Permission::PresidentOnly => actor.is_president(),
        Permission::SelfOnly(target) => actor.id == *target,
        Permission::SelfOrPresident(target) => actor.id == *target || actor.is_president(),
    };
    if allowed {
        Ok(())
    } else {
        Err(FloorError::Forbidden(format!(
            "{} may not perform this operation",
            actor.id
        )))
    }
}

/// The single authorization gate.
pub fn authorize(actor: &Participant, command: &Command, state: &FloorState) -> Result<(), FloorError> {
    gate_lifecycle(actor.is_president(), state.mode())?;
    let permission = required_permission(actor, command, state)?;
    check_permission(actor, &permission)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::floor::registry::Role;

    fn participant(id: &str, role: Role) -> Participant {
        Participant {
            id: ParticipantId::from(id),
            role,
            present: true,
            seat_status: SeatStatus::Neutral,
            electoral_strength: 1,
            party_affiliation: String::new(),
            fines: 0,
        }
    }

    #[test]
    fn test_lifecycle_gate_order() {
        assert_eq!(
            gate_lifecycle(true, SessionMode::Ended).unwrap_err(),
            FloorError::SessionEnded
        );
        assert_eq!(
            gate_lifecycle(false, SessionMode::OnBreak).unwrap_err(),
            FloorError::OnBreak
        );
        assert!(gate_lifecycle(true, SessionMode::OnBreak).is_ok());
        assert!(gate_lifecycle(false, SessionMode::Active).is_ok());
    }

    #[test]
    fn test_permission_checks() {
        let member = participant("alice", Role::Member);
        let president = participant("speaker", Role::President);
        let alice = ParticipantId::from("alice");

        assert!(check_permission(&member, &Permission::AnyParticipant).is_ok());
        assert!(matches!(
            check_permission(&member, &Permission::PresidentOnly).unwrap_err(),
            FloorError::Forbidden(_)
        ));
        assert!(check_permission(&president, &Permission::PresidentOnly).is_ok());
        assert!(check_permission(&member, &Permission::SelfOnly(alice.clone())).is_ok());
        assert!(check_permission(&president, &Permission::SelfOnly(alice.clone())).is_err());
        assert!(check_permission(&president, &Permission::SelfOrPresident(alice.clone())).is_ok());

        let bob = participant("bob", Role::Member);
        assert!(check_permission(&bob, &Permission::SelfOrPresident(alice)).is_err());
    }

    #[test]
    fn test_seat_permission_from_table() {
        let alice = ParticipantId::from("alice");
        assert_eq!(
            seat_permission(&alice, SeatStatus::Objecting, SeatStatus::Neutral).unwrap(),
            Permission::PresidentOnly
        );
        assert!(matches!(
            seat_permission(&alice, SeatStatus::Neutral, SeatStatus::Speaking).unwrap_err(),
            FloorError::InvalidTransition(_)
        ));
    }
}
