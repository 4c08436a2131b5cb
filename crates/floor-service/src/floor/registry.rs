//! Participant registry.
//!
//! Leaf data owner for identity, role, presence, seat status and the
//! display/weight attributes. Participants are never deleted; leaving the
//! floor only clears presence so historical votes stay attributable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::types::ParticipantId;
use serde::{Deserialize, Serialize};

use super::seat::SeatStatus;
use crate::errors::FloorError;

/// Longest identity accepted at registration.
pub const MAX_IDENTITY_LEN: usize = 64;

/// Participant role. Exactly one participant holds `President`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    President,
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub role: Role,
    pub present: bool,
    pub seat_status: SeatStatus,
    pub electoral_strength: u32,
    pub party_affiliation: String,
    pub fines: u64,
}

impl Participant {
    fn new(id: ParticipantId, role: Role) -> Self {
        Self {
            id,
            role,
            present: false,
            seat_status: SeatStatus::Neutral,
            electoral_strength: 1,
            party_affiliation: String::new(),
            fines: 0,
        }
    }

    #[must_use]
    pub fn is_president(&self) -> bool {
        self.role == Role::President
    }
}

/// Privileged roster edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AttributePatch {
    pub electoral_strength: Option<u32>,
    pub party_affiliation: Option<String>,
    pub role: Option<Role>,
}

/// Entry in the fine book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineRecord {
    pub fine_id: String,
    pub participant_id: ParticipantId,
    pub amount: u64,
    pub reason: String,
    pub issued_by: ParticipantId,
    pub issued_at: DateTime<Utc>,
}

/// Validate an identity handed over by the auth collaborator.
pub fn validate_identity(identity: &str) -> Result<(), FloorError> {
    if identity.is_empty() || identity.trim() != identity {
        return Err(FloorError::Validation(
            "Identity must be non-empty and must not carry surrounding whitespace".to_string(),
        ));
    }
    if identity.chars().count() > MAX_IDENTITY_LEN {
        return Err(FloorError::Validation(format!(
            "Identity exceeds {MAX_IDENTITY_LEN} characters"
        )));
    }
    if identity.chars().any(char::is_whitespace) {
        return Err(FloorError::Validation(
            "Identity must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    participants: BTreeMap<ParticipantId, Participant>,
    fine_book: Vec<FineRecord>,
}

impl Registry {
    /// Registry seeded with the bootstrap president.
    pub fn with_president(president: ParticipantId) -> Result<Self, FloorError> {
        validate_identity(president.as_str())?;
        let mut registry = Self::default();
        registry.participants.insert(
            president.clone(),
            Participant::new(president, Role::President),
        );
        Ok(registry)
    }

    /// Register a new member.
    pub fn register(&mut self, id: &ParticipantId) -> Result<&Participant, FloorError> {
        validate_identity(id.as_str())?;
        if self.participants.contains_key(id) {
            return Err(FloorError::DuplicateIdentity(id.to_string()));
        }
        Ok(self
            .participants
            .entry(id.clone())
            .or_insert_with(|| Participant::new(id.clone(), Role::Member)))
    }

    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn require(&self, id: &ParticipantId) -> Result<&Participant, FloorError> {
        self.participants
            .get(id)
            .ok_or_else(|| FloorError::NotFound(format!("Participant {id}")))
    }

    pub(crate) fn require_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant, FloorError> {
        self.participants
            .get_mut(id)
            .ok_or_else(|| FloorError::NotFound(format!("Participant {id}")))
    }

    /// Participants in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> + Clone {
        self.participants.values()
    }

    #[must_use]
    pub fn president(&self) -> Option<&Participant> {
        self.participants.values().find(|p| p.is_president())
    }

    /// Electoral strength of a participant, zero when unknown.
    #[must_use]
    pub fn strength_of(&self, id: &ParticipantId) -> u32 {
        self.participants
            .get(id)
            .map_or(0, |p| p.electoral_strength)
    }

    /// Sum of electoral strength over present participants.
    #[must_use]
    pub fn eligible_weight(&self) -> u64 {
        self.participants
            .values()
            .filter(|p| p.present)
            .map(|p| u64::from(p.electoral_strength))
            .sum()
    }

    /// Check an attribute patch without applying it.
    pub fn validate_patch(&self, id: &ParticipantId, patch: &AttributePatch) -> Result<(), FloorError> {
        let target = self.require(id)?;
        if patch.electoral_strength == Some(0) {
            return Err(FloorError::Validation(
                "Electoral strength must be positive".to_string(),
            ));
        }
        if patch.role == Some(Role::Member) && target.is_president() {
            return Err(FloorError::Conflict(
                "The presidency moves only by promoting another participant".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a validated attribute patch, returning the ids whose record changed.
    ///
    /// Promoting a participant demotes the previous president in the same step.
    pub fn apply_patch(
        &mut self,
        id: &ParticipantId,
        patch: AttributePatch,
    ) -> Result<Vec<ParticipantId>, FloorError> {
        self.validate_patch(id, &patch)?;
        let mut changed = vec![id.clone()];

        if patch.role == Some(Role::President) {
            let previous = self
                .president()
                .map(|p| p.id.clone())
                .filter(|previous| previous != id);
            if let Some(previous) = previous {
                self.require_mut(&previous)?.role = Role::Member;
                changed.push(previous);
            }
        }

        let target = self.require_mut(id)?;
        if let Some(strength) = patch.electoral_strength {
            target.electoral_strength = strength;
        }
        if let Some(party) = patch.party_affiliation {
            target.party_affiliation = party.trim().to_string();
        }
        if let Some(role) = patch.role {
            target.role = role;
        }
        Ok(changed)
    }

    /// Record a fine and add it to the participant's running total.
    pub fn impose_fine(
        &mut self,
        target: &ParticipantId,
        amount: u64,
        reason: &str,
        issued_by: &ParticipantId,
    ) -> Result<FineRecord, FloorError> {
        if amount == 0 {
            return Err(FloorError::Validation(
                "Fine amount must be positive".to_string(),
            ));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(FloorError::Validation(
                "Fine reason is required".to_string(),
            ));
        }

        let participant = self.require_mut(target)?;
        participant.fines = participant.fines.saturating_add(amount);

        let record = FineRecord {
            fine_id: format!("FINE-{}", self.fine_book.len() + 1),
            participant_id: target.clone(),
            amount,
            reason: reason.to_string(),
            issued_by: issued_by.clone(),
            issued_at: Utc::now(),
        };
        self.fine_book.push(record.clone());
        Ok(record)
    }

    #[must_use]
    pub fn fines(&self) -> &[FineRecord] {
        &self.fine_book
    }
}
