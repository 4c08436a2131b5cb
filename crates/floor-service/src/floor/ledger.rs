//! Proposal ledger: proposals, per-participant votes and the voting lifecycle.
//!
//! Open proposals never store a tally; it is derived from the vote map on
//! demand. Ending voting computes it once and freezes it with the outcome.

use std::collections::BTreeMap;
use std::fmt;

use common::types::{ParticipantId, ProposalId};
use serde::{Deserialize, Serialize};

use super::rules::{RequirementDefaults, Tally, VoteRequirement};
use crate::errors::FloorError;

/// Party recorded when the proposer does not name one.
pub const DEFAULT_PARTY: &str = "President";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalCategory {
    #[default]
    Normal,
    Priority,
    Constitutional,
}

impl ProposalCategory {
    fn label(self, number: u32) -> String {
        match self {
            ProposalCategory::Normal => number.to_string(),
            ProposalCategory::Priority => format!("P{number}"),
            ProposalCategory::Constitutional => format!("C{number}"),
        }
    }
}

impl fmt::Display for ProposalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalCategory::Normal => "NORMAL",
            ProposalCategory::Priority => "PRIORITY",
            ProposalCategory::Constitutional => "CONSTITUTIONAL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    /// Amends the referenced proposal.
    Additive,
    /// Competes with the referenced proposal.
    Countering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub kind: AssociationKind,
    pub proposal_id: ProposalId,
}

/// Input for creating a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProposalSpec {
    pub title: String,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub category: ProposalCategory,
    #[serde(default)]
    pub requirement: Option<VoteRequirement>,
    #[serde(default)]
    pub association: Option<Association>,
}

/// Editable proposal fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProposalPatch {
    pub title: Option<String>,
    pub party: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub number: u32,
    pub label: String,
    pub title: String,
    pub party: String,
    pub category: ProposalCategory,
    pub requirement: VoteRequirement,
    pub association: Option<Association>,
    pub stupid: bool,
    pub voting_ended: bool,
    pub votes: BTreeMap<ParticipantId, VoteChoice>,
    /// Frozen when voting ends; absent while open.
    pub final_tally: Option<Tally>,
    pub eligible_weight: Option<u64>,
    pub passed: Option<bool>,
}

impl Proposal {
    /// Current tally: frozen if closed, derived if open, none if stupid.
    pub fn tally<F>(&self, weight_of: F) -> Option<Tally>
    where
        F: Fn(&ParticipantId) -> u32,
    {
        if self.voting_ended {
            return self.final_tally;
        }
        if self.stupid {
            return None;
        }
        Some(Tally::compute(
            self.votes
                .iter()
                .map(|(voter, choice)| (*choice, weight_of(voter))),
        ))
    }
}

fn non_empty(field: &str, value: &str) -> Result<String, FloorError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FloorError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone)]
pub struct Ledger {
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: u64,
    numbers: BTreeMap<ProposalCategory, u32>,
    defaults: RequirementDefaults,
}

impl Ledger {
    #[must_use]
    pub fn new(defaults: RequirementDefaults) -> Self {
        Self {
            proposals: BTreeMap::new(),
            next_id: 1,
            numbers: BTreeMap::new(),
            defaults,
        }
    }

    #[must_use]
    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn require(&self, id: ProposalId) -> Result<&Proposal, FloorError> {
        self.proposals
            .get(&id)
            .ok_or_else(|| FloorError::NotFound(format!("Proposal {id}")))
    }

    fn require_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, FloorError> {
        self.proposals
            .get_mut(&id)
            .ok_or_else(|| FloorError::NotFound(format!("Proposal {id}")))
    }

    fn require_open_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, FloorError> {
        let proposal = self.require_mut(id)?;
        if proposal.voting_ended {
            return Err(FloorError::Immutable(format!(
                "Proposal {id} is closed"
            )));
        }
        Ok(proposal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> + Clone {
        self.proposals.values()
    }

    /// Validate a creation spec without touching the ledger.
    pub fn check_spec(&self, spec: &ProposalSpec) -> Result<(), FloorError> {
        non_empty("Title", &spec.title)?;
        if let Some(party) = &spec.party {
            non_empty("Party", party)?;
        }
        if let Some(requirement) = &spec.requirement {
            requirement.validate().map_err(FloorError::Validation)?;
        }
        if let Some(association) = &spec.association {
            self.require(association.proposal_id)?;
        }
        Ok(())
    }

    /// Create a proposal with the next number in its category.
    pub fn create(&mut self, spec: ProposalSpec) -> Result<Proposal, FloorError> {
        self.check_spec(&spec)?;
        let title = non_empty("Title", &spec.title)?;
        let party = match &spec.party {
            Some(party) => non_empty("Party", party)?,
            None => DEFAULT_PARTY.to_string(),
        };

        let number = self.numbers.get(&spec.category).copied().unwrap_or(0) + 1;
        let mut label = spec.category.label(number);
        if let Some(association) = &spec.association {
            let referenced = &self.require(association.proposal_id)?.label;
            let joiner = match association.kind {
                AssociationKind::Additive => " → ",
                AssociationKind::Countering => " x ",
            };
            label = format!("{label}{joiner}{referenced}");
        }

        let id = ProposalId(self.next_id);
        let proposal = Proposal {
            id,
            number,
            label,
            title,
            party,
            category: spec.category,
            requirement: spec
                .requirement
                .unwrap_or_else(|| self.defaults.for_category(spec.category)),
            association: spec.association,
            stupid: false,
            voting_ended: false,
            votes: BTreeMap::new(),
            final_tally: None,
            eligible_weight: None,
            passed: None,
        };

        self.next_id += 1;
        self.numbers.insert(spec.category, number);
        self.proposals.insert(id, proposal.clone());
        Ok(proposal)
    }

    pub fn update(&mut self, id: ProposalId, patch: ProposalPatch) -> Result<&Proposal, FloorError> {
        let title = patch.title.as_deref().map(|t| non_empty("Title", t)).transpose()?;
        let party = patch.party.as_deref().map(|p| non_empty("Party", p)).transpose()?;

        let proposal = self.require_open_mut(id)?;
        if let Some(title) = title {
            proposal.title = title;
        }
        if let Some(party) = party {
            proposal.party = party;
        }
        Ok(proposal)
    }

    /// Record or overwrite a participant's vote.
    pub fn cast_vote(
        &mut self,
        id: ProposalId,
        voter: &ParticipantId,
        voter_present: bool,
        choice: VoteChoice,
    ) -> Result<&Proposal, FloorError> {
        let proposal = self.require_mut(id)?;
        if proposal.voting_ended {
            return Err(FloorError::VotingClosed(id.to_string()));
        }
        if !voter_present {
            return Err(FloorError::NotEligible(format!(
                "{voter} must be present to vote"
            )));
        }
        if proposal.stupid {
            return Err(FloorError::Stupid(id.to_string()));
        }
        proposal.votes.insert(voter.clone(), choice);
        Ok(proposal)
    }

    /// Toggle the stupid flag. Recorded votes are kept.
    pub fn set_stupid(&mut self, id: ProposalId, stupid: bool) -> Result<&Proposal, FloorError> {
        let proposal = self.require_open_mut(id)?;
        proposal.stupid = stupid;
        Ok(proposal)
    }

    /// Close every open proposal of `category`, returning them in id order.
    pub fn end_voting<F>(
        &mut self,
        category: ProposalCategory,
        weight_of: F,
        eligible_weight: u64,
    ) -> Vec<Proposal>
    where
        F: Fn(&ParticipantId) -> u32,
    {
        self.proposals
            .values_mut()
            .filter(|p| p.category == category && !p.voting_ended)
            .map(|proposal| {
                if proposal.stupid {
                    proposal.passed = Some(false);
                } else {
                    let tally = Tally::compute(
                        proposal
                            .votes
                            .iter()
                            .map(|(voter, choice)| (*choice, weight_of(voter))),
                    );
                    proposal.passed = Some(proposal.requirement.is_satisfied(&tally, eligible_weight));
                    proposal.final_tally = Some(tally);
                }
                proposal.eligible_weight = Some(eligible_weight);
                proposal.voting_ended = true;
                proposal.clone()
            })
            .collect()
    }

    /// Hard delete an open proposal.
    pub fn remove(&mut self, id: ProposalId) -> Result<Proposal, FloorError> {
        self.require_open_mut(id)?;
        self.proposals
            .remove(&id)
            .ok_or_else(|| FloorError::NotFound(format!("Proposal {id}")))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(RequirementDefaults::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn spec(title: &str, category: ProposalCategory) -> ProposalSpec {
        ProposalSpec {
            title: title.to_string(),
            party: None,
            category,
            requirement: None,
            association: None,
        }
    }

    fn weights(id: &ParticipantId) -> u32 {
        match id.as_str() {
            "y" => 2,
            _ => 1,
        }
    }

    #[test]
    fn test_numbering_and_labels_per_category() {
        let mut ledger = Ledger::default();
        let a = ledger.create(spec("Budget", ProposalCategory::Normal)).unwrap();
        let b = ledger.create(spec("Urgent", ProposalCategory::Priority)).unwrap();
        let c = ledger.create(spec("Charter", ProposalCategory::Constitutional)).unwrap();
        let d = ledger.create(spec("Parks", ProposalCategory::Normal)).unwrap();

        assert_eq!(a.label, "1");
        assert_eq!(b.label, "P1");
        assert_eq!(c.label, "C1");
        assert_eq!(d.label, "2");
        assert_eq!(a.party, DEFAULT_PARTY);
        assert_eq!(c.requirement, VoteRequirement::TWO_THIRDS);
    }

    #[test]
    fn test_numbers_not_reused_after_removal() {
        let mut ledger = Ledger::default();
        let a = ledger.create(spec("One", ProposalCategory::Normal)).unwrap();
        ledger.remove(a.id).unwrap();
        let b = ledger.create(spec("Two", ProposalCategory::Normal)).unwrap();
        assert_eq!(b.number, 2);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_association_labels() {
        let mut ledger = Ledger::default();
        let base = ledger.create(spec("Base", ProposalCategory::Priority)).unwrap();

        let mut amend = spec("Amend", ProposalCategory::Normal);
        amend.association = Some(Association {
            kind: AssociationKind::Additive,
            proposal_id: base.id,
        });
        assert_eq!(ledger.create(amend).unwrap().label, "1 → P1");

        let mut counter = spec("Counter", ProposalCategory::Normal);
        counter.association = Some(Association {
            kind: AssociationKind::Countering,
            proposal_id: base.id,
        });
        assert_eq!(ledger.create(counter).unwrap().label, "2 x P1");

        let mut dangling = spec("Dangling", ProposalCategory::Normal);
        dangling.association = Some(Association {
            kind: AssociationKind::Countering,
            proposal_id: ProposalId(99),
        });
        assert!(matches!(ledger.create(dangling).unwrap_err(), FloorError::NotFound(_)));
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut ledger = Ledger::default();
        let err = ledger.create(spec("  ", ProposalCategory::Normal)).unwrap_err();
        assert!(matches!(err, FloorError::Validation(_)));

        let mut blank_party = spec("Title", ProposalCategory::Normal);
        blank_party.party = Some(String::new());
        assert!(ledger.create(blank_party).is_err());
        assert_eq!(ledger.iter().count(), 0);
    }

    #[test]
    fn test_revote_overwrites() {
        let mut ledger = Ledger::default();
        let p = ledger.create(spec("Budget", ProposalCategory::Normal)).unwrap();
        let x = ParticipantId::from("x");

        ledger.cast_vote(p.id, &x, true, VoteChoice::For).unwrap();
        let proposal = ledger.cast_vote(p.id, &x, true, VoteChoice::Against).unwrap();

        assert_eq!(proposal.votes.len(), 1);
        assert_eq!(proposal.votes.get(&x), Some(&VoteChoice::Against));
    }

    #[test]
    fn test_vote_preconditions() {
        let mut ledger = Ledger::default();
        let p = ledger.create(spec("Budget", ProposalCategory::Normal)).unwrap();
        let x = ParticipantId::from("x");

        assert!(matches!(
            ledger.cast_vote(p.id, &x, false, VoteChoice::For).unwrap_err(),
            FloorError::NotEligible(_)
        ));

        ledger.set_stupid(p.id, true).unwrap();
        assert!(matches!(
            ledger.cast_vote(p.id, &x, true, VoteChoice::For).unwrap_err(),
            FloorError::Stupid(_)
        ));

        ledger.end_voting(ProposalCategory::Normal, weights, 1);
        assert!(matches!(
            ledger.cast_vote(p.id, &x, true, VoteChoice::For).unwrap_err(),
            FloorError::VotingClosed(_)
        ));
    }

    #[test]
    fn test_weighted_tally_relative_majority_fails() {
        let mut ledger = Ledger::default();
        let p = ledger.create(spec("Budget", ProposalCategory::Normal)).unwrap();
        ledger
            .cast_vote(p.id, &ParticipantId::from("x"), true, VoteChoice::For)
            .unwrap();
        ledger
            .cast_vote(p.id, &ParticipantId::from("y"), true, VoteChoice::Against)
            .unwrap();

        let closed = ledger.end_voting(ProposalCategory::Normal, weights, 3);
        let closed = closed.first().unwrap();
        let tally = closed.final_tally.unwrap();
        assert_eq!(tally.total_for, 1);
        assert_eq!(tally.total_against, 2);
        assert_eq!(closed.passed, Some(false));
    }

    #[test]
    fn test_end_voting_only_touches_category() {
        let mut ledger = Ledger::default();
        let normal = ledger.create(spec("N", ProposalCategory::Normal)).unwrap();
        let priority = ledger.create(spec("P", ProposalCategory::Priority)).unwrap();

        let closed = ledger.end_voting(ProposalCategory::Priority, weights, 0);
        assert_eq!(closed.len(), 1);
        assert!(ledger.get(priority.id).unwrap().voting_ended);
        assert!(!ledger.get(normal.id).unwrap().voting_ended);

        // Already closed proposals are not recomputed
        assert!(ledger
            .end_voting(ProposalCategory::Priority, weights, 0)
            .is_empty());
    }

    #[test]
    fn test_stupid_proposal_frozen_without_tally() {
        let mut ledger = Ledger::default();
        let p = ledger.create(spec("Silly", ProposalCategory::Normal)).unwrap();
        ledger
            .cast_vote(p.id, &ParticipantId::from("x"), true, VoteChoice::For)
            .unwrap();
        ledger.set_stupid(p.id, true).unwrap();

        let stored = ledger.get(p.id).unwrap();
        assert_eq!(stored.votes.len(), 1);
        assert_eq!(stored.tally(weights), None);

        ledger.end_voting(ProposalCategory::Normal, weights, 1);
        let stored = ledger.get(p.id).unwrap();
        assert!(stored.voting_ended);
        assert_eq!(stored.final_tally, None);
        assert_eq!(stored.passed, Some(false));
    }

    #[test]
    fn test_closed_proposal_is_immutable() {
        let mut ledger = Ledger::default();
        let p = ledger.create(spec("Budget", ProposalCategory::Normal)).unwrap();
        ledger.end_voting(ProposalCategory::Normal, weights, 0);

        assert!(matches!(ledger.remove(p.id).unwrap_err(), FloorError::Immutable(_)));
        assert!(matches!(
            ledger.set_stupid(p.id, true).unwrap_err(),
            FloorError::Immutable(_)
        ));
        assert!(matches!(
            ledger
                .update(
                    p.id,
                    ProposalPatch {
                        title: Some("New".to_string()),
                        party: None
                    }
                )
                .unwrap_err(),
            FloorError::Immutable(_)
        ));
    }

    #[test]
    fn test_update_rejects_empty_fields() {
        let mut ledger = Ledger::default();
        let p = ledger.create(spec("Budget", ProposalCategory::Normal)).unwrap();
        assert!(ledger
            .update(
                p.id,
                ProposalPatch {
                    title: Some("Budget 2".to_string()),
                    party: Some(String::new()),
                },
            )
            .is_err());
        assert_eq!(ledger.get(p.id).unwrap().title, "Budget");

        let updated = ledger
            .update(
                p.id,
                ProposalPatch {
                    title: None,
                    party: Some("Greens".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.party, "Greens");
    }
}
