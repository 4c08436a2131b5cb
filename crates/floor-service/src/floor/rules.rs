//! Vote requirements (threshold rules) and tally arithmetic.
//!
//! A vote requirement is a pure function of `(for, against, eligible)` weight.
//! Tally computation never looks at the rule, so adding a threshold only
//! touches this table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ledger::{ProposalCategory, VoteChoice};

/// Weighted tally of a proposal's votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Sum of electoral strength voting `For`.
    pub total_for: u64,
    /// Sum of electoral strength voting `Against`.
    pub total_against: u64,
    /// Sum of electoral strength voting `Abstain` (turnout only).
    pub total_abstain: u64,
    /// Number of participants who cast any vote.
    pub turnout: u32,
}

impl Tally {
    /// Compute a weighted tally from `(choice, weight)` pairs.
    pub fn compute<I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (VoteChoice, u32)>,
    {
        votes
            .into_iter()
            .fold(Tally::default(), |mut tally, (choice, weight)| {
                let weight = u64::from(weight);
                match choice {
                    VoteChoice::For => tally.total_for += weight,
                    VoteChoice::Against => tally.total_against += weight,
                    VoteChoice::Abstain => tally.total_abstain += weight,
                }
                tally.turnout += 1;
                tally
            })
    }
}

/// Named threshold rule deciding pass/fail from a tally.
///
/// - `RelativeMajority`: `For` strictly exceeds `Against` (ties fail)
/// - `AbsoluteMajority`: `For` exceeds half of the eligible weight
/// - `Qualified`: `For` reaches `numerator/denominator` of the pro/con votes
///   cast; abstentions count toward turnout only
/// - `QualifiedOfEligible`: `For` reaches `numerator/denominator` of the
///   eligible weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum VoteRequirement {
    #[default]
    RelativeMajority,
    AbsoluteMajority,
    Qualified { numerator: u32, denominator: u32 },
    QualifiedOfEligible { numerator: u32, denominator: u32 },
}

impl VoteRequirement {
    /// Two-thirds of the votes cast.
    pub const TWO_THIRDS: VoteRequirement = VoteRequirement::Qualified {
        numerator: 2,
        denominator: 3,
    };

    /// Apply the rule to a frozen tally.
    ///
    /// Ratios are cross-multiplied in `u128`: a `u32` ratio term times a
    /// summed `u64` weight cannot overflow it.
    #[must_use]
    pub fn is_satisfied(&self, tally: &Tally, eligible_weight: u64) -> bool {
        let total_for = u128::from(tally.total_for);
        let total_against = u128::from(tally.total_against);
        let eligible = u128::from(eligible_weight);
        match *self {
            VoteRequirement::RelativeMajority => total_for > total_against,
            VoteRequirement::AbsoluteMajority => total_for * 2 > eligible,
            VoteRequirement::Qualified {
                numerator,
                denominator,
            } => {
                let cast = total_for + total_against;
                total_for > 0
                    && total_for * u128::from(denominator) >= u128::from(numerator) * cast
            }
            VoteRequirement::QualifiedOfEligible {
                numerator,
                denominator,
            } => {
                eligible > 0
                    && total_for * u128::from(denominator) >= u128::from(numerator) * eligible
            }
        }
    }

    /// Check that a qualified ratio is well-formed.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            VoteRequirement::Qualified {
                numerator,
                denominator,
            }
            | VoteRequirement::QualifiedOfEligible {
                numerator,
                denominator,
            } => {
                if denominator == 0 || numerator == 0 || numerator > denominator {
                    Err(format!(
                        "Invalid ratio {numerator}/{denominator}: must satisfy 0 < n <= d"
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Human-readable description of the rule.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            VoteRequirement::RelativeMajority => "relative majority".to_string(),
            VoteRequirement::AbsoluteMajority => "absolute majority".to_string(),
            VoteRequirement::Qualified {
                numerator,
                denominator,
            } => format!("qualified majority ({numerator}/{denominator} of votes cast)"),
            VoteRequirement::QualifiedOfEligible {
                numerator,
                denominator,
            } => format!("qualified majority ({numerator}/{denominator} of eligible)"),
        }
    }
}

impl fmt::Display for VoteRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

fn parse_ratio(s: &str) -> Result<(u32, u32), String> {
    let (n, d) = s
        .split_once('/')
        .ok_or_else(|| format!("Expected a ratio like 2/3, got {s}"))?;
    let n = n.trim().parse().map_err(|_| format!("Invalid numerator in {s}"))?;
    let d = d
        .trim()
        .parse()
        .map_err(|_| format!("Invalid denominator in {s}"))?;
    Ok((n, d))
}

impl FromStr for VoteRequirement {
    type Err = String;

    /// Parses `relative`, `absolute`, `qualified:N/D` and `eligible:N/D`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let rule = match lowered.as_str() {
            "relative" | "relative_majority" => VoteRequirement::RelativeMajority,
            "absolute" | "absolute_majority" => VoteRequirement::AbsoluteMajority,
            other => {
                if let Some(ratio) = other.strip_prefix("qualified:") {
                    let (numerator, denominator) = parse_ratio(ratio)?;
                    VoteRequirement::Qualified {
                        numerator,
                        denominator,
                    }
                } else if let Some(ratio) = other.strip_prefix("eligible:") {
                    let (numerator, denominator) = parse_ratio(ratio)?;
                    VoteRequirement::QualifiedOfEligible {
                        numerator,
                        denominator,
                    }
                } else {
                    return Err(format!(
                        "Unknown vote requirement: {s}. Valid: relative, absolute, qualified:N/D, eligible:N/D"
                    ));
                }
            }
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Default vote requirement per proposal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequirementDefaults {
    pub normal: VoteRequirement,
    pub priority: VoteRequirement,
    pub constitutional: VoteRequirement,
}

impl Default for RequirementDefaults {
    fn default() -> Self {
        Self {
            normal: VoteRequirement::RelativeMajority,
            priority: VoteRequirement::RelativeMajority,
            constitutional: VoteRequirement::TWO_THIRDS,
        }
    }
}

impl RequirementDefaults {
    /// The rule applied when a proposal is created without an explicit one.
    #[must_use]
    pub fn for_category(&self, category: ProposalCategory) -> VoteRequirement {
        match category {
            ProposalCategory::Normal => self.normal,
            ProposalCategory::Priority => self.priority,
            ProposalCategory::Constitutional => self.constitutional,
        }
    }
}
