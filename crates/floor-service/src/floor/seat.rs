//! Seat status state machine.
//!
//! The transition table is data: each edge names who may take it. Anything
//! not listed is an invalid transition.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::queue::QueueItemKind;

/// A participant's floor-interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Neutral,
    RequestingToSpeak,
    Objecting,
    Speaking,
}

impl SeatStatus {
    /// Queue item kind backing a waiting status.
    #[must_use]
    pub fn queue_kind(self) -> Option<QueueItemKind> {
        match self {
            SeatStatus::RequestingToSpeak => Some(QueueItemKind::SpeakerRequest),
            SeatStatus::Objecting => Some(QueueItemKind::Objection),
            SeatStatus::Neutral | SeatStatus::Speaking => None,
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeatStatus::Neutral => "NEUTRAL",
            SeatStatus::RequestingToSpeak => "REQUESTING_TO_SPEAK",
            SeatStatus::Objecting => "OBJECTING",
            SeatStatus::Speaking => "SPEAKING",
        };
        f.write_str(name)
    }
}

/// Who may take a seat transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatAuthority {
    SelfOnly,
    SelfOrPresident,
    PresidentOnly,
}

const TRANSITIONS: &[(SeatStatus, SeatStatus, SeatAuthority)] = &[
    // raise hand
    (
        SeatStatus::Neutral,
        SeatStatus::RequestingToSpeak,
        SeatAuthority::SelfOnly,
    ),
    // object
    (
        SeatStatus::Neutral,
        SeatStatus::Objecting,
        SeatAuthority::SelfOnly,
    ),
    // cancel request
    (
        SeatStatus::RequestingToSpeak,
        SeatStatus::Neutral,
        SeatAuthority::SelfOrPresident,
    ),
    // recognize
    (
        SeatStatus::RequestingToSpeak,
        SeatStatus::Speaking,
        SeatAuthority::PresidentOnly,
    ),
    // overrule objection
    (
        SeatStatus::Objecting,
        SeatStatus::Neutral,
        SeatAuthority::PresidentOnly,
    ),
    // recognize objection
    (
        SeatStatus::Objecting,
        SeatStatus::Speaking,
        SeatAuthority::PresidentOnly,
    ),
    // yield
    (
        SeatStatus::Speaking,
        SeatStatus::Neutral,
        SeatAuthority::SelfOrPresident,
    ),
];

/// Look up the authority for an edge, `None` if the edge is not in the table.
#[must_use]
pub fn transition(from: SeatStatus, to: SeatStatus) -> Option<SeatAuthority> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, authority)| *authority)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SeatStatus; 4] = [
        SeatStatus::Neutral,
        SeatStatus::RequestingToSpeak,
        SeatStatus::Objecting,
        SeatStatus::Speaking,
    ];

    #[test]
    fn test_table_has_exactly_seven_edges() {
        let edges = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| transition(*from, *to).is_some())
            .count();
        assert_eq!(edges, 7);
    }

    #[test]
    fn test_self_loops_are_invalid() {
        for status in ALL {
            assert_eq!(transition(status, status), None);
        }
    }

    #[test]
    fn test_no_direct_neutral_to_speaking() {
        assert_eq!(transition(SeatStatus::Neutral, SeatStatus::Speaking), None);
        assert_eq!(
            transition(SeatStatus::RequestingToSpeak, SeatStatus::Objecting),
            None
        );
    }

    #[test]
    fn test_objection_cancel_is_president_only() {
        assert_eq!(
            transition(SeatStatus::Objecting, SeatStatus::Neutral),
            Some(SeatAuthority::PresidentOnly)
        );
        assert_eq!(
            transition(SeatStatus::RequestingToSpeak, SeatStatus::Neutral),
            Some(SeatAuthority::SelfOrPresident)
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(SeatStatus::RequestingToSpeak.to_string(), "REQUESTING_TO_SPEAK");
        assert_eq!(
            SeatStatus::Objecting.queue_kind(),
            Some(QueueItemKind::Objection)
        );
        assert_eq!(SeatStatus::Speaking.queue_kind(), None);
    }
}
