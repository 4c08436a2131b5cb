//! Authoritative session state for a parliamentary floor.
//!
//! Components, leaves first:
//!
//! ```text
//! FloorState
//! ├── Registry          participants, roles, presence, fines
//! ├── seat              seat status transition table
//! ├── BusinessQueue     speaker requests, objections, discussions
//! ├── Ledger            proposals, votes, tallies
//! └── SessionLifecycle  ACTIVE / ON_BREAK / ENDED
//! ```
//!
//! All mutation goes through [`FloorState::execute`], which runs the
//! [`policy::authorize`] gate before touching any component.

pub mod command;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod policy;
pub mod queue;
pub mod registry;
pub mod rules;
pub mod seat;
pub mod state;

pub use command::Command;
pub use events::{EventEnvelope, FloorEvent, ProposalView, QueueChange, Snapshot};
pub use ledger::{
    Association, AssociationKind, Proposal, ProposalCategory, ProposalPatch, ProposalSpec,
    VoteChoice,
};
pub use lifecycle::SessionMode;
pub use queue::{QueueItem, QueueItemKind, QueueItemStatus, QueueSubject};
pub use registry::{AttributePatch, FineRecord, Participant, Role};
pub use rules::{RequirementDefaults, Tally, VoteRequirement};
pub use seat::SeatStatus;
pub use state::{FloorSettings, FloorState};
