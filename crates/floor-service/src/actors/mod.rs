//! Actor serializing every command against the floor state.
//!
//! ```text
//! HTTP handlers ──mpsc──► FloorActor (owns FloorState)
//!                              │
//!                              └──► BroadcastCoordinator ──► observers
//! ```
//!
//! - [`floor`] - `FloorActor` and its cloneable handle
//! - [`messages`] - Message types for the mailbox
//! - [`metrics`] - Mailbox depth monitoring

pub mod floor;
pub mod messages;
pub mod metrics;

pub use floor::{FloorActor, FloorActorConfig, FloorActorHandle};
pub use messages::FloorMessage;
pub use metrics::{MailboxLevel, MailboxMonitor};
