//! Message types for the floor actor.
//!
//! Requests carry a `oneshot` sender for the reply.

use common::types::ParticipantId;
use tokio::sync::oneshot;

use crate::errors::FloorError;
use crate::floor::{Command, EventEnvelope, FineRecord};

#[derive(Debug)]
pub enum FloorMessage {
    /// Authorize and apply a command.
    ///
    /// The reply is sent only after the resulting events were published.
    Execute {
        actor: ParticipantId,
        command: Command,
        respond_to: oneshot::Sender<Result<Vec<EventEnvelope>, FloorError>>,
    },

    /// The fine book.
    GetFines {
        respond_to: oneshot::Sender<Vec<FineRecord>>,
    },
}
