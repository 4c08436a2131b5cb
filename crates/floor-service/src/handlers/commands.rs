//! Command handlers for the floor service.
//!
//! Every mutating endpoint resolves to exactly one [`Command`] executed by
//! the floor actor on behalf of the authenticated participant:
//!
//! - `POST /api/v1/register` - Register the caller as a member
//! - `POST /api/v1/seat/join`, `/seat/leave` - Presence
//! - `POST /api/v1/seat/status` - Seat status transition (self or president)
//! - `POST /api/v1/seat/request-speak`, `/seat/object` - Raise a hand or object
//! - `POST /api/v1/queue/{id}/activate`, `/queue/{id}/complete`,
//!   `/queue/active/complete` - Business queue (president)
//! - `POST /api/v1/proposals`, `PUT|DELETE /api/v1/proposals/{id}` - Proposals
//! - `POST /api/v1/proposals/{id}/votes` - Cast or change a vote
//! - `POST /api/v1/proposals/{id}/stupid` - Exclude from voting (president)
//! - `POST /api/v1/voting/end` - Close voting for a category (president)
//! - `PATCH /api/v1/participants/{id}` - Roster edit (president)
//! - `POST /api/v1/participants/{id}/fines` - Impose a fine (president)
//! - `POST /api/v1/break`, `/break/end`, `/session/end` - Lifecycle (president)
//!
//! Successful commands answer with the committed events. Bodies are parsed
//! by hand so malformed JSON yields the service's 400 error shape instead
//! of the framework's default rejection.

use crate::errors::FloorError;
use crate::floor::{
    AttributePatch, Command, EventEnvelope, ProposalCategory, ProposalPatch, ProposalSpec,
    SeatStatus, VoteChoice,
};
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use common::types::{ParticipantId, ProposalId, QueueItemId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

/// Events committed by a successful command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub events: Vec<EventEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct SetSeatStatusRequest {
    pub participant_id: ParticipantId,
    pub status: SeatStatus,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub choice: VoteChoice,
}

#[derive(Debug, Deserialize)]
pub struct SetStupidRequest {
    pub stupid: bool,
}

#[derive(Debug, Deserialize)]
pub struct EndVotingRequest {
    pub category: ProposalCategory,
}

#[derive(Debug, Deserialize)]
pub struct ImposeFineRequest {
    pub amount: u64,
    pub reason: String,
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, FloorError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "floor.handlers", error = %e, "Invalid request body");
        FloorError::Validation("Invalid request body".to_string())
    })
}

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, FloorError> {
    raw.parse()
        .map_err(|_| FloorError::Validation(format!("Invalid {what} id: {raw}")))
}

/// Run one command through the floor actor.
///
/// Commit and rejection are logged by the actor.
async fn dispatch(
    state: &AppState,
    actor: ParticipantId,
    command: Command,
) -> Result<Json<CommandResponse>, FloorError> {
    let events = state.floor.execute(actor, command).await?;
    Ok(Json(CommandResponse { events }))
}

// ============================================================================
// Registration and presence
// ============================================================================

/// Handler for POST /api/v1/register
///
/// # Response
///
/// - 201 Created: caller registered as a member
/// - 400 Bad Request: identity fails validation
/// - 409 Conflict: identity already registered
/// - 410 Gone: session ended
#[instrument(skip_all, name = "floor.handlers.register")]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<(StatusCode, Json<CommandResponse>), FloorError> {
    let response = dispatch(&state, actor, Command::Register).await?;
    Ok((StatusCode::CREATED, response))
}

#[instrument(skip_all, name = "floor.handlers.join_seat")]
pub async fn join_seat(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::JoinSeat).await
}

#[instrument(skip_all, name = "floor.handlers.leave_seat")]
pub async fn leave_seat(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::LeaveSeat).await
}

// ============================================================================
// Seat status
// ============================================================================

/// Handler for POST /api/v1/seat/status
///
/// Applies one edge of the seat transition table to `participant_id`.
/// Members may only move themselves; recognition and forced returns to
/// NEUTRAL are the president's.
#[instrument(skip_all, name = "floor.handlers.set_seat_status")]
pub async fn set_seat_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    body: Bytes,
) -> Result<Json<CommandResponse>, FloorError> {
    let request: SetSeatStatusRequest = parse_body(&body)?;
    dispatch(
        &state,
        actor,
        Command::SetSeatStatus {
            target: request.participant_id,
            status: request.status,
        },
    )
    .await
}

#[instrument(skip_all, name = "floor.handlers.request_speak")]
pub async fn request_speak(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::RequestSpeak).await
}

#[instrument(skip_all, name = "floor.handlers.object_floor")]
pub async fn object_floor(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::ObjectFloor).await
}

// ============================================================================
// Business queue
// ============================================================================

#[instrument(skip_all, name = "floor.handlers.activate_queue_item", fields(item_id = %id))]
pub async fn activate_queue_item(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
) -> Result<Json<CommandResponse>, FloorError> {
    let id: QueueItemId = parse_id(&id, "queue item")?;
    dispatch(&state, actor, Command::SetQueueItemActive(id)).await
}

#[instrument(skip_all, name = "floor.handlers.complete_queue_item", fields(item_id = %id))]
pub async fn complete_queue_item(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
) -> Result<Json<CommandResponse>, FloorError> {
    let id: QueueItemId = parse_id(&id, "queue item")?;
    dispatch(&state, actor, Command::CompleteQueueItem(id)).await
}

#[instrument(skip_all, name = "floor.handlers.complete_active_queue_item")]
pub async fn complete_active_queue_item(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::CompleteActiveQueueItem).await
}

// ============================================================================
// Proposals and voting
// ============================================================================

/// Handler for POST /api/v1/proposals
///
/// # Response
///
/// - 201 Created: proposal created and queued for discussion
/// - 400 Bad Request: empty title/party or malformed requirement
/// - 403 Forbidden: caller is not the president
/// - 404 Not Found: associated proposal does not exist
#[instrument(skip_all, name = "floor.handlers.create_proposal")]
pub async fn create_proposal(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    body: Bytes,
) -> Result<(StatusCode, Json<CommandResponse>), FloorError> {
    let spec: ProposalSpec = parse_body(&body)?;
    let response = dispatch(&state, actor, Command::CreateProposal(spec)).await?;
    Ok((StatusCode::CREATED, response))
}

#[instrument(skip_all, name = "floor.handlers.update_proposal", fields(proposal_id = %id))]
pub async fn update_proposal(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CommandResponse>, FloorError> {
    let id: ProposalId = parse_id(&id, "proposal")?;
    let patch: ProposalPatch = parse_body(&body)?;
    dispatch(&state, actor, Command::UpdateProposal(id, patch)).await
}

#[instrument(skip_all, name = "floor.handlers.remove_proposal", fields(proposal_id = %id))]
pub async fn remove_proposal(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
) -> Result<Json<CommandResponse>, FloorError> {
    let id: ProposalId = parse_id(&id, "proposal")?;
    dispatch(&state, actor, Command::RemoveProposal(id)).await
}

/// Handler for POST /api/v1/proposals/{id}/votes
///
/// Upserts the caller's vote. The choice itself is never logged.
#[instrument(skip_all, name = "floor.handlers.cast_vote", fields(proposal_id = %id))]
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CommandResponse>, FloorError> {
    let id: ProposalId = parse_id(&id, "proposal")?;
    let request: CastVoteRequest = parse_body(&body)?;
    dispatch(&state, actor, Command::CastVote(id, request.choice)).await
}

#[instrument(skip_all, name = "floor.handlers.set_stupid", fields(proposal_id = %id))]
pub async fn set_stupid(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CommandResponse>, FloorError> {
    let id: ProposalId = parse_id(&id, "proposal")?;
    let request: SetStupidRequest = parse_body(&body)?;
    dispatch(&state, actor, Command::SetStupid(id, request.stupid)).await
}

#[instrument(skip_all, name = "floor.handlers.end_voting")]
pub async fn end_voting(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    body: Bytes,
) -> Result<Json<CommandResponse>, FloorError> {
    let request: EndVotingRequest = parse_body(&body)?;
    dispatch(&state, actor, Command::EndVoting(request.category)).await
}

// ============================================================================
// Roster
// ============================================================================

#[instrument(skip_all, name = "floor.handlers.update_attributes", fields(target = %id))]
pub async fn update_attributes(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CommandResponse>, FloorError> {
    let patch: AttributePatch = parse_body(&body)?;
    dispatch(
        &state,
        actor,
        Command::UpdateAttributes(ParticipantId::new(id), patch),
    )
    .await
}

#[instrument(skip_all, name = "floor.handlers.impose_fine", fields(target = %id))]
pub async fn impose_fine(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CommandResponse>, FloorError> {
    let request: ImposeFineRequest = parse_body(&body)?;
    dispatch(
        &state,
        actor,
        Command::ImposeFine {
            target: ParticipantId::new(id),
            amount: request.amount,
            reason: request.reason,
        },
    )
    .await
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[instrument(skip_all, name = "floor.handlers.call_break")]
pub async fn call_break(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::CallBreak).await
}

#[instrument(skip_all, name = "floor.handlers.end_break")]
pub async fn end_break(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::EndBreak).await
}

/// Handler for POST /api/v1/session/end
///
/// Terminal. Every later command on this floor fails with 410 Gone.
#[instrument(skip_all, name = "floor.handlers.end_session")]
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ParticipantId>,
) -> Result<Json<CommandResponse>, FloorError> {
    dispatch(&state, actor, Command::EndSession).await
}
