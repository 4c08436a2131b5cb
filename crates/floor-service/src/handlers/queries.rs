//! Read-only endpoints.
//!
//! - `GET /api/v1/snapshot` - Full authoritative state for resynchronization
//! - `GET /api/v1/fines` - The fine book

use crate::errors::FloorError;
use crate::floor::{FineRecord, Snapshot};
use crate::routes::AppState;
use axum::{extract::State, Extension, Json};
use common::types::ParticipantId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Serialize, Deserialize)]
pub struct FinesResponse {
    pub fines: Vec<FineRecord>,
}

/// Handler for GET /api/v1/snapshot
///
/// Served from the broadcast coordinator, which is updated before any
/// command reply is sent, so a caller always sees its own committed writes.
#[instrument(skip_all, name = "floor.handlers.snapshot")]
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Extension(observer): Extension<ParticipantId>,
) -> Json<Snapshot> {
    let snapshot = state.broadcast.resync();
    tracing::debug!(
        target: "floor.handlers",
        observer = %observer,
        sequence = snapshot.sequence,
        "Snapshot served"
    );
    Json(Snapshot::clone(&snapshot))
}

#[instrument(skip_all, name = "floor.handlers.fines")]
pub async fn get_fines(
    State(state): State<Arc<AppState>>,
    Extension(_observer): Extension<ParticipantId>,
) -> Result<Json<FinesResponse>, FloorError> {
    let fines = state.floor.fines().await?;
    Ok(Json(FinesResponse { fines }))
}
