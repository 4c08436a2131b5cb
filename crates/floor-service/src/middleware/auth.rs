//! Identity middleware for floor routes.
//!
//! Credentials are checked upstream. The auth collaborator forwards the
//! authenticated participant id in a configured header; this middleware
//! only reads it and places a [`ParticipantId`] into request extensions for
//! downstream handlers.

use crate::errors::FloorError;
use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::IntoResponse,
};
use common::types::ParticipantId;
use std::sync::Arc;
use tracing::instrument;

/// State for the identity middleware.
#[derive(Debug, Clone)]
pub struct IdentityState {
    /// Header carrying the authenticated participant id.
    pub header: HeaderName,
}

impl IdentityState {
    pub fn new(header: &str) -> Result<Self, FloorError> {
        let header = HeaderName::from_bytes(header.as_bytes()).map_err(|e| {
            FloorError::Internal(format!("invalid identity header name: {e}"))
        })?;
        Ok(Self { header })
    }
}

fn extract_identity(req: &Request, header: &HeaderName) -> Result<ParticipantId, FloorError> {
    let value = req
        .headers()
        .get(header)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            tracing::debug!(target: "floor.middleware.auth", header = %header, "Missing identity header");
            FloorError::Unauthenticated
        })?;

    Ok(ParticipantId::from(value))
}

/// Require an authenticated participant on every protected route.
///
/// # Response
///
/// - Returns 401 Unauthorized if the identity header is missing or empty
/// - Continues to next handler with `ParticipantId` in extensions otherwise
#[instrument(skip_all, name = "floor.middleware.auth")]
pub async fn require_identity(
    State(state): State<Arc<IdentityState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, FloorError> {
    let participant = extract_identity(&req, &state.header)?;

    req.extensions_mut().insert(participant);

    Ok(next.run(req).await)
}
