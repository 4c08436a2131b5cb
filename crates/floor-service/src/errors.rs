//! Floor service error types.
//!
//! Every command either fully commits or fails with one of these variants.
//! All variants map to an HTTP status via the `IntoResponse` impl; internal
//! details are logged server-side and never returned to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Floor service error type.
///
/// Maps to HTTP status codes:
/// - `Forbidden`, `NotEligible`: 403
/// - `InvalidTransition`, `Conflict`, `VotingClosed`, `Immutable`, `Stupid`,
///   `DuplicateIdentity`: 409
/// - `OnBreak`: 423
/// - `SessionEnded`: 410
/// - `Validation`: 400
/// - `NotFound`: 404
/// - `Unauthenticated`: 401
/// - `Internal`: 500
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FloorError {
    /// Actor lacks the role for the requested operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The seat state machine or session lifecycle rejects the edge.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A uniqueness or single-active invariant would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Participant not present or not entitled to act.
    #[error("Not eligible: {0}")]
    NotEligible(String),

    /// Vote cast after the proposal was frozen.
    #[error("Voting closed for proposal {0}")]
    VotingClosed(String),

    /// Mutation attempted on a frozen proposal.
    #[error("Immutable: {0}")]
    Immutable(String),

    /// Vote cast on a proposal excluded from voting.
    #[error("Proposal {0} is excluded from voting")]
    Stupid(String),

    /// Floor is on break; only the president may act.
    #[error("The floor is on break")]
    OnBreak,

    /// Session has ended; no further mutations are accepted.
    #[error("The session has ended")]
    SessionEnded,

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Identity already registered.
    #[error("Identity already registered: {0}")]
    DuplicateIdentity(String),

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No authenticated identity accompanied the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Internal error (actor unavailable, channel closed).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FloorError {
    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            FloorError::Forbidden(_) => "FORBIDDEN",
            FloorError::InvalidTransition(_) => "INVALID_TRANSITION",
            FloorError::Conflict(_) => "CONFLICT",
            FloorError::NotEligible(_) => "NOT_ELIGIBLE",
            FloorError::VotingClosed(_) => "VOTING_CLOSED",
            FloorError::Immutable(_) => "IMMUTABLE",
            FloorError::Stupid(_) => "STUPID",
            FloorError::OnBreak => "ON_BREAK",
            FloorError::SessionEnded => "SESSION_ENDED",
            FloorError::Validation(_) => "VALIDATION_ERROR",
            FloorError::DuplicateIdentity(_) => "DUPLICATE_IDENTITY",
            FloorError::NotFound(_) => "NOT_FOUND",
            FloorError::Unauthenticated => "UNAUTHENTICATED",
            FloorError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            FloorError::Forbidden(_) | FloorError::NotEligible(_) => StatusCode::FORBIDDEN,
            FloorError::InvalidTransition(_)
            | FloorError::Conflict(_)
            | FloorError::VotingClosed(_)
            | FloorError::Immutable(_)
            | FloorError::Stupid(_)
            | FloorError::DuplicateIdentity(_) => StatusCode::CONFLICT,
            FloorError::OnBreak => StatusCode::LOCKED,
            FloorError::SessionEnded => StatusCode::GONE,
            FloorError::Validation(_) => StatusCode::BAD_REQUEST,
            FloorError::NotFound(_) => StatusCode::NOT_FOUND,
            FloorError::Unauthenticated => StatusCode::UNAUTHORIZED,
            FloorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            FloorError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for FloorError {
    fn into_response(self) -> Response {
        if let FloorError::Internal(detail) = &self {
            tracing::error!(target: "floor.errors", error = %detail, "Internal error");
        }

        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.client_message(),
            },
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"floor\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            FloorError::Forbidden("x".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            FloorError::NotEligible("x".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            FloorError::Conflict("x".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(FloorError::OnBreak.status_code(), StatusCode::LOCKED);
        assert_eq!(FloorError::SessionEnded.status_code(), StatusCode::GONE);
        assert_eq!(
            FloorError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FloorError::NotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FloorError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_client_messages_hide_internal_details() {
        let err = FloorError::Internal("mailbox closed at actor 0x7f".to_string());
        assert_eq!(err.client_message(), "An internal error occurred");
        assert!(!err.client_message().contains("0x7f"));
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            FloorError::VotingClosed("3".to_string()).to_string(),
            "Voting closed for proposal 3"
        );
        assert_eq!(FloorError::SessionEnded.to_string(), "The session has ended");
    }

    #[tokio::test]
    async fn test_into_response_body_shape() {
        use http_body_util::BodyExt;

        let response = FloorError::OnBreak.into_response();
        assert_eq!(response.status(), StatusCode::LOCKED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "ON_BREAK");
        assert_eq!(body["error"]["message"], "The floor is on break");
    }

    #[test]
    fn test_unauthorized_carries_authenticate_header() {
        let response = FloorError::Unauthenticated.into_response();
        assert!(response.headers().contains_key("WWW-Authenticate"));
    }
}
