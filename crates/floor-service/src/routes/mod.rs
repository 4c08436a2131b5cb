//! HTTP routes for the floor service.
//!
//! Defines the Axum router and application state.

use crate::actors::FloorActorHandle;
use crate::broadcast::BroadcastCoordinator;
use crate::config::Config;
use crate::errors::FloorError;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_identity, IdentityState};
use crate::observability::{health_router, HealthState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the actor owning the floor state.
    pub floor: FloorActorHandle,

    /// Event fan-out and resync snapshot.
    pub broadcast: Arc<BroadcastCoordinator>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health`, `/ready` - Probes (public, unversioned)
/// - `/metrics` - Prometheus scrape endpoint (public, unversioned)
/// - `/api/v1/...` - Floor commands, queries and the event stream, all
///   requiring an authenticated participant
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - Configurable request timeout
///
/// The event stream is long-lived, so it sits outside the timeout layer.
pub fn build_routes(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    health: Arc<HealthState>,
) -> Result<Router, FloorError> {
    let identity_state = Arc::new(IdentityState::new(&state.config.identity_header)?);
    let request_timeout = state.config.request_timeout;

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/v1/register", post(handlers::register))
        // Seat
        .route("/api/v1/seat/join", post(handlers::join_seat))
        .route("/api/v1/seat/leave", post(handlers::leave_seat))
        .route("/api/v1/seat/status", post(handlers::set_seat_status))
        .route("/api/v1/seat/request-speak", post(handlers::request_speak))
        .route("/api/v1/seat/object", post(handlers::object_floor))
        // Business queue
        .route(
            "/api/v1/queue/active/complete",
            post(handlers::complete_active_queue_item),
        )
        .route(
            "/api/v1/queue/:id/activate",
            post(handlers::activate_queue_item),
        )
        .route(
            "/api/v1/queue/:id/complete",
            post(handlers::complete_queue_item),
        )
        // Proposals and voting
        .route("/api/v1/proposals", post(handlers::create_proposal))
        .route(
            "/api/v1/proposals/:id",
            axum::routing::put(handlers::update_proposal).delete(handlers::remove_proposal),
        )
        .route("/api/v1/proposals/:id/votes", post(handlers::cast_vote))
        .route("/api/v1/proposals/:id/stupid", post(handlers::set_stupid))
        .route("/api/v1/voting/end", post(handlers::end_voting))
        // Roster
        .route(
            "/api/v1/participants/:id",
            axum::routing::patch(handlers::update_attributes),
        )
        .route(
            "/api/v1/participants/:id/fines",
            post(handlers::impose_fine),
        )
        // Session lifecycle
        .route("/api/v1/break", post(handlers::call_break))
        .route("/api/v1/break/end", post(handlers::end_break))
        .route("/api/v1/session/end", post(handlers::end_session))
        // Queries
        .route("/api/v1/snapshot", get(handlers::get_snapshot))
        .route("/api/v1/fines", get(handlers::get_fines))
        .layer(TimeoutLayer::new(request_timeout))
        .route("/api/v1/events", get(handlers::event_stream))
        .route_layer(middleware::from_fn_with_state(
            identity_state,
            require_identity,
        ))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TraceLayer - Log request details
    // 2. http_metrics_middleware - Record ALL responses (outermost)
    Ok(health_router(health)
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware)))
}
