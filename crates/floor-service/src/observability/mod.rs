//! Observability for the floor service.
//!
//! Tracing uses explicit targets (`floor.actor`, `floor.state`,
//! `floor.handlers`, `floor.broadcast`) and `#[instrument(skip_all)]` with
//! allow-listed fields. Participant identities are logged, vote choices are
//! not.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `floor_http_requests_total` | Counter | `method`, `endpoint`, `status_code` | HTTP responses |
//! | `floor_commands_total` | Counter | `command`, `status` | Command outcomes |
//! | `floor_command_duration_seconds` | Histogram | `command` | Time spent applying a command |
//! | `floor_events_published_total` | Counter | `event` | Events fanned out to observers |
//! | `floor_observers_active` | Gauge | none | Connected event-stream observers |
//! | `floor_actor_mailbox_depth` | Gauge | none | Backpressure on the floor actor |
//! | `floor_observer_lagged_total` | Counter | none | Observers told to resync |
//! | `floor_pending_expired_total` | Counter | none | Pending items expired by timeout |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
pub use metrics::{
    init_metrics_recorder, record_command, record_event_published, record_http_request,
    record_observer_lagged, record_pending_expired, set_actor_mailbox_depth, set_observers_active,
};
