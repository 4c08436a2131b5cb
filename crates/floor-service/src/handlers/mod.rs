//! HTTP request handlers for the floor service.

pub mod commands;
pub mod events;
pub mod metrics;
pub mod queries;

pub use commands::{
    activate_queue_item, call_break, cast_vote, complete_active_queue_item, complete_queue_item,
    create_proposal, end_break, end_session, end_voting, impose_fine, join_seat, leave_seat,
    object_floor, register, remove_proposal, request_speak, set_seat_status, set_stupid,
    update_attributes, update_proposal,
};
pub use events::event_stream;
pub use metrics::metrics_handler;
pub use queries::{get_fines, get_snapshot};
