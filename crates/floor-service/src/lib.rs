//! Floor Service Library
//!
//! Authoritative session state coordinator for a parliamentary floor:
//! seat status, the business queue, proposal voting and the break/session
//! lifecycle, plus the broadcast/resync protocol that keeps observers
//! consistent with that state.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> actors (FloorActor) -> floor (FloorState)
//!                                          │
//!                                          └──► broadcast ──► SSE observers
//! ```
//!
//! # Modules
//!
//! - `actors` - Single-owner actor serializing every command
//! - `broadcast` - Event fan-out and resync snapshot
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `floor` - Pure, synchronous state machine
//! - `handlers` - HTTP request handlers
//! - `middleware` - Identity and HTTP metrics middleware
//! - `observability` - Metrics and health probes
//! - `routes` - Axum router setup

pub mod actors;
pub mod broadcast;
pub mod config;
pub mod errors;
pub mod floor;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
