//! # Floor Test Utilities
//!
//! Shared test utilities for the floor service.
//!
//! This crate provides:
//! - Server test harness (`TestFloorServer` for E2E tests)
//! - A typed HTTP client acting as one participant (`FloorClient`)
//! - Roster fixtures (`seat_members`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use floor_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let server = TestFloorServer::spawn().await?;
//!     let alice = server.client("alice");
//!
//!     let response = alice.post("/api/v1/register", None).await?;
//!     assert_eq!(response.status, 201);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod fixtures;
pub mod server_harness;

// Re-export commonly used items
pub use client::*;
pub use fixtures::*;
pub use server_harness::*;
