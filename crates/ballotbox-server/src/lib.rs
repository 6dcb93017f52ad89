// crates/ballotbox-server/src/lib.rs
// ============================================================================
// Module: Ballotbox Server Crate
// Description: HTTP surface for poll management and vote casting.
// Purpose: Expose the vote recorder and poll lifecycle over axum.
// Dependencies: axum, ballotbox-config, ballotbox-core, serde, thiserror, tokio
// ============================================================================

//! ## Overview
//! The server maps the vote-recording protocol onto a small JSON API. Every
//! response uses the `{success, message?, data?}` envelope, and the error
//! taxonomy maps onto stable status codes: invalid input is 400, a duplicate
//! vote is 409, a stale poll or option reference is 404, and retryable store
//! failures are 503. Authentication is a static bearer-token table resolved
//! to verified user identities before any handler logic runs.

/// Router, state, handlers, and error mapping.
pub mod server;

pub use server::ApiResponse;
pub use server::ServerError;
pub use server::ServerState;
pub use server::build_router;
pub use server::build_server_state;
pub use server::run;
