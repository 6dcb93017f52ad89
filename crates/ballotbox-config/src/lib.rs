// crates/ballotbox-config/src/lib.rs
// ============================================================================
// Module: Ballotbox Config Crate
// Description: Canonical configuration model and validation.
// Purpose: Load, default, and validate server/store/vote settings.
// Dependencies: ballotbox-core, ballotbox-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration for the ballotbox server is a single TOML document covering
//! the HTTP listener, the storage backend, and the vote consistency strategy.
//! Loading is strict and fail-closed: unknown keys, oversized files, and
//! invalid values reject the whole document rather than falling back to
//! partial defaults.

/// Configuration model, loading, and validation.
pub mod model;

pub use model::AuthTokenConfig;
pub use model::BallotboxConfig;
pub use model::ConfigError;
pub use model::ServerConfig;
pub use model::StoreBackend;
pub use model::StoreConfig;
pub use model::VoteConfig;
pub use model::VoteStrategy;
