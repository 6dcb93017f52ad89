// crates/ballotbox-store-sqlite/src/lib.rs
// ============================================================================
// Module: Ballotbox SQLite Store Crate
// Description: Durable VoteStore backed by SQLite.
// Purpose: Expose the SQLite store and its configuration types.
// Dependencies: ballotbox-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate provides the durable [`SqliteVoteStore`] used in production
//! deployments. The ballot uniqueness constraint lives in the database
//! schema, so duplicate detection survives process restarts and concurrent
//! writers. The store advertises transaction support and implements the
//! atomic cast path with a real multi-statement transaction.

/// SQLite-backed vote store implementation.
pub mod store;

pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
pub use store::SqliteVoteStore;
