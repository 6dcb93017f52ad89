// crates/ballotbox-core/src/core/mod.rs
// ============================================================================
// Module: Ballotbox Domain Model
// Description: Identifiers, time values, polls, and ballots.
// Purpose: Group the canonical domain records shared across the workspace.
// Dependencies: crate submodules
// ============================================================================

//! ## Overview
//! The domain model groups the opaque identifiers, the [`time::Timestamp`]
//! representation, and the [`poll::Poll`] and [`ballot::Ballot`] records.
//! Records are plain serializable data; invariants are enforced at
//! construction and store boundaries, not by these types.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod ballot;
pub mod identifiers;
pub mod poll;
pub mod time;
