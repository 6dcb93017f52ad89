// crates/ballotbox-core/src/runtime/mod.rs
// ============================================================================
// Module: Ballotbox Runtime
// Description: Vote recorder, conflict classifier, and poll lifecycle guard.
// Purpose: Group the protocol logic that orchestrates the store interfaces.
// Dependencies: crate submodules
// ============================================================================

//! ## Overview
//! The runtime holds the protocol core: [`recorder::VoteRecorder`] performs
//! the two-phase cast protocol, [`classify`] maps store failures into the
//! recorder's error taxonomy at a single boundary, and [`lifecycle`] guards
//! poll edits and deletions once voting has started.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod classify;
pub mod lifecycle;
pub mod recorder;
