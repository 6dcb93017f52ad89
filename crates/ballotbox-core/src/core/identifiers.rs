// crates/ballotbox-core/src/core/identifiers.rs
// ============================================================================
// Module: Ballotbox Identifiers
// Description: Canonical opaque identifiers for users, polls, options, ballots.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Ballotbox.
//! Identifiers are opaque strings and serialize transparently on the wire.
//! Newly minted identifiers are random hex tokens; identifiers received from
//! callers are validated against [`is_well_formed`] at the recorder boundary
//! before any store operation runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of random bytes in a generated identifier (24 hex characters).
const GENERATED_ID_BYTES: usize = 12;

/// Maximum accepted length for caller-supplied identifiers.
const MAX_ID_LENGTH: usize = 64;

// ============================================================================
// SECTION: Well-Formedness
// ============================================================================

/// Returns whether a caller-supplied identifier is well formed.
///
/// Well-formed identifiers are non-empty, at most [`MAX_ID_LENGTH`] bytes,
/// and restricted to ASCII alphanumerics, `-`, and `_`.
#[must_use]
pub fn is_well_formed(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_ID_LENGTH
        && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Lowercase hex alphabet used for generated identifiers.
const HEX_ALPHABET: &[u8; 16] = b"0123456789abcdef";

/// Generates a random lowercase hex identifier token.
fn random_hex_token() -> String {
    let mut bytes = [0_u8; GENERATED_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut token = String::with_capacity(GENERATED_ID_BYTES * 2);
    for byte in bytes {
        token.push(char::from(HEX_ALPHABET[usize::from(byte >> 4)]));
        token.push(char::from(HEX_ALPHABET[usize::from(byte & 0x0f)]));
    }
    token
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Verified user identifier supplied by the authentication collaborator.
///
/// # Invariants
/// - Opaque UTF-8 string; identity verification happens upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Poll identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(String);

impl PollId {
    /// Creates a new poll identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random poll identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_hex_token())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PollId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PollId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Option identifier, stable within its poll once assigned.
///
/// # Invariants
/// - Opaque UTF-8 string; referenced by ballots and never reassigned while
///   any vote exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(String);

impl OptionId {
    /// Creates a new option identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random option identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_hex_token())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for OptionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OptionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Ballot identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; assigned at insert time and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotId(String);

impl BallotId {
    /// Creates a new ballot identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random ballot identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_hex_token())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BallotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BallotId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BallotId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
