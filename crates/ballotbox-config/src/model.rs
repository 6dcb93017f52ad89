// crates/ballotbox-config/src/model.rs
// ============================================================================
// Module: Ballotbox Config Model
// Description: TOML configuration model with strict validation.
// Purpose: Define server, store, and vote settings and their guards.
// Dependencies: ballotbox-core, ballotbox-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! The configuration model mirrors the TOML document shape. [`BallotboxConfig::load`]
//! applies input guards (path length, file size, encoding) before parsing,
//! and [`BallotboxConfig::validate`] enforces semantic constraints: a
//! parseable bind address, auth required for non-loopback binds, well-formed
//! token-to-user mappings, and a store section matching the chosen backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;

use ballotbox_core::core::identifiers::is_well_formed;
use ballotbox_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum config file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1024 * 1024;
/// Maximum total config path length.
const MAX_CONFIG_PATH_LENGTH: usize = 4096;
/// Maximum length of a single config path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Default HTTP bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Messages never echo token values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file I/O failure.
    #[error("config io error: {0}")]
    Io(String),
    /// Config file parse failure.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config value rejected by validation.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Vote consistency strategy selection.
///
/// `Auto` picks the transactional path when the store advertises transaction
/// support and falls back to the compensating path otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoteStrategy {
    /// Follow the store's advertised capabilities.
    #[default]
    Auto,
    /// Require the transactional cast path.
    Transactional,
    /// Force the compensating cast path.
    Compensating,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Volatile in-process store for development and tests.
    #[default]
    Memory,
    /// Durable `SQLite` store.
    Sqlite,
}

/// One bearer token to user mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthTokenConfig {
    /// Bearer token presented by the client.
    pub token: String,
    /// User the token authenticates as.
    pub user_id: String,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address, `host:port`.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Bearer token table. Empty means unauthenticated, loopback only.
    #[serde(default)]
    pub auth_tokens: Vec<AuthTokenConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            auth_tokens: Vec::new(),
        }
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Storage settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,
    /// `SQLite` settings, required when `backend = "sqlite"`.
    #[serde(default)]
    pub sqlite: Option<SqliteStoreConfig>,
}

/// Vote recording settings.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct VoteConfig {
    /// Consistency strategy.
    #[serde(default)]
    pub strategy: VoteStrategy,
}

/// Root configuration document.
///
/// # Invariants
/// - `validate` passes before the config is handed to the runtime.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BallotboxConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Vote recording settings.
    #[serde(default)]
    pub vote: VoteConfig,
}

impl BallotboxConfig {
    /// Loads configuration from a TOML file, or defaults when no path is
    /// given. The loaded document is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on I/O failure, parse failure, or validation
    /// failure.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                validate_config_path(path)?;
                let metadata =
                    std::fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                if metadata.len() > MAX_CONFIG_BYTES {
                    return Err(ConfigError::Invalid(format!(
                        "config file exceeds size limit of {MAX_CONFIG_BYTES} bytes"
                    )));
                }
                let bytes =
                    std::fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
                toml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates semantic constraints across the document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bind: SocketAddr = self.server.bind.parse().map_err(|_| {
            ConfigError::Invalid(format!("server.bind is not a socket address: {}", self.server.bind))
        })?;
        if !bind.ip().is_loopback() && self.server.auth_tokens.is_empty() {
            return Err(ConfigError::Invalid(
                "non-loopback bind disallowed without auth tokens".to_string(),
            ));
        }
        for entry in &self.server.auth_tokens {
            if entry.token.trim().is_empty() {
                return Err(ConfigError::Invalid("auth token must be non-empty".to_string()));
            }
            if entry.token.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(
                    "auth token must not contain whitespace".to_string(),
                ));
            }
            if !is_well_formed(&entry.user_id) {
                return Err(ConfigError::Invalid(format!(
                    "auth token user_id is not a well-formed identifier: {}",
                    entry.user_id
                )));
            }
        }
        let mut seen_tokens: Vec<&str> = Vec::with_capacity(self.server.auth_tokens.len());
        for entry in &self.server.auth_tokens {
            if seen_tokens.contains(&entry.token.as_str()) {
                return Err(ConfigError::Invalid("duplicate auth token".to_string()));
            }
            seen_tokens.push(entry.token.as_str());
        }
        match self.store.backend {
            StoreBackend::Sqlite => {
                let Some(sqlite) = &self.store.sqlite else {
                    return Err(ConfigError::Invalid(
                        "sqlite backend requires a [store.sqlite] section".to_string(),
                    ));
                };
                if sqlite.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.sqlite.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
            }
            StoreBackend::Memory => {
                if self.store.sqlite.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory backend does not accept a [store.sqlite] section".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns the parsed bind address. Call after [`BallotboxConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind.parse().map_err(|_| {
            ConfigError::Invalid(format!("server.bind is not a socket address: {}", self.server.bind))
        })
    }
}

/// Validates config paths for safety limits.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_CONFIG_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
