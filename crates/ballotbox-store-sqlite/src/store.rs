// crates/ballotbox-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Vote Store
// Description: Durable VoteStore backed by SQLite WAL.
// Purpose: Persist polls and ballots with schema-enforced vote uniqueness.
// Dependencies: ballotbox-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`VoteStore`] using `SQLite`. The ballot
//! table carries a `UNIQUE(user_id, poll_id)` constraint so duplicate
//! detection is evaluated by the engine at insert time, never by a prior
//! existence check. Tally increments are single-row `UPDATE` statements whose
//! affected-row count distinguishes success from a missing poll or option.
//! The atomic cast path wraps both writes in one transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use ballotbox_core::Ballot;
use ballotbox_core::BallotId;
use ballotbox_core::BallotStore;
use ballotbox_core::BallotStoreError;
use ballotbox_core::OptionId;
use ballotbox_core::Poll;
use ballotbox_core::PollId;
use ballotbox_core::PollOption;
use ballotbox_core::PollPage;
use ballotbox_core::PollStore;
use ballotbox_core::StoreCapabilities;
use ballotbox_core::TallyStoreError;
use ballotbox_core::Timestamp;
use ballotbox_core::UserId;
use ballotbox_core::VoteStore;
use ballotbox_core::VoteStoreError;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` vote store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw ballot or poll payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable vote store backed by a single `SQLite` database file.
///
/// # Invariants
/// - All statements run on one connection behind a mutex, so reads observe
///   every committed write.
/// - The ballot uniqueness constraint lives in the schema, not in code.
#[derive(Debug)]
pub struct SqliteVoteStore {
    /// Serialized database connection.
    connection: Mutex<Connection>,
}

impl SqliteVoteStore {
    /// Opens an `SQLite`-backed vote store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Acquires the connection guard, mapping poison to a message.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.connection.lock().map_err(|_| "sqlite connection mutex poisoned".to_string())
    }
}

// ============================================================================
// SECTION: Ballot Store Impl
// ============================================================================

impl BallotStore for SqliteVoteStore {
    fn insert_ballot(&self, ballot: &Ballot) -> Result<(), BallotStoreError> {
        let guard = self.lock().map_err(BallotStoreError::Unavailable)?;
        insert_ballot_row(&guard, ballot)
    }

    fn delete_ballot(&self, ballot_id: &BallotId) -> Result<bool, BallotStoreError> {
        let guard = self.lock().map_err(BallotStoreError::Unavailable)?;
        let removed = guard
            .execute("DELETE FROM ballots WHERE ballot_id = ?1", params![ballot_id.as_str()])
            .map_err(|err| BallotStoreError::Unavailable(err.to_string()))?;
        Ok(removed > 0)
    }

    fn find_ballot(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
    ) -> Result<Option<Ballot>, BallotStoreError> {
        let guard = self.lock().map_err(BallotStoreError::Unavailable)?;
        guard
            .query_row(
                "SELECT ballot_id, user_id, poll_id, option_id, created_at
                 FROM ballots WHERE user_id = ?1 AND poll_id = ?2",
                params![user_id.as_str(), poll_id.as_str()],
                ballot_from_row,
            )
            .optional()
            .map_err(|err| BallotStoreError::Unavailable(err.to_string()))
    }

    fn count_ballots(&self, poll_id: &PollId) -> Result<u64, BallotStoreError> {
        let guard = self.lock().map_err(BallotStoreError::Unavailable)?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM ballots WHERE poll_id = ?1",
                params![poll_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| BallotStoreError::Unavailable(err.to_string()))?;
        u64::try_from(count)
            .map_err(|_| BallotStoreError::Invalid("negative ballot count".to_string()))
    }

    fn delete_ballots_for_poll(&self, poll_id: &PollId) -> Result<u64, BallotStoreError> {
        let guard = self.lock().map_err(BallotStoreError::Unavailable)?;
        let removed = guard
            .execute("DELETE FROM ballots WHERE poll_id = ?1", params![poll_id.as_str()])
            .map_err(|err| BallotStoreError::Unavailable(err.to_string()))?;
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

// ============================================================================
// SECTION: Poll Store Impl
// ============================================================================

impl PollStore for SqliteVoteStore {
    fn create_poll(&self, poll: &Poll) -> Result<(), TallyStoreError> {
        let mut guard = self.lock().map_err(TallyStoreError::Unavailable)?;
        let tx =
            guard.transaction().map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
        tx.execute(
            "INSERT INTO polls (poll_id, title, description, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                poll.id.as_str(),
                poll.title,
                poll.description,
                poll.created_by.as_str(),
                poll.created_at.as_unix_millis(),
            ],
        )
        .map_err(|err| {
            if is_constraint_violation(&err) {
                TallyStoreError::Invalid(format!("poll already exists: {}", poll.id))
            } else {
                TallyStoreError::Unavailable(err.to_string())
            }
        })?;
        insert_option_rows(&tx, poll)?;
        tx.commit().map_err(|err| TallyStoreError::Unavailable(err.to_string()))
    }

    fn get_poll(&self, poll_id: &PollId) -> Result<Poll, TallyStoreError> {
        let guard = self.lock().map_err(TallyStoreError::Unavailable)?;
        load_poll(&guard, poll_id)?.ok_or_else(|| TallyStoreError::NotFound(poll_id.clone()))
    }

    fn increment_option(
        &self,
        poll_id: &PollId,
        option_id: &OptionId,
    ) -> Result<Poll, TallyStoreError> {
        let guard = self.lock().map_err(TallyStoreError::Unavailable)?;
        apply_increment(&guard, poll_id, option_id)?;
        load_poll(&guard, poll_id)?.ok_or_else(|| TallyStoreError::NotFound(poll_id.clone()))
    }

    fn update_poll(&self, poll: &Poll) -> Result<(), TallyStoreError> {
        let mut guard = self.lock().map_err(TallyStoreError::Unavailable)?;
        let tx =
            guard.transaction().map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
        let changed = tx
            .execute(
                "UPDATE polls SET title = ?2, description = ?3 WHERE poll_id = ?1",
                params![poll.id.as_str(), poll.title, poll.description],
            )
            .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
        if changed == 0 {
            return Err(TallyStoreError::NotFound(poll.id.clone()));
        }
        tx.execute("DELETE FROM options WHERE poll_id = ?1", params![poll.id.as_str()])
            .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
        insert_option_rows(&tx, poll)?;
        tx.commit().map_err(|err| TallyStoreError::Unavailable(err.to_string()))
    }

    fn delete_poll(&self, poll_id: &PollId) -> Result<bool, TallyStoreError> {
        let guard = self.lock().map_err(TallyStoreError::Unavailable)?;
        let removed = guard
            .execute("DELETE FROM polls WHERE poll_id = ?1", params![poll_id.as_str()])
            .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
        Ok(removed > 0)
    }

    fn list_polls(&self, page: u64, limit: u64) -> Result<PollPage, TallyStoreError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 50);
        let offset = (page - 1).saturating_mul(limit);
        let guard = self.lock().map_err(TallyStoreError::Unavailable)?;
        let ids = collect_poll_ids(
            &guard,
            "SELECT poll_id FROM polls
             ORDER BY created_at DESC, poll_id DESC LIMIT ?1 OFFSET ?2",
            params![
                i64::try_from(limit).unwrap_or(i64::MAX),
                i64::try_from(offset).unwrap_or(i64::MAX),
            ],
        )?;
        let mut items = Vec::with_capacity(ids.len());
        for poll_id in ids {
            if let Some(poll) = load_poll(&guard, &poll_id)? {
                items.push(poll);
            }
        }
        Ok(PollPage { items, page, limit })
    }

    fn list_polls_by_owner(&self, owner: &UserId) -> Result<Vec<Poll>, TallyStoreError> {
        let guard = self.lock().map_err(TallyStoreError::Unavailable)?;
        let ids = collect_poll_ids(
            &guard,
            "SELECT poll_id FROM polls WHERE created_by = ?1
             ORDER BY created_at DESC, poll_id DESC",
            params![owner.as_str()],
        )?;
        let mut polls = Vec::with_capacity(ids.len());
        for poll_id in ids {
            if let Some(poll) = load_poll(&guard, &poll_id)? {
                polls.push(poll);
            }
        }
        Ok(polls)
    }
}

// ============================================================================
// SECTION: Vote Store Impl
// ============================================================================

impl VoteStore for SqliteVoteStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities { transactions: true }
    }

    fn cast_atomic(&self, ballot: &Ballot) -> Result<Poll, VoteStoreError> {
        let mut guard = self
            .lock()
            .map_err(|message| VoteStoreError::Ballot(BallotStoreError::Unavailable(message)))?;
        let tx = guard.transaction().map_err(|err| {
            VoteStoreError::Ballot(BallotStoreError::Unavailable(err.to_string()))
        })?;
        insert_ballot_row(&tx, ballot)?;
        apply_increment(&tx, &ballot.poll_id, &ballot.option_id)?;
        let poll = load_poll(&tx, &ballot.poll_id)?
            .ok_or_else(|| TallyStoreError::NotFound(ballot.poll_id.clone()))?;
        tx.commit().map_err(|err| {
            VoteStoreError::Ballot(BallotStoreError::Unavailable(err.to_string()))
        })?;
        Ok(poll)
    }

    fn readiness(&self) -> Result<(), VoteStoreError> {
        let guard = self
            .lock()
            .map_err(|message| VoteStoreError::Ballot(BallotStoreError::Unavailable(message)))?;
        let _probe: i64 = guard.query_row("SELECT 1", [], |row| row.get(0)).map_err(|err| {
            VoteStoreError::Ballot(BallotStoreError::Unavailable(err.to_string()))
        })?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Row Helpers
// ============================================================================

/// Inserts a ballot row, classifying the uniqueness constraint.
fn insert_ballot_row(connection: &Connection, ballot: &Ballot) -> Result<(), BallotStoreError> {
    let result = connection.execute(
        "INSERT INTO ballots (ballot_id, user_id, poll_id, option_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            ballot.id.as_str(),
            ballot.user_id.as_str(),
            ballot.poll_id.as_str(),
            ballot.option_id.as_str(),
            ballot.created_at.as_unix_millis(),
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(err) if is_constraint_violation(&err) => Err(BallotStoreError::Duplicate {
            user_id: ballot.user_id.clone(),
            poll_id: ballot.poll_id.clone(),
        }),
        Err(err) => Err(BallotStoreError::Unavailable(err.to_string())),
    }
}

/// Increments one option row by exactly 1, distinguishing a missing poll
/// from a missing option via the affected-row count.
fn apply_increment(
    connection: &Connection,
    poll_id: &PollId,
    option_id: &OptionId,
) -> Result<(), TallyStoreError> {
    let changed = connection
        .execute(
            "UPDATE options SET vote_count = vote_count + 1
             WHERE poll_id = ?1 AND option_id = ?2",
            params![poll_id.as_str(), option_id.as_str()],
        )
        .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    if changed > 0 {
        return Ok(());
    }
    let poll_exists: Option<i64> = connection
        .query_row("SELECT 1 FROM polls WHERE poll_id = ?1", params![poll_id.as_str()], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    if poll_exists.is_some() {
        Err(TallyStoreError::OptionNotFound {
            poll_id: poll_id.clone(),
            option_id: option_id.clone(),
        })
    } else {
        Err(TallyStoreError::NotFound(poll_id.clone()))
    }
}

/// Inserts a poll's option rows in order.
fn insert_option_rows(connection: &Connection, poll: &Poll) -> Result<(), TallyStoreError> {
    for (position, option) in poll.options.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| TallyStoreError::Invalid("option position out of range".to_string()))?;
        let vote_count = i64::try_from(option.vote_count)
            .map_err(|_| TallyStoreError::Invalid("vote count out of range".to_string()))?;
        connection
            .execute(
                "INSERT INTO options (option_id, poll_id, position, option_text, vote_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![option.id.as_str(), poll.id.as_str(), position, option.text, vote_count],
            )
            .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    }
    Ok(())
}

/// Loads a poll with its options in stored order.
fn load_poll(connection: &Connection, poll_id: &PollId) -> Result<Option<Poll>, TallyStoreError> {
    let header: Option<(String, Option<String>, String, i64)> = connection
        .query_row(
            "SELECT title, description, created_by, created_at
             FROM polls WHERE poll_id = ?1",
            params![poll_id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()
        .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    let Some((title, description, created_by, created_at)) = header else {
        return Ok(None);
    };
    let mut statement = connection
        .prepare(
            "SELECT option_id, option_text, vote_count
             FROM options WHERE poll_id = ?1 ORDER BY position ASC",
        )
        .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    let rows = statement
        .query_map(params![poll_id.as_str()], |row| {
            let option_id: String = row.get(0)?;
            let text: String = row.get(1)?;
            let vote_count: i64 = row.get(2)?;
            Ok((option_id, text, vote_count))
        })
        .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    let mut options = Vec::new();
    for row in rows {
        let (option_id, text, vote_count) =
            row.map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
        let vote_count = u64::try_from(vote_count)
            .map_err(|_| TallyStoreError::Invalid("negative vote count".to_string()))?;
        options.push(PollOption {
            id: OptionId::new(option_id),
            text,
            vote_count,
        });
    }
    Ok(Some(Poll {
        id: poll_id.clone(),
        title,
        description,
        options,
        created_by: UserId::new(created_by),
        created_at: Timestamp::from_unix_millis(created_at),
    }))
}

/// Maps a ballot row to a [`Ballot`].
fn ballot_from_row(row: &rusqlite::Row<'_>) -> Result<Ballot, rusqlite::Error> {
    let ballot_id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let poll_id: String = row.get(2)?;
    let option_id: String = row.get(3)?;
    let created_at: i64 = row.get(4)?;
    Ok(Ballot {
        id: BallotId::new(ballot_id),
        user_id: UserId::new(user_id),
        poll_id: PollId::new(poll_id),
        option_id: OptionId::new(option_id),
        created_at: Timestamp::from_unix_millis(created_at),
    })
}

/// Collects poll identifiers for a listing query.
fn collect_poll_ids(
    connection: &Connection,
    sql: &str,
    parameters: impl rusqlite::Params,
) -> Result<Vec<PollId>, TallyStoreError> {
    let mut statement =
        connection.prepare(sql).map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    let rows = statement
        .query_map(parameters, |row| {
            let poll_id: String = row.get(0)?;
            Ok(poll_id)
        })
        .map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
    let mut ids = Vec::new();
    for row in rows {
        let poll_id = row.map_err(|err| TallyStoreError::Unavailable(err.to_string()))?;
        ids.push(PollId::new(poll_id));
    }
    Ok(ids)
}

/// Returns whether an error is a `SQLite` constraint violation.
fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
    )
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Creates the parent directory for the database file if needed.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
///
/// Ballots carry no foreign key to polls: the compensating cast path inserts
/// the ballot before the tally check discovers whether the poll exists, and
/// poll deletion cascades ballots explicitly so the removed count can be
/// reported.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS polls (
                    poll_id TEXT NOT NULL PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT,
                    created_by TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_polls_created_by
                    ON polls (created_by);
                CREATE TABLE IF NOT EXISTS options (
                    option_id TEXT NOT NULL PRIMARY KEY,
                    poll_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    option_text TEXT NOT NULL,
                    vote_count INTEGER NOT NULL DEFAULT 0,
                    FOREIGN KEY (poll_id)
                        REFERENCES polls(poll_id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_options_poll_id
                    ON options (poll_id);
                CREATE TABLE IF NOT EXISTS ballots (
                    ballot_id TEXT NOT NULL PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    poll_id TEXT NOT NULL,
                    option_id TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    UNIQUE (user_id, poll_id)
                );
                CREATE INDEX IF NOT EXISTS idx_ballots_poll_id
                    ON ballots (poll_id);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {found}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
}
