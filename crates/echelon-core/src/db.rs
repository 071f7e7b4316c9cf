//! Database module: connection handle and schema.

use chrono::Local;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{EchelonError, Result};

/// Thread-safe database connection handle.
///
/// The mutex serializes every statement, so an outcome transaction is never
/// interleaved with a read.
pub type DbPool = Arc<Mutex<Connection>>;

/// Format used for every stored timestamp: local time, sortable, microseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Schema for the item store and the match ledger.
///
/// - `items`: one row per image with its current rating aggregate
/// - `matches`: append-only ledger; triggers reject UPDATE and DELETE
const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        location TEXT NOT NULL,
        rating REAL NOT NULL DEFAULT 1200.0,
        wins INTEGER NOT NULL DEFAULT 0 CHECK (wins >= 0),
        losses INTEGER NOT NULL DEFAULT 0 CHECK (losses >= 0),
        updated TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS matches (
        match_id INTEGER PRIMARY KEY AUTOINCREMENT,
        winner_id INTEGER NOT NULL REFERENCES items(id),
        loser_id INTEGER NOT NULL REFERENCES items(id),
        winner_rating_before REAL NOT NULL,
        winner_rating_after REAL NOT NULL,
        loser_rating_before REAL NOT NULL,
        loser_rating_after REAL NOT NULL,
        timestamp TEXT NOT NULL,
        CHECK (winner_id <> loser_id)
    );

    CREATE INDEX IF NOT EXISTS idx_matches_winner ON matches(winner_id);
    CREATE INDEX IF NOT EXISTS idx_matches_loser ON matches(loser_id);

    CREATE TRIGGER IF NOT EXISTS matches_no_update
    BEFORE UPDATE ON matches
    BEGIN
        SELECT RAISE(ABORT, 'match records are immutable');
    END;

    CREATE TRIGGER IF NOT EXISTS matches_no_delete
    BEFORE DELETE ON matches
    BEGIN
        SELECT RAISE(ABORT, 'match records are immutable');
    END;
";

/// Open (or create) the database and apply the schema.
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file (use `:memory:` for in-memory)
///
/// # Errors
///
/// Returns an error if the database cannot be opened or schema creation fails.
pub fn init_db<P: AsRef<Path>>(path: P) -> SqliteResult<DbPool> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Open an existing database without creating it.
///
/// Used by commands that only make sense after `init` has run.
pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(EchelonError::StoreUnavailable(
            rusqlite::Error::InvalidPath(path.to_path_buf()),
        ));
    }
    Ok(init_db(path)?)
}

/// Lock the connection.
///
/// A poisoned mutex only means another thread panicked mid-statement; SQLite
/// rolled back any open transaction, so the connection is still usable.
pub fn lock(db: &DbPool) -> MutexGuard<'_, Connection> {
    db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
