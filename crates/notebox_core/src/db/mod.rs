//! Database bootstrap for the SQLite note store.
//!
//! Connections handed to [`crate::SqliteNoteStore`] come from here: they are
//! migrated to the `notes` schema this build understands, and the store
//! refuses connections whose `notes` table does not match it.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or checking the note database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build; its notes may use columns
    /// this build cannot read back.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// Connection was not migrated (table missing) or a column is absent.
    NotesSchemaMismatch { missing: &'static str },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "note database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "note database is at schema v{db_version}, this build reads up to v{latest_supported}"
            ),
            Self::NotesSchemaMismatch { missing } => write!(
                f,
                "note database lacks `{missing}`; open it through db::open_db"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::NotesSchemaMismatch { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
