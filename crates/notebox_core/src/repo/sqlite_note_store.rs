//! SQLite-backed note store.
//!
//! # Responsibility
//! - Implement [`NoteStore`] over the `notes` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate required fields before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Every trait call holds the connection lock for one statement, which
//!   makes the connection mutex the only serialization point.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::note::{validate_fields, Note, NoteChanges, NoteId, NoteValidationError};
use crate::repo::note_store::{
    NewNote, NoteQuery, NoteSort, NoteStore, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const NOTE_COLUMNS: &str = "id, title, content, owner, created_at, updated_at";
const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "title",
    "content",
    "owner",
    "created_at",
    "updated_at",
];

/// Note store over one migrated SQLite connection.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
}

impl SqliteNoteStore {
    /// Wraps a migrated connection after checking the `notes` schema.
    pub fn new(conn: Connection) -> RepoResult<Self> {
        ensure_notes_table_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::new(open_db(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl NoteStore for SqliteNoteStore {
    fn is_valid_identifier_format(&self, id: &str) -> bool {
        Uuid::parse_str(id).is_ok()
    }

    fn create(&self, note: &NewNote) -> RepoResult<Note> {
        validate_fields(&note.title, &note.content)?;

        let now = now_epoch_ms();
        let created = Note {
            id: Uuid::new_v4(),
            title: note.title.clone(),
            content: note.content.clone(),
            owner: note.owner.clone(),
            created_at: now,
            updated_at: now,
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notes (id, title, content, owner, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                created.id.to_string(),
                created.title.as_str(),
                created.content.as_str(),
                created.owner.as_str(),
                created.created_at,
                created.updated_at,
            ],
        )?;

        Ok(created)
    }

    fn find_many(&self, query: &NoteQuery, sort: NoteSort) -> RepoResult<Vec<Note>> {
        let order_by = match sort {
            NoteSort::CreatedAtDesc => "created_at DESC, rowid ASC",
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM notes
             WHERE owner = ?1
             ORDER BY {order_by};"
        ))?;
        let mut rows = stmt.query([query.owner.as_str()])?;

        // Owner scoping and ordering run in SQL; the keyword predicate runs
        // here so that case folding is Unicode-aware.
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let note = parse_note_row(row)?;
            if query.matches(&note) {
                notes.push(note);
            }
        }

        Ok(notes)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Note>> {
        let Some(note_id) = parse_id(id) else {
            return Ok(None);
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM notes
             WHERE id = ?1;"
        ))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }

        Ok(None)
    }

    fn update_by_id(&self, id: &str, changes: &NoteChanges) -> RepoResult<Option<Note>> {
        let Some(note_id) = parse_id(id) else {
            return Ok(None);
        };

        let conn = self.lock()?;
        // Unknown ids win over invalid changes.
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
            params![note_id.to_string()],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(None);
        }
        validate_changes(changes)?;

        let mut stmt = conn.prepare(&format!(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                updated_at = MAX(?4, updated_at)
             WHERE id = ?1
             RETURNING {NOTE_COLUMNS};"
        ))?;
        let rows = stmt.query(params![
            note_id.to_string(),
            changes.title.as_deref(),
            changes.content.as_deref(),
            now_epoch_ms(),
        ])?;

        first_returned(rows)
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<Option<Note>> {
        let Some(note_id) = parse_id(id) else {
            return Ok(None);
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "DELETE FROM notes
             WHERE id = ?1
             RETURNING {NOTE_COLUMNS};"
        ))?;
        let rows = stmt.query([note_id.to_string()])?;

        first_returned(rows)
    }
}

/// Drains a `RETURNING` cursor so the statement runs to completion.
fn first_returned(mut rows: rusqlite::Rows<'_>) -> RepoResult<Option<Note>> {
    let mut first = None;
    while let Some(row) = rows.next()? {
        if first.is_none() {
            first = Some(parse_note_row(row)?);
        }
    }
    Ok(first)
}

fn validate_changes(changes: &NoteChanges) -> Result<(), NoteValidationError> {
    if changes
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(NoteValidationError::EmptyTitle);
    }
    if changes
        .content
        .as_deref()
        .is_some_and(|content| content.trim().is_empty())
    {
        return Err(NoteValidationError::EmptyContent);
    }
    Ok(())
}

fn parse_id(value: &str) -> Option<NoteId> {
    Uuid::parse_str(value).ok()
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in notes.id")))?;

    let note = Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        owner: row.get("owner")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn ensure_notes_table_ready(conn: &Connection) -> RepoResult<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(notes);")?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        let column: String = row.get(1)?;
        present.push(column);
    }

    if present.is_empty() {
        return Err(DbError::NotesSchemaMismatch { missing: "notes" }.into());
    }

    for column in REQUIRED_COLUMNS {
        if !present.iter().any(|current| current == column) {
            return Err(DbError::NotesSchemaMismatch { missing: column }.into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{now_epoch_ms, SqliteNoteStore};
    use crate::db::DbError;
    use crate::model::note::NoteChanges;
    use crate::repo::note_store::{NewNote, NoteStore, RepoError};
    use rusqlite::Connection;

    #[test]
    fn new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteNoteStore::new(conn).err().expect("missing table must fail");
        assert!(matches!(
            err,
            RepoError::Db(DbError::NotesSchemaMismatch { missing: "notes" })
        ));
    }

    #[test]
    fn new_names_the_first_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE notes (id TEXT PRIMARY KEY, title TEXT);")
            .unwrap();
        let err = SqliteNoteStore::new(conn).err().expect("partial table must fail");
        assert!(matches!(
            err,
            RepoError::Db(DbError::NotesSchemaMismatch { missing: "content" })
        ));
        assert!(err.to_string().contains("`content`"));
    }

    #[test]
    fn malformed_ids_resolve_to_absent() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        assert!(!store.is_valid_identifier_format("not-an-id"));
        assert!(store.find_by_id("not-an-id").unwrap().is_none());
        assert!(store
            .update_by_id("not-an-id", &NoteChanges::title("x"))
            .unwrap()
            .is_none());
        assert!(store.delete_by_id("not-an-id").unwrap().is_none());
    }

    #[test]
    fn create_rejects_blank_title_before_insert() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let err = store
            .create(&NewNote {
                title: " ".to_string(),
                content: "body".to_string(),
                owner: "u1".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn update_rejects_blank_content() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let created = store
            .create(&NewNote {
                title: "t".to_string(),
                content: "c".to_string(),
                owner: "u1".to_string(),
            })
            .unwrap();
        let err = store
            .update_by_id(&created.id.to_string(), &NoteChanges::content(""))
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        let unchanged = store.find_by_id(&created.id.to_string()).unwrap().unwrap();
        assert_eq!(unchanged.content, "c");
    }

    #[test]
    fn update_of_unknown_id_is_absent_even_with_blank_changes() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        assert!(store
            .update_by_id(&id, &NoteChanges::title(""))
            .unwrap()
            .is_none());
    }

    #[test]
    fn clock_is_after_epoch() {
        assert!(now_epoch_ms() > 0);
    }
}
