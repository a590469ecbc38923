//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the four note operations the sweep pipeline needs:
//!   candidate listing, body fetch, body update, title update.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Candidate listing order is deterministic (`updated_at DESC,
//!   uuid ASC`).
//! - Updates are atomic at single-note granularity; there are no
//!   partial-write semantics.
//! - Unknown note ids surface as `NotFound`, never as silent no-ops.

use crate::db::DbError;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one stored note.
pub type NoteId = Uuid;

pub type NoteStoreResult<T> = Result<T, NoteStoreError>;

/// Error for note store operations.
#[derive(Debug)]
pub enum NoteStoreError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for NoteStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for NoteStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Listing row for candidate notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub name: String,
}

/// Note store collaborator contract consumed by the sweep pipeline.
pub trait NoteStore {
    /// Returns notes whose title contains `title_filter`
    /// (case-insensitive), newest first.
    fn list_candidate_notes(&self, title_filter: &str) -> NoteStoreResult<Vec<NoteSummary>>;
    /// Returns the full body of one note.
    fn fetch_note_body(&self, id: NoteId) -> NoteStoreResult<String>;
    /// Overwrites the full body of one note.
    fn update_note_body(&self, id: NoteId, body: &str) -> NoteStoreResult<()>;
    /// Overwrites the title of one note.
    fn update_note_title(&self, id: NoteId, title: &str) -> NoteStoreResult<()>;
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts one note and returns its stable id.
    ///
    /// Used by seeding tools and tests; the sweep pipeline itself only
    /// reads and rewrites.
    pub fn create_note(&self, name: &str, body: &str) -> NoteStoreResult<NoteId> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO notes (uuid, name, body) VALUES (?1, ?2, ?3);",
            params![id.to_string(), name, body],
        )?;
        Ok(id)
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn list_candidate_notes(&self, title_filter: &str) -> NoteStoreResult<Vec<NoteSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name
             FROM notes
             WHERE instr(lower(name), lower(?1)) > 0
             ORDER BY updated_at DESC, uuid ASC;",
        )?;

        let mut rows = stmt.query([title_filter])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_summary_row(row)?);
        }
        Ok(notes)
    }

    fn fetch_note_body(&self, id: NoteId) -> NoteStoreResult<String> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM notes WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(row.get("body")?),
            None => Err(NoteStoreError::NotFound(id)),
        }
    }

    fn update_note_body(&self, id: NoteId, body: &str) -> NoteStoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET body = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), body],
        )?;

        if changed == 0 {
            return Err(NoteStoreError::NotFound(id));
        }
        Ok(())
    }

    fn update_note_title(&self, id: NoteId, title: &str) -> NoteStoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), title],
        )?;

        if changed == 0 {
            return Err(NoteStoreError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_summary_row(row: &Row<'_>) -> NoteStoreResult<NoteSummary> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        NoteStoreError::InvalidData(format!("invalid uuid value `{uuid_text}` in notes.uuid"))
    })?;
    Ok(NoteSummary {
        id,
        name: row.get("name")?,
    })
}
