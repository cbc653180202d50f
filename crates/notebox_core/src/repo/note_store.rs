//! Note store contract.
//!
//! # Responsibility
//! - Describe the narrow persistence interface the note service depends on.
//! - Describe owner-scoped, keyword-filtered queries without binding them to a
//!   specific storage engine's query language.
//!
//! # Invariants
//! - Stores assign `id`, `created_at` and `updated_at`; callers never do.
//! - Single-record operations are atomic inside the store.
//! - `find_many` never returns records whose owner differs from the query owner.

use crate::db::DbError;
use crate::model::note::{Note, NoteChanges, NoteValidationError, UserId};
use regex::{Regex, RegexBuilder};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer failure. Surfaces to service callers as a store failure.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    /// Keyword could not be compiled into a matcher.
    InvalidQuery(String),
    /// Persisted row does not decode into a valid note.
    InvalidData(String),
    /// Connection lock was poisoned by a panicking holder.
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidQuery(message) => write!(f, "invalid note query: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::LockPoisoned => write!(f, "note store connection lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidQuery(_) | Self::InvalidData(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Draft handed to [`NoteStore::create`]. The owner is already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub owner: UserId,
}

/// Case-insensitive literal substring predicate.
///
/// The keyword is escaped before compilation, so regex metacharacters in user
/// input match themselves.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Regex,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> RepoResult<Self> {
        let pattern = RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
            .map_err(|err| RepoError::InvalidQuery(err.to_string()))?;
        Ok(Self { pattern })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }

    /// True when any of `fields` contains the keyword.
    pub fn matches_any(&self, fields: &[&str]) -> bool {
        fields.iter().any(|field| self.is_match(field))
    }

    /// Title OR content predicate used by note listings.
    pub fn matches_note(&self, note: &Note) -> bool {
        self.matches_any(&[note.title.as_str(), note.content.as_str()])
    }
}

/// Filter for [`NoteStore::find_many`]:
/// `owner == self.owner AND (keyword is None OR title ~* k OR content ~* k)`.
#[derive(Debug, Clone)]
pub struct NoteQuery {
    pub owner: UserId,
    pub keyword: Option<KeywordMatcher>,
}

impl NoteQuery {
    pub fn owned_by(owner: impl Into<UserId>) -> Self {
        Self {
            owner: owner.into(),
            keyword: None,
        }
    }

    pub fn with_keyword(mut self, matcher: KeywordMatcher) -> Self {
        self.keyword = Some(matcher);
        self
    }

    pub fn matches(&self, note: &Note) -> bool {
        note.owner == self.owner
            && self
                .keyword
                .as_ref()
                .map_or(true, |matcher| matcher.matches_note(note))
    }
}

/// Result ordering for [`NoteStore::find_many`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSort {
    /// Newest first; ties keep insertion order.
    CreatedAtDesc,
}

/// Persistence interface for notes.
///
/// Identifier arguments are raw strings; callers are expected to check them
/// with [`NoteStore::is_valid_identifier_format`] first. Stores treat a
/// malformed identifier as "absent".
pub trait NoteStore: Send + Sync {
    fn is_valid_identifier_format(&self, id: &str) -> bool;
    fn create(&self, note: &NewNote) -> RepoResult<Note>;
    fn find_many(&self, query: &NoteQuery, sort: NoteSort) -> RepoResult<Vec<Note>>;
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Note>>;
    /// Applies `changes` and returns the record as stored afterwards.
    fn update_by_id(&self, id: &str, changes: &NoteChanges) -> RepoResult<Option<Note>>;
    /// Removes the record and returns it as it was before removal.
    fn delete_by_id(&self, id: &str) -> RepoResult<Option<Note>>;
}
