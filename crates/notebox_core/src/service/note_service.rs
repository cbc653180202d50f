//! Note use-case service.
//!
//! # Responsibility
//! - Provide the create/list/get/update/delete note use-cases.
//! - Attribute new notes to the authenticated caller.
//! - Validate identifiers before any store access.
//!
//! # Invariants
//! - `owner` always comes from the caller, never from client input.
//! - Listings are always owner-scoped and sorted newest first.
//! - Get/update/delete by id perform no ownership check.
//! - Logs carry ids, counts and durations only; never titles, contents or
//!   keywords.

use crate::model::note::{Caller, CreateNoteInput, Note, NoteChanges, NoteFilter};
use crate::repo::note_store::{
    KeywordMatcher, NewNote, NoteQuery, NoteSort, NoteStore, RepoError,
};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Identifier does not match the store's identifier format.
    InvalidIdentifier(String),
    /// Well-formed identifier that resolves to no note.
    NotFound(String),
    /// Persistence failure, propagated unchanged.
    Store(RepoError),
}

impl NoteServiceError {
    /// Stable machine-readable code for logs and transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store_failure",
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(_) => write!(f, "Please enter a valid id."),
            Self::NotFound(_) => write!(f, "Note does not exist."),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Stateless note service over a [`NoteStore`].
///
/// Holds no mutable state, so one instance can serve concurrent requests when
/// the store is shared (`NoteService<S>` is `Sync` whenever `S` is).
pub struct NoteService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> NoteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a note owned by `caller`.
    ///
    /// Any owner carried by `input` is discarded.
    pub fn create_note(&self, input: CreateNoteInput, caller: &Caller) -> NoteServiceResult<Note> {
        let started_at = Instant::now();
        if input.owner.as_deref().is_some_and(|owner| owner != caller.id) {
            debug!("event=note_create module=service status=owner_overridden");
        }

        let draft = NewNote {
            title: input.title,
            content: input.content,
            owner: caller.id.clone(),
        };
        let result = self.store.create(&draft).map_err(NoteServiceError::from);
        log_outcome("note_create", &result, started_at, |note| {
            format!("note_id={}", note.id)
        });
        result
    }

    /// Lists the caller's notes, newest first, optionally keyword-filtered.
    ///
    /// The keyword matches case-insensitively anywhere in title or content.
    /// An absent or empty keyword applies no text filter.
    pub fn get_all_notes(&self, caller_id: &str, filter: &NoteFilter) -> NoteServiceResult<Vec<Note>> {
        let started_at = Instant::now();
        let result = self.build_query(caller_id, filter).and_then(|query| {
            self.store
                .find_many(&query, NoteSort::CreatedAtDesc)
                .map_err(NoteServiceError::from)
        });
        log_outcome("note_list", &result, started_at, |notes| {
            format!(
                "keyword={} count={}",
                filter.effective_keyword().is_some(),
                notes.len()
            )
        });
        result
    }

    /// Fetches one note by identifier.
    pub fn get_note_by_id(&self, id: &str) -> NoteServiceResult<Note> {
        let started_at = Instant::now();
        let result = self.checked_id(id).and_then(|id| {
            self.store
                .find_by_id(id)?
                .ok_or_else(|| NoteServiceError::NotFound(id.to_string()))
        });
        log_outcome("note_get", &result, started_at, |note| {
            format!("note_id={}", note.id)
        });
        result
    }

    /// Applies `changes` to an existing note and returns the updated record.
    ///
    /// Identifier, owner and creation time are preserved.
    pub fn update_note(&self, id: &str, changes: &NoteChanges) -> NoteServiceResult<Note> {
        let started_at = Instant::now();
        let result = self.checked_id(id).and_then(|id| {
            self.store
                .update_by_id(id, changes)?
                .ok_or_else(|| NoteServiceError::NotFound(id.to_string()))
        });
        log_outcome("note_update", &result, started_at, |note| {
            format!("note_id={}", note.id)
        });
        result
    }

    /// Permanently removes a note and returns it as it was before removal.
    pub fn delete_note(&self, id: &str) -> NoteServiceResult<Note> {
        let started_at = Instant::now();
        let result = self.checked_id(id).and_then(|id| {
            self.store
                .delete_by_id(id)?
                .ok_or_else(|| NoteServiceError::NotFound(id.to_string()))
        });
        log_outcome("note_delete", &result, started_at, |note| {
            format!("note_id={}", note.id)
        });
        result
    }

    fn checked_id<'a>(&self, id: &'a str) -> NoteServiceResult<&'a str> {
        if self.store.is_valid_identifier_format(id) {
            Ok(id)
        } else {
            Err(NoteServiceError::InvalidIdentifier(id.to_string()))
        }
    }

    fn build_query(&self, caller_id: &str, filter: &NoteFilter) -> NoteServiceResult<NoteQuery> {
        let query = NoteQuery::owned_by(caller_id);
        match filter.effective_keyword() {
            Some(keyword) => Ok(query.with_keyword(KeywordMatcher::new(keyword)?)),
            None => Ok(query),
        }
    }
}

fn log_outcome<T>(
    event: &str,
    result: &NoteServiceResult<T>,
    started_at: Instant,
    describe: impl FnOnce(&T) -> String,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => info!(
            "event={event} module=service status=ok duration_ms={duration_ms} {}",
            describe(value)
        ),
        Err(NoteServiceError::Store(err)) => warn!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code=store_failure error={err}"
        ),
        Err(err) => info!(
            "event={event} module=service status=rejected duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::NoteServiceError;
    use crate::repo::note_store::RepoError;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            NoteServiceError::InvalidIdentifier("x".into()).code(),
            "invalid_identifier"
        );
        assert_eq!(NoteServiceError::NotFound("x".into()).code(), "not_found");
        assert_eq!(
            NoteServiceError::Store(RepoError::LockPoisoned).code(),
            "store_failure"
        );
    }

    #[test]
    fn error_messages_match_client_facing_text() {
        assert_eq!(
            NoteServiceError::InvalidIdentifier("x".into()).to_string(),
            "Please enter a valid id."
        );
        assert_eq!(
            NoteServiceError::NotFound("x".into()).to_string(),
            "Note does not exist."
        );
    }

    #[test]
    fn repo_errors_convert_to_store_failures() {
        let err: NoteServiceError = RepoError::InvalidData("bad row".into()).into();
        assert!(matches!(err, NoteServiceError::Store(RepoError::InvalidData(_))));
    }
}
