//! Core domain logic for NoteBox: per-user notes with owner-scoped listing.
//!
//! Transports and identity providers live outside this crate; they hand a
//! [`Caller`] and plain request values to [`NoteService`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    Caller, CreateNoteInput, Note, NoteChanges, NoteFilter, NoteId, NoteValidationError, UserId,
};
pub use repo::note_store::{
    KeywordMatcher, NewNote, NoteQuery, NoteSort, NoteStore, RepoError, RepoResult,
};
pub use repo::sqlite_note_store::SqliteNoteStore;
pub use service::note_service::{NoteService, NoteServiceError, NoteServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
