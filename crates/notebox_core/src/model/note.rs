//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and the caller identity value object.
//! - Define the typed inputs accepted by the note use-cases.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - `owner` is set once, from the authenticated caller, at creation time.
//! - Client-supplied owner fields are accepted on input but never persisted.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned stable identifier of a note.
pub type NoteId = Uuid;

/// Opaque user identifier handed out by the identity provider.
pub type UserId = String;

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// User the note is permanently attributed to.
    pub owner: UserId,
    /// Unix epoch milliseconds, set by the store on insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by the store on every update.
    pub updated_at: i64,
}

impl Note {
    /// Checks required-field rules shared by every write path.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_fields(&self.title, &self.content)
    }
}

/// Authenticated identity a request executes as.
///
/// Built by the transport from whatever the identity provider returned; the
/// core never authenticates on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
}

impl Caller {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self { id: id.into() }
    }
}

/// Creation payload as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateNoteInput {
    pub title: String,
    pub content: String,
    /// Ignored. Present only so payloads carrying an owner still parse.
    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

impl CreateNoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            owner: None,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NoteChanges {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }
}

/// Listing filter as received from a client query string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteFilter {
    #[serde(default)]
    pub keyword: Option<String>,
}

impl NoteFilter {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
        }
    }

    /// Keyword to search for, with the empty string treated as absent.
    pub fn effective_keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|value| !value.is_empty())
    }
}

/// Required-field violations for note records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyContent,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::EmptyContent => write!(f, "note content must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

pub(crate) fn validate_fields(title: &str, content: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    if content.trim().is_empty() {
        return Err(NoteValidationError::EmptyContent);
    }
    Ok(())
}
