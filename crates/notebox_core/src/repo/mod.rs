//! Store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the note store interface the service layer depends on.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Store writes validate required note fields before persistence.
//! - Absent records are reported as `None`, not as errors; the service layer
//!   turns them into `NotFound`.

pub mod note_store;
pub mod sqlite_note_store;
