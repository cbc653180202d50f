//! Domain model for per-user notes.
//!
//! # Responsibility
//! - Define the data structures shared by store implementations and services.
//!
//! # Invariants
//! - Every note has exactly one owner, fixed at creation.
//! - Deletion is permanent; there is no tombstone state.

pub mod note;
