//! Note store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the note-store collaborator contract the sweep pipeline
//!   consumes.
//! - Isolate SQLite query details from pipeline orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod note_repo;
