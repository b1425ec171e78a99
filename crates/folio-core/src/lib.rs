//! # folio-core
//!
//! Core types, traits, and abstractions for the folio reading-note sync
//! library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other folio crates depend on: the note data model, the content
//! fingerprint used as an idempotency key, the error taxonomy, and the
//! abstract structured-store interface the sync engine writes through.

pub mod defaults;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod store;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use models::*;
pub use store::{Collection, FieldMap, MemoryStore, StoredRecord, StructuredStore};
