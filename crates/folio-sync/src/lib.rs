//! # folio-sync
//!
//! The synchronization engine: aggregates parsed notes into book and
//! daily-activity projections, then reconciles all three entity sets against
//! the remote structured store with upsert semantics.
//!
//! Writes are idempotent (books keyed by name, notes by content fingerprint,
//! daily rows by date), so re-running a sync over identical input leaves the
//! store unchanged. Transient remote failures are retried
//! with bounded exponential backoff; permanent ones are recorded in the run
//! summary with the entity and key that failed, without aborting the rest of
//! the run.

pub mod engine;
pub mod projection;
pub mod records;
pub mod retry;

pub use engine::{SyncConfig, SyncEngine};
pub use projection::{project_books, project_daily};
pub use retry::RetryPolicy;
