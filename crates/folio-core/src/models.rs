//! Core data model: parsed notes and the projections derived from them.
//!
//! A [`Note`] is created once per parse pass from one block of export text
//! and is immutable afterwards; re-ingestion of an edited export supersedes
//! it by upsert under the same fingerprint. [`BookProjection`] and
//! [`DailyActivity`] are derived aggregates recomputed in full on every sync
//! run; they exist only as the current computed state of the remote store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of note item captured from one export block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Only highlighted text is present.
    Highlight,
    /// Only the reader's own thought is present.
    Thought,
    /// Both a thought and its quoted original text are present.
    Mixed,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Highlight => write!(f, "highlight"),
            Self::Thought => write!(f, "thought"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// One excerpt or thought captured from a book.
///
/// Belongs to exactly one book (by title) and at most one section. At least
/// one of `highlight_text` / `note_text` is non-empty on every emitted note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub book_title: String,
    /// Author lines from the export header, joined with a single space.
    pub author: Option<String>,
    /// Chapter/heading context active when the note was captured.
    pub section_title: Option<String>,
    pub item_type: ItemType,
    pub highlight_text: Option<String>,
    pub note_text: Option<String>,
    /// Absent when the source line carried no date token.
    pub created_date: Option<NaiveDate>,
    /// Provenance tag; [`crate::defaults::SOURCE_TAG`] for parsed exports.
    pub source: String,
    /// Content-derived idempotency key, see [`crate::fingerprint`].
    pub fingerprint: String,
}

/// Derived book aggregate, recomputed fully on every sync run.
///
/// Upserted into the remote store keyed by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookProjection {
    pub name: String,
    /// Author from the first-seen note for this title.
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub last_import_time: DateTime<Utc>,
    /// Year of the most recent dated note for this book.
    pub annual_list_year: Option<i32>,
}

/// Derived per-day note count, recomputed fully on every sync run.
///
/// Upserted keyed by `date`. Notes without a `created_date` never contribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub notes_count: u32,
    pub last_import_time: DateTime<Utc>,
}

/// Entity classes reconciled against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Book,
    Note,
    Daily,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Book => write!(f, "book"),
            Self::Note => write!(f, "note"),
            Self::Daily => write!(f, "daily"),
        }
    }
}

/// One non-fatal failure recorded during a sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub entity: EntityKind,
    /// Upsert key of the record that failed (book name, note fingerprint,
    /// or daily date).
    pub key: String,
    pub error: String,
}

/// Outcome of one sync run: what succeeded, and what failed with attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub books_upserted: usize,
    pub notes_upserted: usize,
    pub daily_rows_upserted: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncSummary {
    /// True when every entity write succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
