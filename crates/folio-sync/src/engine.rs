//! The sync engine: projections plus retried upserts, in relation order.
//!
//! Books are written before the notes that reference them, and daily rows
//! last. A failure on one entity is recorded and the run continues; only an
//! unreachable store aborts the whole run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tracing::{info, warn};

use folio_core::{
    defaults, BookProjection, Collection, DailyActivity, EntityKind, Error, FieldMap, Note,
    Result, StoredRecord, StructuredStore, SyncFailure, SyncSummary,
};
use folio_covers::CoverResolver;

use crate::projection::{project_books, project_daily};
use crate::records::{book_fields, daily_fields, field, note_fields};
use crate::retry::RetryPolicy;

/// Configuration for a [`SyncEngine`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub retry: RetryPolicy,
    /// How many cover lookups run concurrently.
    pub cover_fan_out: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            cover_fan_out: defaults::COVER_FAN_OUT,
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `FOLIO_RETRY_MAX_ATTEMPTS` | `3` | Attempts per remote write |
    /// | `FOLIO_RETRY_BASE_DELAY_MS` | `500` | First backoff delay |
    /// | `FOLIO_COVER_FAN_OUT` | `4` | Concurrent cover lookups |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(attempts) = std::env::var("FOLIO_RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(ms) = std::env::var("FOLIO_RETRY_BASE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(fan_out) = std::env::var("FOLIO_COVER_FAN_OUT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.cover_fan_out = fan_out.max(1);
        }
        config
    }
}

/// Reconciles parsed notes against the remote store with upsert semantics.
pub struct SyncEngine {
    store: Arc<dyn StructuredStore>,
    covers: Option<Arc<CoverResolver>>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn StructuredStore>, config: SyncConfig) -> Self {
        Self {
            store,
            covers: None,
            config,
        }
    }

    /// Enable cover enrichment for book projections.
    pub fn with_cover_resolver(mut self, resolver: Arc<CoverResolver>) -> Self {
        self.covers = Some(resolver);
        self
    }

    /// Run one full sync pass over the given notes.
    pub async fn sync(&self, notes: &[Note]) -> Result<SyncSummary> {
        let now = Utc::now();
        let mut summary = SyncSummary::default();

        let mut books = project_books(notes, now);
        self.resolve_covers(&mut books).await;
        let book_ids = self.upsert_books(&books, &mut summary).await?;
        self.upsert_notes(notes, &book_ids, &mut summary).await?;
        let daily = project_daily(notes, now);
        self.upsert_daily(&daily, &mut summary).await?;

        info!(
            books = summary.books_upserted,
            notes = summary.notes_upserted,
            daily_rows = summary.daily_rows_upserted,
            failures = summary.failures.len(),
            "sync run complete"
        );
        Ok(summary)
    }

    /// Attach cover URLs with bounded concurrent fan-out. The resolver owns
    /// caching and rate limiting; this stage only schedules the lookups.
    async fn resolve_covers(&self, books: &mut [BookProjection]) {
        let Some(resolver) = &self.covers else {
            return;
        };
        let lookups = books.iter().map(|book| {
            let resolver = Arc::clone(resolver);
            let title = book.name.clone();
            let author = book.author.clone();
            async move { resolver.resolve(&title, author.as_deref()).await }
        });
        let covers: Vec<Option<String>> = stream::iter(lookups)
            .buffered(self.config.cover_fan_out.max(1))
            .collect()
            .await;
        for (book, cover_url) in books.iter_mut().zip(covers) {
            book.cover_url = cover_url;
        }
    }

    async fn upsert_books(
        &self,
        books: &[BookProjection],
        summary: &mut SyncSummary,
    ) -> Result<HashMap<String, String>> {
        let mut book_ids = HashMap::new();
        for book in books {
            let outcome = self
                .upsert_one(
                    Collection::Books,
                    field::NAME,
                    json!(book.name),
                    book_fields(book),
                )
                .await;
            match outcome {
                Ok(record) => {
                    book_ids.insert(book.name.clone(), record.id);
                    summary.books_upserted += 1;
                }
                Err(error) => {
                    self.record_failure(summary, EntityKind::Book, &book.name, error)?
                }
            }
        }
        Ok(book_ids)
    }

    async fn upsert_notes(
        &self,
        notes: &[Note],
        book_ids: &HashMap<String, String>,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        for note in notes {
            let Some(book_id) = book_ids.get(&note.book_title) else {
                // The book upsert failed; writing the note would break the
                // remote relation.
                self.record_failure(
                    summary,
                    EntityKind::Note,
                    &note.fingerprint,
                    Error::Internal(format!("book \"{}\" was not upserted", note.book_title)),
                )?;
                continue;
            };
            let outcome = self
                .upsert_one(
                    Collection::Notes,
                    field::FINGERPRINT,
                    json!(note.fingerprint),
                    note_fields(note, book_id),
                )
                .await;
            match outcome {
                Ok(_) => summary.notes_upserted += 1,
                Err(error) => {
                    self.record_failure(summary, EntityKind::Note, &note.fingerprint, error)?
                }
            }
        }
        Ok(())
    }

    async fn upsert_daily(
        &self,
        rows: &[DailyActivity],
        summary: &mut SyncSummary,
    ) -> Result<()> {
        for row in rows {
            let key = row.date.to_string();
            let outcome = self
                .upsert_one(
                    Collection::Daily,
                    field::DATE,
                    Value::String(key.clone()),
                    daily_fields(row),
                )
                .await;
            match outcome {
                Ok(_) => summary.daily_rows_upserted += 1,
                Err(error) => self.record_failure(summary, EntityKind::Daily, &key, error)?,
            }
        }
        Ok(())
    }

    /// Create-if-absent, else update-in-place, with retry on transient
    /// store failures.
    async fn upsert_one(
        &self,
        collection: Collection,
        key_field: &'static str,
        key_value: Value,
        fields: FieldMap,
    ) -> Result<StoredRecord> {
        let op = format!("{collection}.upsert");
        self.config
            .retry
            .run(&op, || {
                let store = Arc::clone(&self.store);
                let key_value = key_value.clone();
                let fields = fields.clone();
                async move {
                    match store.find_by_key(collection, key_field, &key_value).await? {
                        Some(existing) => store.update(collection, &existing.id, fields).await,
                        None => store.create(collection, fields).await,
                    }
                }
            })
            .await
    }

    /// Record a non-fatal failure and continue, or abort the run when the
    /// store is unreachable at the transport level.
    fn record_failure(
        &self,
        summary: &mut SyncSummary,
        entity: EntityKind,
        key: &str,
        error: Error,
    ) -> Result<()> {
        if matches!(error, Error::Request(_)) {
            return Err(error);
        }
        warn!(entity = %entity, key, %error, "entity upsert failed");
        summary.failures.push(SyncFailure {
            entity,
            key: key.to_string(),
            error: error.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.retry.max_attempts, defaults::RETRY_MAX_ATTEMPTS);
        assert_eq!(config.cover_fan_out, defaults::COVER_FAN_OUT);
    }
}
