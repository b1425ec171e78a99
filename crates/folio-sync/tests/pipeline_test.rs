//! End-to-end: export text through the parser into the sync engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use folio_core::{Collection, ItemType, MemoryStore, Result};
use folio_covers::{CoverCache, CoverResolver, CoverSource};
use folio_sync::{SyncConfig, SyncEngine};

const SAMPLE: &str = "\
三体

刘慈欣

共2个笔记

第一章

◆ 2024/03/01发表想法
值得重读

◆ 黑暗森林法则是宇宙社会学的基石

-- 来自微信读书
";

struct FixedCover(&'static str);

#[async_trait]
impl CoverSource for FixedCover {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn lookup(&self, _title: &str, _author: Option<&str>) -> Result<Option<String>> {
        Ok(Some(self.0.to_string()))
    }
}

async fn cover_resolver(dir: &tempfile::TempDir, url: &'static str) -> Arc<CoverResolver> {
    let cache = CoverCache::load(dir.path().join("covers.json")).await;
    Arc::new(CoverResolver::with_sources(
        vec![Arc::new(FixedCover(url))],
        cache,
    ))
}

#[tokio::test]
async fn export_text_lands_as_books_notes_and_daily_rows() {
    let notes = folio_parser::parse(SAMPLE).unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].item_type, ItemType::Thought);
    assert_eq!(notes[1].item_type, ItemType::Highlight);

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), SyncConfig::default())
        .with_cover_resolver(cover_resolver(&dir, "https://img.example.com/santi.jpg").await);

    let summary = engine.sync(&notes).await.unwrap();
    assert!(summary.is_clean());
    assert_eq!(summary.books_upserted, 1);
    assert_eq!(summary.notes_upserted, 2);
    assert_eq!(summary.daily_rows_upserted, 1);

    let books = store.records(Collection::Books).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].fields["name"], json!("三体"));
    assert_eq!(books[0].fields["author"], json!("刘慈欣"));
    assert_eq!(books[0].fields["annual_list_year"], json!(2024));
    assert_eq!(
        books[0].fields["cover_url"],
        json!("https://img.example.com/santi.jpg")
    );

    let daily = store.records(Collection::Daily).await;
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].fields["date"], json!("2024-03-01"));
    assert_eq!(daily[0].fields["notes_count"], json!(1));

    // Every note references the book it belongs to.
    let book_id = &books[0].id;
    for record in store.records(Collection::Notes).await {
        assert_eq!(record.fields["book_id"], json!(book_id));
        assert_eq!(record.fields["section_title"], json!("第一章"));
    }
}

#[tokio::test]
async fn re_running_the_pipeline_changes_nothing() {
    let notes = folio_parser::parse(SAMPLE).unwrap();
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), SyncConfig::default());

    engine.sync(&notes).await.unwrap();
    let before: Vec<_> = store.records(Collection::Notes).await;

    // Re-parse from scratch: fingerprints are content-derived, so the
    // second pass updates in place.
    let reparsed = folio_parser::parse(SAMPLE).unwrap();
    engine.sync(&reparsed).await.unwrap();
    let after: Vec<_> = store.records(Collection::Notes).await;

    assert_eq!(before.len(), after.len());
    assert_eq!(
        before.iter().map(|r| &r.id).collect::<Vec<_>>(),
        after.iter().map(|r| &r.id).collect::<Vec<_>>()
    );
    assert_eq!(store.len(Collection::Books).await, 1);
    assert_eq!(store.len(Collection::Daily).await, 1);
}

#[tokio::test]
async fn parser_tolerates_extra_blank_lines_without_changing_fingerprints() {
    let spaced = SAMPLE.replace("值得重读\n", "值得重读\n\n");
    let plain = folio_parser::parse(SAMPLE).unwrap();
    let tolerant = folio_parser::parse(&spaced).unwrap();

    assert_eq!(plain.len(), tolerant.len());
    for (a, b) in plain.iter().zip(tolerant.iter()) {
        assert_eq!(a.fingerprint, b.fingerprint);
    }
}
