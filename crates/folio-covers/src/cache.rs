//! Persistent cover-lookup cache.
//!
//! Maps `(title, author)` to a previously resolved URL or an explicit
//! not-found marker, so repeated runs neither re-query known covers nor
//! hammer sources for books that have none. The file survives process
//! restarts; a missing or corrupt file simply starts the cache empty.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use folio_core::Result;

/// On-disk JSON cache of cover resolutions.
///
/// Values are the resolved URL, or JSON `null` for a known "no cover found".
/// Every read-modify-write happens under one lock (single-writer
/// discipline), so concurrent resolutions of the same title cannot lose
/// updates.
pub struct CoverCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, Option<String>>>,
}

impl CoverCache {
    /// Load the cache file, tolerating a missing or unreadable one.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(path = %path.display(), %error, "cover cache is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn key(title: &str, author: Option<&str>) -> String {
        format!("{title}|{}", author.unwrap_or(""))
    }

    /// Cached outcome for a book, if any: `Some(Some(url))` for a known
    /// cover, `Some(None)` for a known miss, `None` when never resolved.
    pub async fn get(&self, title: &str, author: Option<&str>) -> Option<Option<String>> {
        self.entries
            .lock()
            .await
            .get(&Self::key(title, author))
            .cloned()
    }

    /// Record an outcome (including "not found") and persist the file.
    pub async fn put(&self, title: &str, author: Option<&str>, outcome: Option<String>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(Self::key(title, author), outcome);
        let serialized = serde_json::to_string_pretty(&*entries)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serialized).await?;
        debug!(path = %self.path.display(), entries = entries.len(), "cover cache persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("covers.json")
    }

    #[tokio::test]
    async fn test_get_on_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::load(cache_path(&dir)).await;
        assert_eq!(cache.get("三体", Some("刘慈欣")).await, None);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::load(cache_path(&dir)).await;
        cache
            .put("三体", Some("刘慈欣"), Some("https://img.example.com/c.jpg".into()))
            .await
            .unwrap();
        assert_eq!(
            cache.get("三体", Some("刘慈欣")).await,
            Some(Some("https://img.example.com/c.jpg".into()))
        );
    }

    #[tokio::test]
    async fn test_not_found_marker_is_distinct_from_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::load(cache_path(&dir)).await;
        cache.put("unknown book", None, None).await.unwrap();
        assert_eq!(cache.get("unknown book", None).await, Some(None));
        assert_eq!(cache.get("other book", None).await, None);
    }

    #[tokio::test]
    async fn test_cache_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        {
            let cache = CoverCache::load(&path).await;
            cache
                .put("三体", Some("刘慈欣"), Some("https://img.example.com/c.jpg".into()))
                .await
                .unwrap();
            cache.put("no cover book", None, None).await.unwrap();
        }

        let reloaded = CoverCache::load(&path).await;
        assert_eq!(
            reloaded.get("三体", Some("刘慈欣")).await,
            Some(Some("https://img.example.com/c.jpg".into()))
        );
        assert_eq!(reloaded.get("no cover book", None).await, Some(None));
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        tokio::fs::write(&path, "{not json").await.unwrap();

        let cache = CoverCache::load(&path).await;
        assert_eq!(cache.get("三体", None).await, None);

        // And it is writable again afterwards.
        cache.put("三体", None, None).await.unwrap();
        assert_eq!(cache.get("三体", None).await, Some(None));
    }

    #[tokio::test]
    async fn test_author_is_part_of_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::load(cache_path(&dir)).await;
        cache
            .put("title", Some("author a"), Some("https://a.example.com".into()))
            .await
            .unwrap();
        assert_eq!(cache.get("title", Some("author b")).await, None);
    }
}
