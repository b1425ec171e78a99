//! The cover resolver: ordered fallback over lookup sources.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use folio_core::{defaults, Error, Result};

use crate::cache::CoverCache;
use crate::rate_limit::RateLimiter;
use crate::script::has_cjk;
use crate::sources::{CoverSource, DoubanSource, GoogleBooksSource, OpenLibrarySource};

/// Configuration for a [`CoverResolver`].
#[derive(Debug, Clone)]
pub struct CoverResolverConfig {
    /// Location of the persistent cover cache file.
    pub cache_path: PathBuf,
    /// Minimum spacing between requests to the scraped source.
    pub rate_limit: Duration,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl Default for CoverResolverConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(defaults::COVER_CACHE_PATH),
            rate_limit: Duration::from_millis(defaults::COVER_RATE_LIMIT_MS),
            http_timeout: Duration::from_secs(defaults::COVER_HTTP_TIMEOUT_SECS),
        }
    }
}

impl CoverResolverConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `FOLIO_COVER_CACHE` | `.cache/covers.json` | Cache file location |
    /// | `FOLIO_COVER_RATE_LIMIT_MS` | `1000` | Scraped-source request spacing |
    /// | `FOLIO_COVER_TIMEOUT_SECS` | `12` | Per-request HTTP timeout |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("FOLIO_COVER_CACHE") {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(ms) = std::env::var("FOLIO_COVER_RATE_LIMIT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.rate_limit = Duration::from_millis(ms);
        }
        if let Some(secs) = std::env::var("FOLIO_COVER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.http_timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Strip book-title marks and quotation marks, collapse whitespace.
///
/// Search endpoints match better without `《》` and quote characters; the
/// cache keeps the original title so cleanup never changes identity.
pub fn clean_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|ch| !matches!(ch, '《' | '》' | '"' | '“' | '”'))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves cover artwork through an ordered fallback chain of sources.
///
/// CJK titles/authors search `[douban, google_books, open_library]`; all
/// others the reverse. The first source returning a URL wins; exhausting the
/// chain yields `None`. Never errors past this boundary.
pub struct CoverResolver {
    cjk_first: Vec<Arc<dyn CoverSource>>,
    latin_first: Vec<Arc<dyn CoverSource>>,
    cache: CoverCache,
}

impl CoverResolver {
    /// Build the production resolver: all three sources, shared rate limiter
    /// on the scraped one, cache loaded from disk.
    pub async fn new(config: CoverResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(defaults::COVER_USER_AGENT)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));

        let sources: Vec<Arc<dyn CoverSource>> = vec![
            Arc::new(DoubanSource::new(client.clone(), limiter)),
            Arc::new(GoogleBooksSource::new(client.clone())),
            Arc::new(OpenLibrarySource::new(client)),
        ];
        let cache = CoverCache::load(&config.cache_path).await;

        info!(
            cache_path = %config.cache_path.display(),
            rate_limit_ms = config.rate_limit.as_millis() as u64,
            "Cover resolver initialized"
        );
        Ok(Self::assemble(sources, cache))
    }

    /// Build a resolver over explicit sources, given in CJK-first order.
    /// The non-CJK chain is the same list reversed.
    pub fn with_sources(sources: Vec<Arc<dyn CoverSource>>, cache: CoverCache) -> Self {
        Self::assemble(sources, cache)
    }

    fn assemble(cjk_first: Vec<Arc<dyn CoverSource>>, cache: CoverCache) -> Self {
        let latin_first = cjk_first.iter().rev().cloned().collect();
        Self {
            cjk_first,
            latin_first,
            cache,
        }
    }

    /// Resolve a cover URL for a book, or `None` when no source has one.
    pub async fn resolve(&self, title: &str, author: Option<&str>) -> Option<String> {
        if let Some(cached) = self.cache.get(title, author).await {
            debug!(title, found = cached.is_some(), "cover cache hit");
            return cached;
        }

        let cjk = has_cjk(title) || author.map(has_cjk).unwrap_or(false);
        let chain = if cjk { &self.cjk_first } else { &self.latin_first };
        let cleaned = clean_title(title);

        let mut resolved = None;
        for source in chain {
            match source.lookup(&cleaned, author).await {
                Ok(Some(url)) => {
                    debug!(title, source = source.name(), "cover resolved");
                    resolved = Some(url);
                    break;
                }
                Ok(None) => {
                    debug!(title, source = source.name(), "source has no cover");
                }
                Err(error) => {
                    warn!(title, source = source.name(), %error, "cover source failed");
                }
            }
        }

        if let Err(error) = self.cache.put(title, author, resolved.clone()).await {
            warn!(title, %error, "failed to persist cover cache");
        }
        resolved
    }
}
