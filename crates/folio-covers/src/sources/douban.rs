//! Douban book-catalogue source (scraped).
//!
//! Two-step lookup: search the subject catalogue for the first book link,
//! then pull the cover image from the detail page. Both requests pass
//! through the shared [`RateLimiter`]; Douban blocks clients that query
//! faster than about one request per second.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use folio_core::{Error, Result};

use crate::rate_limit::RateLimiter;
use crate::sources::CoverSource;

const SEARCH_BASE: &str = "https://search.douban.com";
const BOOK_BASE: &str = "https://book.douban.com";

static SUBJECT_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]*/subject/\d+[^"]*)""#).expect("valid link regex"));

// Cover extraction cascade, most reliable first.
static OG_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta[^>]*property="og:image"[^>]*content="([^"]+)""#).expect("valid og regex")
});
static MAINPIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<img[^>]*id="mainpic"[^>]*src="([^"]+)""#).expect("valid mainpic regex")
});
static NBG_IMG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="nbg"[^>]*>.*?<img[^>]*src="([^"]+)""#)
        .expect("valid nbg regex")
});

/// Scraped Douban source.
pub struct DoubanSource {
    client: Client,
    search_base: String,
    book_base: String,
    limiter: Arc<RateLimiter>,
}

impl DoubanSource {
    pub fn new(client: Client, limiter: Arc<RateLimiter>) -> Self {
        Self::with_base_urls(client, limiter, SEARCH_BASE, BOOK_BASE)
    }

    /// Override the catalogue endpoints (tests point these at a mock server).
    pub fn with_base_urls(
        client: Client,
        limiter: Arc<RateLimiter>,
        search_base: impl Into<String>,
        book_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            search_base: search_base.into(),
            book_base: book_base.into(),
            limiter,
        }
    }

    /// Search results link to detail pages with scheme-relative or
    /// path-relative hrefs; normalize to an absolute URL.
    fn normalize_detail_url(&self, href: &str) -> String {
        if href.starts_with("//") {
            format!("https:{href}")
        } else if href.starts_with('/') {
            format!("{}{href}", self.book_base)
        } else if !href.starts_with("http") {
            format!("{}/{href}", self.book_base)
        } else {
            href.to_string()
        }
    }

    fn extract_cover(html: &str) -> Option<String> {
        for pattern in [&OG_IMAGE_RE, &MAINPIC_RE, &NBG_IMG_RE] {
            if let Some(captures) = pattern.captures(html) {
                if let Some(url) = captures.get(1) {
                    return Some(url.as_str().to_string());
                }
            }
        }
        None
    }
}

#[async_trait]
impl CoverSource for DoubanSource {
    fn name(&self) -> &'static str {
        "douban"
    }

    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<Option<String>> {
        let mut query = title.to_string();
        if let Some(author) = author {
            query.push(' ');
            query.push_str(author);
        }

        self.limiter.acquire().await;
        let search_url = format!("{}/book/subject_search", self.search_base);
        let response = self
            .client
            .get(&search_url)
            .query(&[("search_text", query.as_str())])
            .send()
            .await
            .map_err(|e| Error::CoverSource(format!("douban search: {e}")))?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "douban search returned non-success");
            return Ok(None);
        }
        let html = response
            .text()
            .await
            .map_err(|e| Error::CoverSource(format!("douban search body: {e}")))?;

        let Some(href) = SUBJECT_LINK_RE
            .captures(&html)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
        else {
            return Ok(None);
        };
        let detail_url = self.normalize_detail_url(href);

        self.limiter.acquire().await;
        let response = self
            .client
            .get(&detail_url)
            .send()
            .await
            .map_err(|e| Error::CoverSource(format!("douban detail: {e}")))?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "douban detail returned non-success");
            return Ok(None);
        }
        let html = response
            .text()
            .await
            .map_err(|e| Error::CoverSource(format!("douban detail body: {e}")))?;

        Ok(Self::extract_cover(&html))
    }
}
