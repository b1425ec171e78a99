//! Open Library search API source.
//!
//! Searches `search.json` by title (and author when known), then derives a
//! covers.openlibrary.org URL from the best identifier the first match
//! carries: ISBN, then edition OLID, then the bare cover id.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use folio_core::{Error, Result};

use crate::sources::CoverSource;

const API_BASE: &str = "https://openlibrary.org";
const COVERS_BASE: &str = "https://covers.openlibrary.org";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Default, Deserialize)]
struct Doc {
    #[serde(default)]
    isbn: Vec<String>,
    #[serde(default)]
    edition_key: Vec<String>,
    #[serde(default)]
    cover_i: Option<i64>,
}

/// Open Library JSON API source.
pub struct OpenLibrarySource {
    client: Client,
    base_url: String,
    covers_base: String,
}

impl OpenLibrarySource {
    pub fn new(client: Client) -> Self {
        Self::with_base_urls(client, API_BASE, COVERS_BASE)
    }

    /// Override the API endpoints (tests point these at a mock server).
    pub fn with_base_urls(
        client: Client,
        base_url: impl Into<String>,
        covers_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            covers_base: covers_base.into(),
        }
    }

    fn cover_url(&self, doc: &Doc) -> Option<String> {
        if let Some(isbn) = doc.isbn.first() {
            return Some(format!("{}/b/isbn/{isbn}-L.jpg", self.covers_base));
        }
        if let Some(olid) = doc.edition_key.first() {
            return Some(format!("{}/b/olid/{olid}-L.jpg", self.covers_base));
        }
        doc.cover_i
            .map(|id| format!("{}/b/id/{id}-L.jpg", self.covers_base))
    }
}

#[async_trait]
impl CoverSource for OpenLibrarySource {
    fn name(&self) -> &'static str {
        "open_library"
    }

    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<Option<String>> {
        let url = format!("{}/search.json", self.base_url);
        let mut query = vec![("title", title)];
        if let Some(author) = author {
            query.push(("author", author));
        }
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::CoverSource(format!("open library search: {e}")))?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "open library returned non-success");
            return Ok(None);
        }
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::CoverSource(format!("open library body: {e}")))?;

        Ok(body.docs.first().and_then(|doc| self.cover_url(doc)))
    }
}
