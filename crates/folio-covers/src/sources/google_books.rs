//! Google Books volumes API source.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use folio_core::Result;

use crate::sources::CoverSource;

const API_BASE: &str = "https://www.googleapis.com/books/v1";

/// Thumbnail keys in descending size preference.
const IMAGE_SIZES: [&str; 5] = [
    "extraLarge",
    "large",
    "medium",
    "thumbnail",
    "smallThumbnail",
];

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeInfo {
    #[serde(rename = "imageLinks", default)]
    image_links: HashMap<String, String>,
}

/// Google Books JSON API source.
pub struct GoogleBooksSource {
    client: Client,
    base_url: String,
}

impl GoogleBooksSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, API_BASE)
    }

    /// Override the API endpoint (tests point this at a mock server).
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Pick the largest available thumbnail, upgraded to https.
    fn pick_image(info: &VolumeInfo) -> Option<String> {
        for size in IMAGE_SIZES {
            if let Some(url) = info.image_links.get(size) {
                if let Some(rest) = url.strip_prefix("http://") {
                    return Some(format!("https://{rest}"));
                }
                return Some(url.clone());
            }
        }
        None
    }
}

#[async_trait]
impl CoverSource for GoogleBooksSource {
    fn name(&self) -> &'static str {
        "google_books"
    }

    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<Option<String>> {
        // Author-qualified query first, bare title as fallback.
        let mut queries = Vec::new();
        if let Some(author) = author {
            queries.push(format!("{title}+inauthor:{author}"));
        }
        queries.push(title.to_string());

        let url = format!("{}/volumes", self.base_url);
        for query in queries {
            let response = match self
                .client
                .get(&url)
                .query(&[("q", query.as_str()), ("maxResults", "1")])
                .send()
                .await
            {
                Ok(response) => response,
                Err(error) => {
                    debug!(%error, "google books request failed");
                    continue;
                }
            };
            if !response.status().is_success() {
                debug!(status = %response.status(), "google books returned non-success");
                continue;
            }
            let body: VolumesResponse = match response.json().await {
                Ok(body) => body,
                Err(error) => {
                    debug!(%error, "google books response did not parse");
                    continue;
                }
            };
            if let Some(url) = body.items.first().and_then(|v| Self::pick_image(&v.volume_info)) {
                return Ok(Some(url));
            }
        }
        Ok(None)
    }
}
