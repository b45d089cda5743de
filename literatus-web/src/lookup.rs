//! Google Books lookup client
//!
//! Thin metadata search used when adding a book: free-text query in,
//! up to five `{title, author}` candidates out. The engine never depends
//! on this; a lookup failure only degrades the search box.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default volumes API host; override via `Config::lookup_base_url`.
pub const GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1";
const MAX_RESULTS: u32 = 5;

/// Lookup client errors
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}")]
    Api(u16),
}

/// One search candidate
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookHit {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
}

/// Client for the Google Books volumes API
pub struct BookLookup {
    client: reqwest::Client,
    base_url: String,
}

impl BookLookup {
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_BOOKS_BASE_URL.to_string())
    }

    /// Client against a non-default base URL (tests point this at a stub)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Search volumes by free-text query, best five matches
    pub async fn search(&self, query: &str) -> Result<Vec<BookHit>, LookupError> {
        let url = format!("{}/volumes", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("maxResults", &MAX_RESULTS.to_string())])
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::Api(response.status().as_u16()));
        }

        let volumes: VolumesResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let hits: Vec<BookHit> = volumes
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                let info = v.volume_info.unwrap_or(VolumeInfo {
                    title: None,
                    authors: None,
                });
                BookHit {
                    title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
                    author: info
                        .authors
                        .and_then(|a| a.into_iter().next())
                        .unwrap_or_else(|| "Unknown Author".to_string()),
                }
            })
            .collect();

        debug!("Lookup '{}' returned {} candidates", query, hits.len());
        Ok(hits)
    }
}

impl Default for BookLookup {
    fn default() -> Self {
        Self::new()
    }
}
