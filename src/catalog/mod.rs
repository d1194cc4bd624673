//! Content catalog the questions are drawn from.
//!
//! The catalog itself (genres, albums, songs) is managed elsewhere; the game
//! only needs a random handful of songs for a genre.

mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CatalogConfig;

pub use http::HttpCatalog;
pub use memory::StaticCatalog;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    ApiError(String),

    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to load catalog: {0}")]
    LoadError(String),

    #[error("catalog response parsing failed: {0}")]
    ParseError(String),
}

/// One playable item that can become a question option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub title: String,
    pub artist: String,
    /// Playable media, usually a YouTube URL
    pub media_ref: String,
}

impl Candidate {
    /// Text shown on the answer button
    pub fn display(&self) -> String {
        format!("{} — {}", self.title, self.artist)
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Up to `count` randomly chosen candidates for a genre.
    ///
    /// Returning fewer than asked for is not an error here; the caller decides.
    async fn find_candidates(&self, genre_id: &str, count: usize)
        -> CatalogResult<Vec<Candidate>>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Pull the 11-character video id out of a YouTube URL.
///
/// Handles `watch?v=`, `youtu.be/` and `embed/` forms. Anything else is
/// returned unchanged so non-YouTube media still plays.
pub fn extract_youtube_id(url: &str) -> String {
    for marker in ["v=", "youtu.be/", "embed/"] {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            let id: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .take(11)
                .collect();
            if id.len() == 11 {
                return id;
            }
        }
    }
    url.to_string()
}

impl CatalogConfig {
    /// Build the configured content source: the remote service if a URL is
    /// set, else the JSON file, else an empty in-memory catalog
    pub fn build_source(&self) -> CatalogResult<Arc<dyn ContentSource>> {
        if let Some(url) = &self.url {
            tracing::info!("Using catalog service at {}", url);
            return Ok(Arc::new(HttpCatalog::new(url.clone(), self.timeout)?));
        }
        if let Some(path) = &self.file {
            let catalog = StaticCatalog::from_file(path)?;
            tracing::info!(
                "Loaded {} songs in {} genres from {}",
                catalog.song_count(),
                catalog.genre_count(),
                path.display()
            );
            return Ok(Arc::new(catalog));
        }
        tracing::warn!("No CATALOG_URL or CATALOG_FILE set, every genre will be empty");
        Ok(Arc::new(StaticCatalog::new()))
    }
}
