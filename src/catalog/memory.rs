use super::*;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::path::Path;

/// On-disk catalog format
#[derive(Debug, Deserialize)]
struct CatalogFile {
    genres: HashMap<String, Vec<Candidate>>,
}

/// Catalog held entirely in memory, optionally loaded from a JSON file:
///
/// ```json
/// { "genres": { "rock": [ { "title": "…", "artist": "…", "mediaRef": "https://youtu.be/…" } ] } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    genres: HashMap<String, Vec<Candidate>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the songs of a genre
    pub fn with_genre(mut self, genre_id: impl Into<String>, songs: Vec<Candidate>) -> Self {
        self.genres.insert(genre_id.into(), songs);
        self
    }

    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        Ok(Self {
            genres: file.genres,
        })
    }

    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::LoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn genre_count(&self) -> usize {
        self.genres.len()
    }

    pub fn song_count(&self) -> usize {
        self.genres.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ContentSource for StaticCatalog {
    async fn find_candidates(
        &self,
        genre_id: &str,
        count: usize,
    ) -> CatalogResult<Vec<Candidate>> {
        let mut songs = self.genres.get(genre_id).cloned().unwrap_or_default();
        songs.shuffle(&mut rand::rng());
        songs.truncate(count);
        Ok(songs)
    }

    fn name(&self) -> &str {
        "static"
    }
}
