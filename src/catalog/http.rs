use super::*;
use reqwest::Url;

/// Catalog served by an external HTTP service.
///
/// Queries `GET {base_url}/genres/{genre_id}/candidates?count={count}` and
/// expects a JSON array of candidates back. The genre id always travels as a
/// single percent-encoded path segment.
pub struct HttpCatalog {
    base_url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(base_url: String, timeout: Duration) -> CatalogResult<Self> {
        let base_url = Url::parse(&base_url)
            .map_err(|e| CatalogError::LoadError(format!("Invalid catalog URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::LoadError(format!(
                "Catalog URL {} cannot have a path",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::LoadError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            timeout,
            client,
        })
    }

    fn candidates_url(&self, genre_id: &str, count: usize) -> CatalogResult<Url> {
        // "." and ".." would be dropped as segments and change the route
        if matches!(genre_id, "." | "..") {
            return Err(CatalogError::ApiError(format!("invalid genre id {:?}", genre_id)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::ApiError("catalog URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["genres", genre_id, "candidates"]);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("count", &count.to_string());
        Ok(url)
    }
}

#[async_trait]
impl ContentSource for HttpCatalog {
    async fn find_candidates(
        &self,
        genre_id: &str,
        count: usize,
    ) -> CatalogResult<Vec<Candidate>> {
        let url = self.candidates_url(genre_id, count)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout(self.timeout)
                } else {
                    CatalogError::ApiError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(CatalogError::ApiError(format!(
                "catalog returned status {}",
                response.status()
            )));
        }

        let mut candidates: Vec<Candidate> = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        candidates.truncate(count);
        tracing::debug!(
            "Catalog returned {} candidates for genre {}",
            candidates.len(),
            genre_id
        );
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "http"
    }
}
