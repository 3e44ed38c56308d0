/// Movie catalog client
///
/// API Flow:
/// 1. Page listing: /movies?page=N&sort_by=popularity&order=desc → lightweight summaries
/// 2. Detail: /movies/{id} → genres, language and runtime needed for scoring
///
/// A failed page listing aborts the whole fetch. A failed detail lookup only
/// degrades that one item to its summary.
use futures::stream::{self, StreamExt};
use reqwest::Client as HttpClient;

use crate::{
    error::UpstreamError,
    models::{CandidateItem, MovieDetail, MovieListResponse, MovieSummary},
    services::providers::{get_json, CatalogProvider},
};

const SERVICE_NAME: &str = "movie-service";

#[derive(Clone)]
pub struct CatalogClient {
    http_client: HttpClient,
    api_url: String,
    page_size: u32,
    /// Upper bound on concurrent detail requests
    detail_concurrency: usize,
}

impl CatalogClient {
    pub fn new(
        http_client: HttpClient,
        api_url: &str,
        page_size: u32,
        detail_concurrency: usize,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
            detail_concurrency: detail_concurrency.max(1),
        }
    }

    async fn fetch_page(&self, page: u32) -> Result<MovieListResponse, UpstreamError> {
        let url = format!("{}/movies", self.api_url);
        let query = [
            ("page", page.to_string()),
            ("page_size", self.page_size.to_string()),
            ("sort_by", "popularity".to_string()),
            ("order", "desc".to_string()),
        ];

        get_json(&self.http_client, SERVICE_NAME, &url, &query).await
    }

    async fn fetch_detail(&self, movie_id: i64) -> Result<MovieDetail, UpstreamError> {
        let url = format!("{}/movies/{}", self.api_url, movie_id);
        get_json(&self.http_client, SERVICE_NAME, &url, &[]).await
    }

    /// Resolves a page of summaries into candidates, keeping the page order
    async fn resolve_page(&self, summaries: Vec<MovieSummary>) -> Vec<CandidateItem> {
        stream::iter(summaries)
            .map(|summary| async move {
                match self.fetch_detail(summary.id).await {
                    Ok(detail) => CandidateItem::from(detail),
                    Err(e) => {
                        tracing::warn!(
                            movie_id = summary.id,
                            error = %e,
                            "Could not fetch movie detail, using list data"
                        );
                        CandidateItem::from(summary)
                    }
                }
            })
            .buffered(self.detail_concurrency)
            .collect()
            .await
    }
}

#[async_trait::async_trait]
impl CatalogProvider for CatalogClient {
    async fn fetch_pool(&self, depth: u32) -> Result<Vec<CandidateItem>, UpstreamError> {
        let mut pool = Vec::new();

        for page in 1..=depth {
            let listing = self.fetch_page(page).await?;
            let total_pages = listing.total_pages;

            pool.extend(self.resolve_page(listing.data).await);

            if page >= total_pages {
                break;
            }
        }

        tracing::info!(
            candidates = pool.len(),
            depth,
            provider = SERVICE_NAME,
            "Candidate pool fetched"
        );

        Ok(pool)
    }
}
