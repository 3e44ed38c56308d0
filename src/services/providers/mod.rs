/// Upstream data providers
///
/// The recommendation pipeline reads from two independently owned services: the
/// user preference service and the movie catalog. Each is reached through a
/// trait so the orchestrator can be exercised without the network.
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{
    error::UpstreamError,
    models::{CandidateItem, UserPreferenceProfile},
};

pub mod catalog;
pub mod preferences;

pub use catalog::CatalogClient;
pub use preferences::PreferenceClient;

/// Source of user preference profiles
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceProvider: Send + Sync {
    /// Fetches the profile of `user_id` in a single attempt
    async fn fetch_preferences(&self, user_id: i64) -> Result<UserPreferenceProfile, UpstreamError>;
}

/// Source of candidate items
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetches up to `depth` pages of candidates, most popular first
    async fn fetch_pool(&self, depth: u32) -> Result<Vec<CandidateItem>, UpstreamError>;
}

/// Builds the HTTP client shared by the upstream providers
pub fn build_http_client(timeout: Duration) -> reqwest::Result<HttpClient> {
    HttpClient::builder().timeout(timeout).build()
}

/// Sends a GET request and decodes a JSON body, mapping every failure mode
/// onto an [`UpstreamError`]
async fn get_json<T: DeserializeOwned>(
    http_client: &HttpClient,
    service: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, UpstreamError> {
    let response = http_client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode {
        service,
        message: e.to_string(),
    })
}
