/// User preference service client
///
/// API Flow:
/// 1. Profile: /users/{id}/preferences → preferred genres, language, min rating
use reqwest::Client as HttpClient;

use crate::{
    error::UpstreamError,
    models::UserPreferenceProfile,
    services::providers::{get_json, PreferenceProvider},
};

const SERVICE_NAME: &str = "user-preference-service";

#[derive(Clone)]
pub struct PreferenceClient {
    http_client: HttpClient,
    api_url: String,
}

impl PreferenceClient {
    pub fn new(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn profile_url(&self, user_id: i64) -> String {
        format!("{}/users/{}/preferences", self.api_url, user_id)
    }
}

#[async_trait::async_trait]
impl PreferenceProvider for PreferenceClient {
    async fn fetch_preferences(&self, user_id: i64) -> Result<UserPreferenceProfile, UpstreamError> {
        let profile: UserPreferenceProfile =
            get_json(&self.http_client, SERVICE_NAME, &self.profile_url(user_id), &[]).await?;

        tracing::debug!(
            user_id,
            genres = profile.preferred_genres.len(),
            "Fetched user preferences"
        );

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_url_trims_trailing_slash() {
        let client = PreferenceClient::new(HttpClient::new(), "http://prefs.local/api/v1/");
        assert_eq!(
            client.profile_url(17),
            "http://prefs.local/api/v1/users/17/preferences"
        );
    }
}
