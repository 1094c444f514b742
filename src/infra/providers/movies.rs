use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::application::providers::{MovieProvider, MovieSearchResponse, ProviderError};

use super::{check_status, map_request_error, record_fetch};

const MOVIE_SEARCH_BASE_URL: &str = "https://api.themoviedb.org/3/search/movie";

#[derive(Clone)]
pub struct MovieClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MovieClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: MOVIE_SEARCH_BASE_URL.to_owned(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl MovieProvider for MovieClient {
    async fn search(&self, term: &str) -> Result<MovieSearchResponse, ProviderError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[("api_key", self.api_key.as_str()), ("query", term)],
        )
        .map_err(|err| ProviderError::Request(err.to_string()))?;

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_request_error)?;
        let payload = check_status(response)?
            .json::<MovieSearchResponse>()
            .await
            .map_err(map_request_error)?;
        record_fetch("movies", started);
        Ok(payload)
    }
}
