use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::application::providers::{BusinessProvider, BusinessSearchResponse, ProviderError};

use super::{check_status, map_request_error, record_fetch};

const BUSINESS_SEARCH_BASE_URL: &str = "https://api.yelp.com/v3/businesses/search";

#[derive(Clone)]
pub struct YelpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YelpClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: BUSINESS_SEARCH_BASE_URL.to_owned(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl BusinessProvider for YelpClient {
    async fn search(&self, term: &str) -> Result<BusinessSearchResponse, ProviderError> {
        let url = Url::parse_with_params(&self.base_url, &[("location", term)])
            .map_err(|err| ProviderError::Request(err.to_string()))?;

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(map_request_error)?;
        let payload = check_status(response)?
            .json::<BusinessSearchResponse>()
            .await
            .map_err(map_request_error)?;
        record_fetch("yelp", started);
        Ok(payload)
    }
}
