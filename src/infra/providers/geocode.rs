use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::application::providers::{GeocodeProvider, GeocodeResponse, ProviderError};

use super::{check_status, map_request_error, record_fetch};

const GEOCODE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeocodeClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: GEOCODE_BASE_URL.to_owned(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GeocodeProvider for GeocodeClient {
    async fn geocode(&self, query: &str) -> Result<GeocodeResponse, ProviderError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[("address", query), ("key", self.api_key.as_str())],
        )
        .map_err(|err| ProviderError::Request(err.to_string()))?;

        let started = Instant::now();
        let response = self.client.get(url).send().await.map_err(map_request_error)?;
        let payload = check_status(response)?
            .json::<GeocodeResponse>()
            .await
            .map_err(map_request_error)?;
        record_fetch("geocoding", started);
        Ok(payload)
    }
}
