use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;

use crate::application::providers::{ForecastProvider, ForecastResponse, ProviderError};

use super::{check_status, map_request_error, record_fetch};

const FORECAST_BASE_URL: &str = "https://api.darksky.net/forecast";

/// Dark-Sky-shaped forecast endpoint: `{base}/{key}/{lat},{lng}` returning a
/// `daily.data` block of day summaries.
#[derive(Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ForecastClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: FORECAST_BASE_URL.to_owned(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ForecastProvider for ForecastClient {
    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastResponse, ProviderError> {
        let url = format!(
            "{}/{}/{},{}",
            self.base_url, self.api_key, latitude, longitude
        );

        let started = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;
        let payload = check_status(response)?
            .json::<ForecastResponse>()
            .await
            .map_err(map_request_error)?;
        record_fetch("weather", started);
        Ok(payload)
    }
}
