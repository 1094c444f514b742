//! Outbound HTTP clients for the third-party data providers.

mod geocode;
mod movies;
mod weather;
mod yelp;

pub use geocode::GeocodeClient;
pub use movies::MovieClient;
pub use weather::ForecastClient;
pub use yelp::YelpClient;

use std::time::{Duration, Instant};

use metrics::histogram;
use reqwest::{Client, Response};

use crate::application::providers::ProviderError;

// Upstream calls are bounded; a hung provider surfaces as a request error
// instead of a wedged request pipeline.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared outbound client all provider adapters use.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(PROVIDER_TIMEOUT).build()
}

fn map_request_error(err: reqwest::Error) -> ProviderError {
    if err.is_decode() {
        ProviderError::Decode(err.to_string())
    } else {
        ProviderError::Request(err.to_string())
    }
}

fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status {
            status: status.as_u16(),
        })
    }
}

fn record_fetch(provider: &'static str, started: Instant) {
    histogram!("cityscout_provider_fetch_ms", "provider" => provider)
        .record(started.elapsed().as_secs_f64() * 1000.0);
}
