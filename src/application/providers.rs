//! Provider adapter contracts: the outbound boundary of the aggregator.
//!
//! Payloads are deserialized leniently; field requirements are enforced by
//! the mappers, so a transport/decoding failure and a shape mismatch stay
//! distinguishable.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned status {status}")]
    Status { status: u16 },
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: Option<String>,
    pub geometry: Option<GeocodeGeometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeGeometry {
    pub location: Option<GeocodePoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodePoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub daily: Option<ForecastDaily>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastDaily {
    #[serde(default)]
    pub data: Vec<DailyForecast>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyForecast {
    /// Unix epoch seconds of the forecast day.
    pub time: Option<i64>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessSearchResponse {
    #[serde(default)]
    pub businesses: Vec<Business>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Business {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieSearchResponse {
    #[serde(default)]
    pub results: Vec<MovieResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieResult {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub poster_path: Option<String>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
}

#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<GeocodeResponse, ProviderError>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast(&self, latitude: f64, longitude: f64)
    -> Result<ForecastResponse, ProviderError>;
}

#[async_trait]
pub trait BusinessProvider: Send + Sync {
    async fn search(&self, term: &str) -> Result<BusinessSearchResponse, ProviderError>;
}

#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn search(&self, term: &str) -> Result<MovieSearchResponse, ProviderError>;
}
