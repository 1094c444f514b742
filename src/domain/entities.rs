//! Persisted record shapes mirrored from storage.

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A geocoded place. Created on the first successful geocode of a unique
/// `search_query` and immutable afterwards; every cached batch hangs off its
/// id.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LocationRecord {
    pub id: Uuid,
    pub search_query: String,
    pub formatted_query: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WeatherRecord {
    pub id: Uuid,
    pub location_id: Uuid,
    pub forecast: String,
    /// Fixed-width day label rendered from the provider's epoch seconds,
    /// e.g. `Sat Jan 01 2022`.
    pub forecast_time: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RestaurantRecord {
    pub id: Uuid,
    pub location_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub url: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MovieRecord {
    pub id: Uuid,
    pub location_id: Uuid,
    pub title: String,
    pub overview: String,
    pub average_votes: f64,
    pub total_votes: i64,
    pub image_url: Option<String>,
    pub popularity: f64,
    pub released_on: Option<String>,
    pub created_at: OffsetDateTime,
}
