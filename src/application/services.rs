//! Application services: one per data kind, wiring gateway, provider, and
//! the cache-aside controller together.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::cache::{CacheController, CacheError};
use crate::application::mapping;
use crate::application::providers::{
    BusinessProvider, ForecastProvider, GeocodeProvider, MovieProvider,
};
use crate::application::repos::{LocationsRepo, RowStore};
use crate::domain::entities::{LocationRecord, MovieRecord, RestaurantRecord, WeatherRecord};

#[derive(Clone)]
pub struct LocationService {
    locations: Arc<dyn LocationsRepo>,
    geocoder: Arc<dyn GeocodeProvider>,
}

impl LocationService {
    pub fn new(locations: Arc<dyn LocationsRepo>, geocoder: Arc<dyn GeocodeProvider>) -> Self {
        Self {
            locations,
            geocoder,
        }
    }

    /// Resolve a free-text query to a stored location, geocoding only on
    /// first sight. The idempotent insert absorbs concurrent first sights:
    /// whichever row wins the conflict is the one every caller gets back.
    pub async fn resolve(&self, search_query: &str) -> Result<LocationRecord, CacheError> {
        if let Some(existing) = self.locations.find_by_search_query(search_query).await? {
            return Ok(existing);
        }

        let payload = self.geocoder.geocode(search_query).await?;
        let mapped = mapping::location_from_geocode(search_query, &payload)?;
        let resolved = self.locations.insert_location(&mapped).await?;
        info!(
            target = "cityscout::location",
            search_query,
            location_id = %resolved.id,
            "resolved new location"
        );
        Ok(resolved)
    }
}

#[derive(Clone)]
pub struct WeatherService {
    rows: Arc<dyn RowStore<WeatherRecord>>,
    provider: Arc<dyn ForecastProvider>,
    cache: Arc<CacheController>,
}

impl WeatherService {
    pub fn new(
        rows: Arc<dyn RowStore<WeatherRecord>>,
        provider: Arc<dyn ForecastProvider>,
        cache: Arc<CacheController>,
    ) -> Self {
        Self {
            rows,
            provider,
            cache,
        }
    }

    pub async fn forecasts(
        &self,
        location_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<WeatherRecord>, CacheError> {
        let provider = self.provider.clone();
        self.cache
            .lookup_or_fetch(self.rows.as_ref(), location_id, move || async move {
                let payload = provider.forecast(latitude, longitude).await?;
                Ok(mapping::weather_from_forecast(&payload, location_id)?)
            })
            .await
    }
}

#[derive(Clone)]
pub struct RestaurantService {
    rows: Arc<dyn RowStore<RestaurantRecord>>,
    provider: Arc<dyn BusinessProvider>,
    cache: Arc<CacheController>,
}

impl RestaurantService {
    pub fn new(
        rows: Arc<dyn RowStore<RestaurantRecord>>,
        provider: Arc<dyn BusinessProvider>,
        cache: Arc<CacheController>,
    ) -> Self {
        Self {
            rows,
            provider,
            cache,
        }
    }

    pub async fn restaurants(
        &self,
        location_id: Uuid,
        search_query: &str,
    ) -> Result<Vec<RestaurantRecord>, CacheError> {
        let provider = self.provider.clone();
        let term = search_query.to_owned();
        self.cache
            .lookup_or_fetch(self.rows.as_ref(), location_id, move || async move {
                let payload = provider.search(&term).await?;
                Ok(mapping::restaurants_from_search(&payload, location_id)?)
            })
            .await
    }
}

#[derive(Clone)]
pub struct MovieService {
    rows: Arc<dyn RowStore<MovieRecord>>,
    provider: Arc<dyn MovieProvider>,
    cache: Arc<CacheController>,
}

impl MovieService {
    pub fn new(
        rows: Arc<dyn RowStore<MovieRecord>>,
        provider: Arc<dyn MovieProvider>,
        cache: Arc<CacheController>,
    ) -> Self {
        Self {
            rows,
            provider,
            cache,
        }
    }

    pub async fn movies(
        &self,
        location_id: Uuid,
        search_query: &str,
    ) -> Result<Vec<MovieRecord>, CacheError> {
        let provider = self.provider.clone();
        let term = search_query.to_owned();
        self.cache
            .lookup_or_fetch(self.rows.as_ref(), location_id, move || async move {
                let payload = provider.search(&term).await?;
                Ok(mapping::movies_from_search(&payload, location_id)?)
            })
            .await
    }
}
