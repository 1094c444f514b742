//! Pure mappers from raw provider payloads to persistable records.
//!
//! `created_at` is stamped here, at mapping time; persistence stores the
//! stamp untouched, so a cached batch ages from the moment it was mapped.

use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

use crate::application::providers::{
    BusinessSearchResponse, ForecastResponse, GeocodeResponse, MovieSearchResponse,
};
use crate::domain::entities::{LocationRecord, MovieRecord, RestaurantRecord, WeatherRecord};

const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("provider payload is missing `{field}`")]
    MissingField { field: &'static str },
    #[error("provider payload field `{field}` is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl MappingError {
    fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }
}

pub fn location_from_geocode(
    search_query: &str,
    payload: &GeocodeResponse,
) -> Result<LocationRecord, MappingError> {
    let first = payload
        .results
        .first()
        .ok_or_else(|| MappingError::missing("results"))?;
    let formatted_query = first
        .formatted_address
        .clone()
        .ok_or_else(|| MappingError::missing("results[0].formatted_address"))?;
    let point = first
        .geometry
        .as_ref()
        .and_then(|geometry| geometry.location.as_ref())
        .ok_or_else(|| MappingError::missing("results[0].geometry.location"))?;

    Ok(LocationRecord {
        id: Uuid::new_v4(),
        search_query: search_query.to_owned(),
        formatted_query,
        latitude: point.lat,
        longitude: point.lng,
        created_at: OffsetDateTime::now_utc(),
    })
}

pub fn weather_from_forecast(
    payload: &ForecastResponse,
    location_id: Uuid,
) -> Result<Vec<WeatherRecord>, MappingError> {
    let daily = payload
        .daily
        .as_ref()
        .ok_or_else(|| MappingError::missing("daily"))?;
    let stamped_at = OffsetDateTime::now_utc();

    daily
        .data
        .iter()
        .map(|day| {
            let epoch = day
                .time
                .ok_or_else(|| MappingError::missing("daily.data[].time"))?;
            let forecast = day
                .summary
                .clone()
                .ok_or_else(|| MappingError::missing("daily.data[].summary"))?;
            Ok(WeatherRecord {
                id: Uuid::new_v4(),
                location_id,
                forecast,
                forecast_time: day_label(epoch)?,
                created_at: stamped_at,
            })
        })
        .collect()
}

pub fn restaurants_from_search(
    payload: &BusinessSearchResponse,
    location_id: Uuid,
) -> Result<Vec<RestaurantRecord>, MappingError> {
    let stamped_at = OffsetDateTime::now_utc();

    payload
        .businesses
        .iter()
        .map(|business| {
            let name = business
                .name
                .clone()
                .ok_or_else(|| MappingError::missing("businesses[].name"))?;
            let url = business
                .url
                .clone()
                .ok_or_else(|| MappingError::missing("businesses[].url"))?;
            Ok(RestaurantRecord {
                id: Uuid::new_v4(),
                location_id,
                name,
                image_url: business.image_url.clone(),
                price: business.price.clone(),
                rating: business.rating,
                url,
                created_at: stamped_at,
            })
        })
        .collect()
}

pub fn movies_from_search(
    payload: &MovieSearchResponse,
    location_id: Uuid,
) -> Result<Vec<MovieRecord>, MappingError> {
    let stamped_at = OffsetDateTime::now_utc();

    payload
        .results
        .iter()
        .map(|movie| {
            let title = movie
                .title
                .clone()
                .ok_or_else(|| MappingError::missing("results[].title"))?;
            Ok(MovieRecord {
                id: Uuid::new_v4(),
                location_id,
                title,
                overview: movie.overview.clone().unwrap_or_default(),
                average_votes: movie.vote_average.unwrap_or(0.0),
                total_votes: movie.vote_count.unwrap_or(0),
                image_url: movie
                    .poster_path
                    .as_deref()
                    .map(|path| format!("{TMDB_IMAGE_BASE}{path}")),
                popularity: movie.popularity.unwrap_or(0.0),
                released_on: movie.release_date.clone(),
                created_at: stamped_at,
            })
        })
        .collect()
}

/// Render epoch seconds as the fixed-width day label shown to clients,
/// e.g. `Sat Jan 01 2022`.
fn day_label(epoch_seconds: i64) -> Result<String, MappingError> {
    let moment = OffsetDateTime::from_unix_timestamp(epoch_seconds)
        .map_err(|err| MappingError::malformed("daily.data[].time", err.to_string()))?;
    let format = format_description!("[weekday repr:short] [month repr:short] [day] [year]");
    moment
        .format(&format)
        .map_err(|err| MappingError::malformed("daily.data[].time", err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::providers::{DailyForecast, ForecastDaily};

    fn forecast_payload(days: Vec<DailyForecast>) -> ForecastResponse {
        ForecastResponse {
            daily: Some(ForecastDaily { data: days }),
        }
    }

    #[test]
    fn epoch_seconds_render_as_fixed_width_day_label() {
        // 2022-01-01T08:00:00Z, a Saturday.
        assert_eq!(day_label(1_641_024_000).unwrap(), "Sat Jan 01 2022");
    }

    #[test]
    fn forecast_days_map_to_one_record_each() {
        let location_id = Uuid::new_v4();
        let payload = forecast_payload(vec![
            DailyForecast {
                time: Some(1_641_024_000),
                summary: Some("Clear throughout the day.".to_owned()),
            },
            DailyForecast {
                time: Some(1_641_110_400),
                summary: Some("Light rain in the morning.".to_owned()),
            },
        ]);

        let records = weather_from_forecast(&payload, location_id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].forecast, "Clear throughout the day.");
        assert_eq!(records[0].forecast_time, "Sat Jan 01 2022");
        assert_eq!(records[1].forecast_time, "Sun Jan 02 2022");
        assert!(records.iter().all(|r| r.location_id == location_id));
        // One batch, one fetch epoch.
        assert_eq!(records[0].created_at, records[1].created_at);
    }

    #[test]
    fn forecast_without_daily_block_is_a_mapping_error() {
        let payload = ForecastResponse { daily: None };
        let err = weather_from_forecast(&payload, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, MappingError::MissingField { field: "daily" }));
    }

    #[test]
    fn forecast_day_without_summary_is_a_mapping_error() {
        let payload = forecast_payload(vec![DailyForecast {
            time: Some(1_641_024_000),
            summary: None,
        }]);
        let err = weather_from_forecast(&payload, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, MappingError::MissingField { .. }));
    }

    #[test]
    fn geocode_with_no_results_is_a_mapping_error() {
        let payload: GeocodeResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        let err = location_from_geocode("nowhere", &payload).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingField { field: "results" }
        ));
    }

    #[test]
    fn geocode_maps_first_result() {
        let payload: GeocodeResponse = serde_json::from_str(
            r#"{
                "results": [
                    {
                        "formatted_address": "Seattle, WA, USA",
                        "geometry": {"location": {"lat": 47.6062, "lng": -122.3321}}
                    },
                    {
                        "formatted_address": "Seattle, Other, USA",
                        "geometry": {"location": {"lat": 0.0, "lng": 0.0}}
                    }
                ]
            }"#,
        )
        .unwrap();

        let record = location_from_geocode("Seattle", &payload).unwrap();
        assert_eq!(record.search_query, "Seattle");
        assert_eq!(record.formatted_query, "Seattle, WA, USA");
        assert_eq!(record.latitude, 47.6062);
        assert_eq!(record.longitude, -122.3321);
    }

    #[test]
    fn movie_poster_path_is_prefixed_with_image_base() {
        let payload: MovieSearchResponse = serde_json::from_str(
            r#"{
                "results": [
                    {
                        "title": "Sleepless in Seattle",
                        "overview": "A widower's son calls a radio show.",
                        "vote_average": 6.8,
                        "vote_count": 2100,
                        "poster_path": "/sleepless.jpg",
                        "popularity": 18.4,
                        "release_date": "1993-06-24"
                    }
                ]
            }"#,
        )
        .unwrap();

        let records = movies_from_search(&payload, Uuid::new_v4()).unwrap();
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/sleepless.jpg")
        );
        assert_eq!(records[0].total_votes, 2100);
    }

    #[test]
    fn business_without_name_is_a_mapping_error() {
        let payload: BusinessSearchResponse = serde_json::from_str(
            r#"{"businesses": [{"url": "https://example.com/biz", "rating": 4.5}]}"#,
        )
        .unwrap();
        let err = restaurants_from_search(&payload, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, MappingError::MissingField { .. }));
    }
}
