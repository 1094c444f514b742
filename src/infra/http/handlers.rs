//! Request handlers for the aggregation surface.
//!
//! Dependent routes receive the location object the client previously got
//! from `/location`, URL-encoded as JSON in the `data` query parameter.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::application::error::{AppError, ErrorReport};
use crate::domain::entities::{LocationRecord, MovieRecord, RestaurantRecord, WeatherRecord};

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct DataQuery {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherTarget {
    id: Uuid,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct SearchTarget {
    id: Uuid,
    search_query: String,
}

fn decode_data<T: DeserializeOwned>(data: Option<&str>) -> Result<T, AppError> {
    let raw = data
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::validation("`data` query parameter is required"))?;
    serde_json::from_str(raw)
        .map_err(|err| AppError::validation(format!("`data` is not a valid target: {err}")))
}

pub(super) async fn location(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Json<LocationRecord>, AppError> {
    let search_query = query
        .data
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::validation("`data` query parameter is required"))?;

    let record = state.locations.resolve(search_query).await?;
    Ok(Json(record))
}

pub(super) async fn weather(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Json<Vec<WeatherRecord>>, AppError> {
    let target: WeatherTarget = decode_data(query.data.as_deref())?;
    let rows = state
        .weather
        .forecasts(target.id, target.latitude, target.longitude)
        .await?;
    Ok(Json(rows))
}

pub(super) async fn restaurants(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Json<Vec<RestaurantRecord>>, AppError> {
    let service = state.restaurants.as_ref().ok_or(AppError::NotFound)?;
    let target: SearchTarget = decode_data(query.data.as_deref())?;
    let rows = service.restaurants(target.id, &target.search_query).await?;
    Ok(Json(rows))
}

pub(super) async fn movies(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Json<Vec<MovieRecord>>, AppError> {
    let service = state.movies.as_ref().ok_or(AppError::NotFound)?;
    let target: SearchTarget = decode_data(query.data.as_deref())?;
    let rows = service.movies(target.id, &target.search_query).await?;
    Ok(Json(rows))
}

pub(super) async fn db_health(State(state): State<AppState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
