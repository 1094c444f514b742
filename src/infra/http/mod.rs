mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::services::{
    LocationService, MovieService, RestaurantService, WeatherService,
};
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct AppState {
    pub locations: LocationService,
    pub weather: WeatherService,
    /// Absent when the dining provider is disabled; the route is not mounted.
    pub restaurants: Option<RestaurantService>,
    /// Absent when the movie provider is disabled; the route is not mounted.
    pub movies: Option<MovieService>,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/location", get(handlers::location))
        .route("/weather", get(handlers::weather))
        .route("/_health/db", get(handlers::db_health));

    if state.restaurants.is_some() {
        router = router.route("/yelp", get(handlers::restaurants));
    }
    if state.movies.is_some() {
        router = router.route("/movies", get(handlers::movies));
    }

    router
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}
