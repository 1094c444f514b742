use std::{process, sync::Arc};

use cityscout::{
    application::{
        cache::CacheController,
        error::AppError,
        providers::{BusinessProvider, ForecastProvider, GeocodeProvider, MovieProvider},
        repos::{LocationsRepo, RowStore},
        services::{LocationService, MovieService, RestaurantService, WeatherService},
    },
    config,
    domain::entities::{MovieRecord, RestaurantRecord, WeatherRecord},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        providers::{ForecastClient, GeocodeClient, MovieClient, YelpClient, http_client},
        telemetry,
    },
};
use sqlx::postgres::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn connect_pool(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target = "cityscout::migrate", "migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let state = build_application_state(repositories, &settings)?;

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "cityscout::server",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, http::build_router(state).into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

fn build_application_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<AppState, AppError> {
    let client = http_client().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to build outbound http client: {err}"
        )))
    })?;

    let providers = &settings.providers;
    let cache = Arc::new(CacheController::new());

    let geocoder: Arc<dyn GeocodeProvider> = {
        let mut adapter = GeocodeClient::new(
            client.clone(),
            required_key(&providers.geocoding.api_key, "providers.geocoding.api_key")?,
        );
        if let Some(base_url) = providers.geocoding.base_url.as_ref() {
            adapter = adapter.with_base_url(base_url.clone());
        }
        Arc::new(adapter)
    };

    let forecaster: Arc<dyn ForecastProvider> = {
        let mut adapter = ForecastClient::new(
            client.clone(),
            required_key(&providers.weather.api_key, "providers.weather.api_key")?,
        );
        if let Some(base_url) = providers.weather.base_url.as_ref() {
            adapter = adapter.with_base_url(base_url.clone());
        }
        Arc::new(adapter)
    };

    let locations_repo: Arc<dyn LocationsRepo> = repositories.clone();
    let weather_rows: Arc<dyn RowStore<WeatherRecord>> = repositories.clone();

    let restaurants = if providers.yelp.enabled {
        let mut adapter = YelpClient::new(
            client.clone(),
            required_key(&providers.yelp.api_key, "providers.yelp.api_key")?,
        );
        if let Some(base_url) = providers.yelp.base_url.as_ref() {
            adapter = adapter.with_base_url(base_url.clone());
        }
        let provider: Arc<dyn BusinessProvider> = Arc::new(adapter);
        let rows: Arc<dyn RowStore<RestaurantRecord>> = repositories.clone();
        Some(RestaurantService::new(rows, provider, cache.clone()))
    } else {
        None
    };

    let movies = if providers.movies.enabled {
        let mut adapter = MovieClient::new(
            client.clone(),
            required_key(&providers.movies.api_key, "providers.movies.api_key")?,
        );
        if let Some(base_url) = providers.movies.base_url.as_ref() {
            adapter = adapter.with_base_url(base_url.clone());
        }
        let provider: Arc<dyn MovieProvider> = Arc::new(adapter);
        let rows: Arc<dyn RowStore<MovieRecord>> = repositories.clone();
        Some(MovieService::new(rows, provider, cache.clone()))
    } else {
        None
    };

    Ok(AppState {
        locations: LocationService::new(locations_repo, geocoder),
        weather: WeatherService::new(weather_rows, forecaster, cache),
        restaurants,
        movies,
        db: repositories,
    })
}

fn required_key(value: &Option<String>, key: &'static str) -> Result<String, AppError> {
    value.clone().ok_or_else(|| {
        AppError::from(InfraError::configuration(format!(
            "`{key}` is not configured"
        )))
    })
}
