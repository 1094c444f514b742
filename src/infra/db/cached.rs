//! Row stores for the cached provider tables.
//!
//! Table and column names are compile-time constants pushed through a
//! `QueryBuilder`; everything row-valued is bound as a parameter.

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgRow},
};
use uuid::Uuid;

use crate::application::cache::Cacheable;
use crate::application::repos::{RepoError, RowStore};
use crate::domain::entities::{MovieRecord, RestaurantRecord, WeatherRecord};

use super::{PostgresRepositories, map_sqlx_error};

async fn select_by_location<T>(
    pool: &PgPool,
    table: &'static str,
    columns: &'static str,
    location_id: Uuid,
) -> Result<Vec<T>, RepoError>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
    qb.push(columns);
    qb.push(" FROM ");
    qb.push(table);
    qb.push(" WHERE location_id = ");
    qb.push_bind(location_id);

    qb.build_query_as::<T>()
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)
}

async fn delete_by_location(
    pool: &PgPool,
    table: &'static str,
    location_id: Uuid,
) -> Result<u64, RepoError> {
    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("DELETE FROM ");
    qb.push(table);
    qb.push(" WHERE location_id = ");
    qb.push_bind(location_id);

    qb.build()
        .execute(pool)
        .await
        .map(|done| done.rows_affected())
        .map_err(map_sqlx_error)
}

#[async_trait]
impl RowStore<WeatherRecord> for PostgresRepositories {
    async fn select_rows(&self, location_id: Uuid) -> Result<Vec<WeatherRecord>, RepoError> {
        select_by_location(
            self.pool(),
            WeatherRecord::TABLE,
            "id, location_id, forecast, forecast_time, created_at",
            location_id,
        )
        .await
    }

    async fn insert_row(&self, row: &WeatherRecord) -> Result<(), RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO weathers (id, location_id, forecast, forecast_time, created_at) ",
        );
        qb.push_values(std::iter::once(row), |mut b, row| {
            b.push_bind(row.id)
                .push_bind(row.location_id)
                .push_bind(&row.forecast)
                .push_bind(&row.forecast_time)
                .push_bind(row.created_at);
        });

        qb.build()
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn delete_rows(&self, location_id: Uuid) -> Result<u64, RepoError> {
        delete_by_location(self.pool(), WeatherRecord::TABLE, location_id).await
    }
}

#[async_trait]
impl RowStore<RestaurantRecord> for PostgresRepositories {
    async fn select_rows(&self, location_id: Uuid) -> Result<Vec<RestaurantRecord>, RepoError> {
        select_by_location(
            self.pool(),
            RestaurantRecord::TABLE,
            "id, location_id, name, image_url, price, rating, url, created_at",
            location_id,
        )
        .await
    }

    async fn insert_row(&self, row: &RestaurantRecord) -> Result<(), RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO restaurants \
             (id, location_id, name, image_url, price, rating, url, created_at) ",
        );
        qb.push_values(std::iter::once(row), |mut b, row| {
            b.push_bind(row.id)
                .push_bind(row.location_id)
                .push_bind(&row.name)
                .push_bind(&row.image_url)
                .push_bind(&row.price)
                .push_bind(row.rating)
                .push_bind(&row.url)
                .push_bind(row.created_at);
        });

        qb.build()
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn delete_rows(&self, location_id: Uuid) -> Result<u64, RepoError> {
        delete_by_location(self.pool(), RestaurantRecord::TABLE, location_id).await
    }
}

#[async_trait]
impl RowStore<MovieRecord> for PostgresRepositories {
    async fn select_rows(&self, location_id: Uuid) -> Result<Vec<MovieRecord>, RepoError> {
        select_by_location(
            self.pool(),
            MovieRecord::TABLE,
            "id, location_id, title, overview, average_votes, total_votes, image_url, \
             popularity, released_on, created_at",
            location_id,
        )
        .await
    }

    async fn insert_row(&self, row: &MovieRecord) -> Result<(), RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO movies \
             (id, location_id, title, overview, average_votes, total_votes, image_url, \
              popularity, released_on, created_at) ",
        );
        qb.push_values(std::iter::once(row), |mut b, row| {
            b.push_bind(row.id)
                .push_bind(row.location_id)
                .push_bind(&row.title)
                .push_bind(&row.overview)
                .push_bind(row.average_votes)
                .push_bind(row.total_votes)
                .push_bind(&row.image_url)
                .push_bind(row.popularity)
                .push_bind(&row.released_on)
                .push_bind(row.created_at);
        });

        qb.build()
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn delete_rows(&self, location_id: Uuid) -> Result<u64, RepoError> {
        delete_by_location(self.pool(), MovieRecord::TABLE, location_id).await
    }
}
