use async_trait::async_trait;

use crate::application::repos::{LocationsRepo, RepoError};
use crate::domain::entities::LocationRecord;

use super::{PostgresRepositories, map_sqlx_error};

const LOCATION_COLUMNS: &str =
    "id, search_query, formatted_query, latitude, longitude, created_at";

#[async_trait]
impl LocationsRepo for PostgresRepositories {
    async fn find_by_search_query(
        &self,
        search_query: &str,
    ) -> Result<Option<LocationRecord>, RepoError> {
        sqlx::query_as::<_, LocationRecord>(
            "SELECT id, search_query, formatted_query, latitude, longitude, created_at \
             FROM locations WHERE search_query = $1",
        )
        .bind(search_query)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn insert_location(&self, record: &LocationRecord) -> Result<LocationRecord, RepoError> {
        // The no-op conflict update keeps RETURNING populated when the row
        // already exists, so the caller always receives the resolved id.
        let sql = format!(
            "INSERT INTO locations ({LOCATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (search_query) DO UPDATE SET search_query = EXCLUDED.search_query \
             RETURNING {LOCATION_COLUMNS}"
        );

        sqlx::query_as::<_, LocationRecord>(&sql)
            .bind(record.id)
            .bind(&record.search_query)
            .bind(&record.formatted_query)
            .bind(record.latitude)
            .bind(record.longitude)
            .bind(record.created_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
