//! Persistence gateway traits implemented by the Postgres adapter.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::cache::Cacheable;
use crate::domain::entities::LocationRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait LocationsRepo: Send + Sync {
    async fn find_by_search_query(
        &self,
        search_query: &str,
    ) -> Result<Option<LocationRecord>, RepoError>;

    /// Insert is idempotent by `search_query`: a conflicting insert resolves
    /// to the already stored row, and the returned record always carries the
    /// id the store settled on.
    async fn insert_location(&self, record: &LocationRecord) -> Result<LocationRecord, RepoError>;
}

/// Keyed row access for one cached table. Rows come back in storage order;
/// an empty table and an unpopulated key are indistinguishable.
#[async_trait]
pub trait RowStore<T: Cacheable>: Send + Sync {
    async fn select_rows(&self, location_id: Uuid) -> Result<Vec<T>, RepoError>;

    async fn insert_row(&self, row: &T) -> Result<(), RepoError>;

    /// Unconditional bulk delete of every row for the key. The count is
    /// informational; callers do not branch on it.
    async fn delete_rows(&self, location_id: Uuid) -> Result<u64, RepoError>;
}
