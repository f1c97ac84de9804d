use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur when interacting with the snapshot store.
#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    /// The stored version did not match the version the caller loaded.
    #[error(
        "Concurrency conflict for {aggregate_type} {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: String,
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The snapshot handed to `save` is malformed.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The query cannot be expressed against the snapshot table.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Postgres was requested but no connection string is configured.
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SnapshotStoreError {
    /// Returns true for a lost optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SnapshotStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, SnapshotStoreError>;
