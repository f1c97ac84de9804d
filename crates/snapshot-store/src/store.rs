use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{AggregateId, Result, Snapshot, SnapshotQuery, SnapshotStoreError, Version};

/// Options for saving a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Version the caller believes is currently stored.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stored aggregate to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the aggregate to not be stored yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Core trait for snapshot store implementations.
///
/// A snapshot store keeps exactly one current snapshot per
/// `(aggregate_type, aggregate_id)`. All implementations must be thread-safe.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Stores a snapshot, replacing the previous one.
    ///
    /// The write is atomic. If `options.expected_version` is set and does not
    /// match the stored version (0 when absent) the call fails with
    /// `ConcurrencyConflict` and nothing is written.
    ///
    /// Returns the version now stored.
    async fn save(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version>;

    /// Retrieves the current snapshot of an aggregate.
    async fn load(&self, aggregate_type: &str, aggregate_id: AggregateId)
    -> Result<Option<Snapshot>>;

    /// Retrieves snapshots matching a query, oldest write first.
    async fn query(&self, query: SnapshotQuery) -> Result<Vec<Snapshot>>;

    /// Gets the stored version of an aggregate, if any.
    async fn version_of(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Option<Version>>;

    /// Removes an aggregate. Returns false if nothing was stored.
    async fn delete(&self, aggregate_type: &str, aggregate_id: AggregateId) -> Result<bool>;
}

/// Extension trait providing convenience methods for snapshot stores.
#[async_trait]
pub trait SnapshotStoreExt: SnapshotStore {
    /// Checks if an aggregate is stored.
    async fn exists(&self, aggregate_type: &str, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.version_of(aggregate_type, aggregate_id).await?.is_some())
    }

    /// Loads and deserializes an aggregate together with its stored version.
    async fn load_state<T>(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Option<(T, Version)>>
    where
        T: DeserializeOwned + Send,
    {
        match self.load(aggregate_type, aggregate_id).await? {
            Some(snapshot) => {
                let version = snapshot.version;
                Ok(Some((snapshot.into_state()?, version)))
            }
            None => Ok(None),
        }
    }
}

// Blanket implementation for all SnapshotStore implementations
impl<T: SnapshotStore + ?Sized> SnapshotStoreExt for T {}

/// Validates a snapshot before saving.
///
/// When a version check is requested the snapshot must carry exactly the
/// version that follows the expected one.
pub fn validate_snapshot_for_save(snapshot: &Snapshot, options: &SaveOptions) -> Result<()> {
    if snapshot.aggregate_type.is_empty() {
        return Err(SnapshotStoreError::InvalidSnapshot(
            "aggregate type cannot be empty".to_string(),
        ));
    }

    if !snapshot.state.is_object() {
        return Err(SnapshotStoreError::InvalidSnapshot(
            "state must be a JSON object".to_string(),
        ));
    }

    if let Some(expected) = options.expected_version
        && snapshot.version != expected.next()
    {
        return Err(SnapshotStoreError::InvalidSnapshot(format!(
            "snapshot version must follow the expected version. Expected {}, got {}",
            expected.next(),
            snapshot.version
        )));
    }

    if snapshot.version <= Version::initial() {
        return Err(SnapshotStoreError::InvalidSnapshot(format!(
            "snapshot version must be positive, got {}",
            snapshot.version
        )));
    }

    Ok(())
}
