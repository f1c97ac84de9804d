use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, Result, Snapshot, SnapshotQuery, SnapshotStoreError, Version,
    store::{SaveOptions, SnapshotStore, validate_snapshot_for_save},
};

type SnapshotKey = (String, AggregateId);

/// In-memory snapshot store.
///
/// One lock guards the whole map, so the version check and the write in
/// `save` happen as a single step.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    snapshots: Arc<RwLock<HashMap<SnapshotKey, Snapshot>>>,
}

impl InMemorySnapshotStore {
    /// Creates a new empty in-memory snapshot store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored aggregates.
    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.len()
    }

    /// Clears all snapshots.
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        validate_snapshot_for_save(&snapshot, &options)?;

        let key = (snapshot.aggregate_type.clone(), snapshot.aggregate_id);
        let mut store = self.snapshots.write().await;

        let current_version = store
            .get(&key)
            .map(|s| s.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            tracing::warn!(
                aggregate_type = %snapshot.aggregate_type,
                aggregate_id = %snapshot.aggregate_id,
                %expected,
                actual = %current_version,
                "snapshot save rejected"
            );
            metrics::counter!("snapshot_conflicts_total").increment(1);
            return Err(SnapshotStoreError::ConcurrencyConflict {
                aggregate_type: snapshot.aggregate_type,
                aggregate_id: snapshot.aggregate_id,
                expected,
                actual: current_version,
            });
        }

        let version = snapshot.version;
        store.insert(key, snapshot);
        Ok(version)
    }

    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Option<Snapshot>> {
        let store = self.snapshots.read().await;
        Ok(store
            .get(&(aggregate_type.to_string(), aggregate_id))
            .cloned())
    }

    async fn query(&self, query: SnapshotQuery) -> Result<Vec<Snapshot>> {
        let store = self.snapshots.read().await;
        let mut snapshots: Vec<_> = store
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();

        // Sort by write time then id
        snapshots.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.aggregate_id.cmp(&b.aggregate_id))
        });

        let offset = query.offset.unwrap_or(0);
        let snapshots = snapshots.into_iter().skip(offset);

        let snapshots = if let Some(limit) = query.limit {
            snapshots.take(limit).collect()
        } else {
            snapshots.collect()
        };

        Ok(snapshots)
    }

    async fn version_of(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Option<Version>> {
        let store = self.snapshots.read().await;
        Ok(store
            .get(&(aggregate_type.to_string(), aggregate_id))
            .map(|s| s.version))
    }

    async fn delete(&self, aggregate_type: &str, aggregate_id: AggregateId) -> Result<bool> {
        let mut store = self.snapshots.write().await;
        Ok(store
            .remove(&(aggregate_type.to_string(), aggregate_id))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapshotStoreExt;
    use serde_json::json;
    use uuid::Uuid;

    fn snapshot(aggregate_id: AggregateId, version: i64, status: &str) -> Snapshot {
        Snapshot::new(
            aggregate_id,
            "Event",
            Version::new(version),
            json!({ "status": status }),
        )
    }

    #[tokio::test]
    async fn save_new_and_load() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::from_uuid(Uuid::new_v4());

        let version = store
            .save(snapshot(id, 1, "DRAFT"), SaveOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let loaded = store.load("Event", id).await.unwrap().unwrap();
        assert_eq!(loaded.version, Version::first());
        assert_eq!(loaded.field("status"), Some(&json!("DRAFT")));
        assert_eq!(store.snapshot_count().await, 1);
    }

    #[tokio::test]
    async fn save_replaces_with_matching_version() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::from_uuid(Uuid::new_v4());

        store
            .save(snapshot(id, 1, "DRAFT"), SaveOptions::expect_new())
            .await
            .unwrap();
        let version = store
            .save(
                snapshot(id, 2, "SCHEDULE_POLLING"),
                SaveOptions::expect_version(Version::first()),
            )
            .await
            .unwrap();

        assert_eq!(version, Version::new(2));
        assert_eq!(
            store.version_of("Event", id).await.unwrap(),
            Some(Version::new(2))
        );
        assert_eq!(store.snapshot_count().await, 1);
    }

    #[tokio::test]
    async fn stale_save_is_a_conflict() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::from_uuid(Uuid::new_v4());

        store
            .save(snapshot(id, 1, "DRAFT"), SaveOptions::expect_new())
            .await
            .unwrap();
        store
            .save(
                snapshot(id, 2, "CANCELLED"),
                SaveOptions::expect_version(Version::first()),
            )
            .await
            .unwrap();

        let result = store
            .save(
                snapshot(id, 2, "SCHEDULE_POLLING"),
                SaveOptions::expect_version(Version::first()),
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.is_conflict());

        let loaded = store.load("Event", id).await.unwrap().unwrap();
        assert_eq!(loaded.field("status"), Some(&json!("CANCELLED")));
    }

    #[tokio::test]
    async fn creating_twice_is_a_conflict() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::from_uuid(Uuid::new_v4());

        store
            .save(snapshot(id, 1, "DRAFT"), SaveOptions::expect_new())
            .await
            .unwrap();
        let result = store
            .save(snapshot(id, 1, "DRAFT"), SaveOptions::expect_new())
            .await;

        assert!(matches!(
            result,
            Err(SnapshotStoreError::ConcurrencyConflict { actual, .. }) if actual == Version::first()
        ));
    }

    #[tokio::test]
    async fn query_filters_by_field() {
        let store = InMemorySnapshotStore::new();
        for status in ["DRAFT", "DRAFT", "CONFIRMED"] {
            store
                .save(
                    snapshot(AggregateId::from_uuid(Uuid::new_v4()), 1, status),
                    SaveOptions::expect_new(),
                )
                .await
                .unwrap();
        }

        let drafts = store
            .query(SnapshotQuery::for_type("Event").field_equals("status", json!("DRAFT")))
            .await
            .unwrap();
        assert_eq!(drafts.len(), 2);

        let limited = store
            .query(SnapshotQuery::for_type("Event").limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let others = store.query(SnapshotQuery::for_type("Other")).await.unwrap();
        assert!(others.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_snapshot() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::from_uuid(Uuid::new_v4());

        store
            .save(snapshot(id, 1, "DRAFT"), SaveOptions::expect_new())
            .await
            .unwrap();

        assert!(store.exists("Event", id).await.unwrap());
        assert!(store.delete("Event", id).await.unwrap());
        assert!(!store.exists("Event", id).await.unwrap());
        assert!(!store.delete("Event", id).await.unwrap());
    }

    #[tokio::test]
    async fn load_state_returns_version() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::from_uuid(Uuid::new_v4());

        store
            .save(snapshot(id, 1, "DRAFT"), SaveOptions::expect_new())
            .await
            .unwrap();

        let (state, version): (serde_json::Value, Version) =
            store.load_state("Event", id).await.unwrap().unwrap();
        assert_eq!(state["status"], "DRAFT");
        assert_eq!(version, Version::first());

        let missing: Option<(serde_json::Value, Version)> = store
            .load_state("Event", AggregateId::from_uuid(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
