//! Core aggregate trait.

use common::AggregateId;
use serde::{Serialize, de::DeserializeOwned};
use snapshot_store::Version;

/// Trait for aggregates persisted as whole-state snapshots.
///
/// An aggregate is a cluster of domain objects that can be treated as a single unit.
/// The aggregate root ensures consistency of changes being made within the aggregate.
///
/// The version is not part of the serialized state; the store tracks it and the
/// repository sets it after every load and save.
pub trait Aggregate: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the aggregate type name.
    ///
    /// Used as the snapshot store partition.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's storage key.
    fn aggregate_id(&self) -> AggregateId;

    /// Returns the version the aggregate was loaded at.
    ///
    /// Version 0 means the aggregate has never been saved.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    fn set_version(&mut self, version: Version);
}
