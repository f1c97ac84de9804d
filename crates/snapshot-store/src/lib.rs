//! Versioned snapshot storage for aggregates.
//!
//! Every aggregate is persisted as a single JSON document plus a version
//! number. Saves are compare-and-swap on that version, which is what keeps two
//! racing read-modify-write cycles on the same aggregate from both landing.

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod version;

pub use common::AggregateId;
pub use config::StoreConfig;
pub use error::{Result, SnapshotStoreError};
pub use memory::InMemorySnapshotStore;
pub use postgres::PostgresSnapshotStore;
pub use query::SnapshotQuery;
pub use snapshot::Snapshot;
pub use store::{SaveOptions, SnapshotStore, SnapshotStoreExt};
pub use version::Version;
