use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AggregateId, Version};

/// The complete persisted state of one aggregate at one version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The aggregate this snapshot belongs to.
    pub aggregate_id: AggregateId,

    /// The type of aggregate (e.g., "Event").
    pub aggregate_type: String,

    /// The version this snapshot will hold once stored.
    pub version: Version,

    /// When the snapshot was written.
    pub timestamp: DateTime<Utc>,

    /// The serialized aggregate state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a new snapshot.
    pub fn new(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        version: Version,
        state: serde_json::Value,
    ) -> Self {
        Self {
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            version,
            timestamp: Utc::now(),
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        version: Version,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            aggregate_id,
            aggregate_type,
            version,
            serde_json::to_value(state)?,
        ))
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }

    /// Looks up a top-level field of the state.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.state.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Counter {
        status: String,
        value: i32,
    }

    #[test]
    fn state_survives_snapshotting() {
        let state = Counter {
            status: "OPEN".to_string(),
            value: 42,
        };
        let snapshot = Snapshot::from_state(
            AggregateId::from_uuid(Uuid::from_u128(1)),
            "Counter",
            Version::first(),
            &state,
        )
        .unwrap();

        assert_eq!(snapshot.aggregate_type, "Counter");
        assert_eq!(snapshot.field("status"), Some(&serde_json::json!("OPEN")));
        assert_eq!(snapshot.field("missing"), None);

        let restored: Counter = snapshot.into_state().unwrap();
        assert_eq!(restored, state);
    }
}
