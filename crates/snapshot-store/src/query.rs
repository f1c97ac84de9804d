use crate::Snapshot;

/// Builder for constructing snapshot queries.
///
/// Field filters match top-level keys of the stored JSON state by exact
/// equality, so `field_equals("status", json!("DRAFT"))` selects every
/// aggregate whose `status` is `"DRAFT"`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotQuery {
    /// Filter by aggregate type.
    pub aggregate_type: Option<String>,

    /// Top-level state fields that must equal the given JSON values.
    pub field_equals: Vec<(String, serde_json::Value)>,

    /// Maximum number of snapshots to return.
    pub limit: Option<usize>,

    /// Number of snapshots to skip.
    pub offset: Option<usize>,
}

impl SnapshotQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for every snapshot of one aggregate type.
    pub fn for_type(aggregate_type: impl Into<String>) -> Self {
        Self {
            aggregate_type: Some(aggregate_type.into()),
            ..Default::default()
        }
    }

    /// Adds an equality filter on a top-level state field.
    pub fn field_equals(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.field_equals.push((field.into(), value));
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Evaluates every filter except paging against one snapshot.
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        if let Some(ref aggregate_type) = self.aggregate_type
            && &snapshot.aggregate_type != aggregate_type
        {
            return false;
        }
        self.field_equals
            .iter()
            .all(|(field, value)| snapshot.field(field) == Some(value))
    }
}
