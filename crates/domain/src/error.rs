//! Domain error types.

use snapshot_store::SnapshotStoreError;
use thiserror::Error;

use crate::event::{EventError, EventId, UserId};

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the snapshot store.
    #[error("Snapshot store error: {0}")]
    SnapshotStore(#[from] SnapshotStoreError),

    /// An event rule was violated.
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// No event with this id is stored.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The user directory has no such user.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::SnapshotStore(e) if e.is_conflict())
    }

    /// Returns the event error, if this is one.
    pub fn as_event_error(&self) -> Option<&EventError> {
        match self {
            DomainError::Event(e) => Some(e),
            _ => None,
        }
    }
}
