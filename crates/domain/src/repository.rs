//! Event repository port and its snapshot-backed implementation.

use async_trait::async_trait;
use snapshot_store::{SaveOptions, Snapshot, SnapshotQuery, SnapshotStore, SnapshotStoreExt, Version};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::event::{Event, EventId, EventStatus, UserId};

/// Persistence port for event aggregates.
///
/// `save` must be atomic for the whole aggregate and must reject a write when
/// the stored version differs from the version the event was loaded at.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Stores the full aggregate and returns the version now stored.
    ///
    /// Fails with a concurrency conflict if someone else saved in between.
    async fn save(&self, event: &Event) -> Result<Version, DomainError>;

    /// Loads an event, with its version set.
    async fn find_by_id(&self, id: EventId) -> Result<Event, DomainError>;

    async fn find_all(&self) -> Result<Vec<Event>, DomainError>;

    async fn find_by_status(&self, status: EventStatus) -> Result<Vec<Event>, DomainError>;

    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, DomainError>;

    /// Events where the user holds an active registration.
    async fn find_by_participant(&self, user_id: UserId) -> Result<Vec<Event>, DomainError>;

    /// Removes an event.
    async fn delete(&self, id: EventId) -> Result<(), DomainError>;
}

/// [`EventRepository`] that keeps each event as one JSON snapshot.
#[derive(Clone)]
pub struct SnapshotEventRepository<S: SnapshotStore> {
    store: S,
}

impl<S: SnapshotStore> SnapshotEventRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying snapshot store.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn query_events(&self, query: SnapshotQuery) -> Result<Vec<Event>, DomainError> {
        self.store
            .query(query)
            .await?
            .into_iter()
            .map(restore_event)
            .collect()
    }
}

fn restore_event(snapshot: Snapshot) -> Result<Event, DomainError> {
    let version = snapshot.version;
    let mut event: Event = snapshot.into_state()?;
    event.set_version(version);
    Ok(event)
}

#[async_trait]
impl<S: SnapshotStore> EventRepository for SnapshotEventRepository<S> {
    #[tracing::instrument(skip(self, event), fields(event_id = %event.id(), version = %event.version()))]
    async fn save(&self, event: &Event) -> Result<Version, DomainError> {
        let current = event.version();
        let options = if current.is_initial() {
            SaveOptions::expect_new()
        } else {
            SaveOptions::expect_version(current)
        };

        let snapshot = Snapshot::from_state(
            event.aggregate_id(),
            Event::aggregate_type(),
            current.next(),
            event,
        )?;

        let version = self.store.save(snapshot, options).await?;
        tracing::debug!(%version, "event saved");
        Ok(version)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: EventId) -> Result<Event, DomainError> {
        let (mut event, version) = self
            .store
            .load_state::<Event>(Event::aggregate_type(), id.into())
            .await?
            .ok_or(DomainError::EventNotFound(id))?;
        event.set_version(version);
        Ok(event)
    }

    async fn find_all(&self) -> Result<Vec<Event>, DomainError> {
        self.query_events(SnapshotQuery::for_type(Event::aggregate_type()))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_status(&self, status: EventStatus) -> Result<Vec<Event>, DomainError> {
        let query = SnapshotQuery::for_type(Event::aggregate_type())
            .field_equals("status", serde_json::to_value(status)?);
        self.query_events(query).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, DomainError> {
        let query = SnapshotQuery::for_type(Event::aggregate_type())
            .field_equals("organizer_id", serde_json::to_value(organizer_id)?);
        self.query_events(query).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_participant(&self, user_id: UserId) -> Result<Vec<Event>, DomainError> {
        // Registrations are nested; filter after loading.
        let events = self.find_all().await?;
        Ok(events
            .into_iter()
            .filter(|event| event.is_participant(user_id))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: EventId) -> Result<(), DomainError> {
        if self.store.delete(Event::aggregate_type(), id.into()).await? {
            Ok(())
        } else {
            Err(DomainError::EventNotFound(id))
        }
    }
}
