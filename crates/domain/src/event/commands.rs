//! Event commands.

use chrono::{DateTime, Utc};

use crate::command::Command;

use super::{DateAvailability, EventDraft, EventId, UserId};

/// Command to create a new event in draft status.
///
/// The event id is drawn by the service's id generator.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    /// The user organizing the event. Must exist in the user directory.
    pub organizer_id: UserId,

    /// Title, roles, fees and the like.
    pub draft: EventDraft,

    /// Dates offered in the schedule poll.
    pub candidate_dates: Vec<DateTime<Utc>>,
}

impl CreateEvent {
    pub fn new(
        organizer_id: UserId,
        draft: EventDraft,
        candidate_dates: impl IntoIterator<Item = DateTime<Utc>>,
    ) -> Self {
        Self {
            organizer_id,
            draft,
            candidate_dates: candidate_dates.into_iter().collect(),
        }
    }
}

/// Command to replace the editable details of a draft.
#[derive(Debug, Clone)]
pub struct UpdateEventDetails {
    pub event_id: EventId,
    pub draft: EventDraft,
}

impl UpdateEventDetails {
    pub fn new(event_id: EventId, draft: EventDraft) -> Self {
        Self { event_id, draft }
    }
}

impl Command for UpdateEventDetails {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to open the schedule poll.
#[derive(Debug, Clone)]
pub struct StartSchedulePolling {
    pub event_id: EventId,
}

impl StartSchedulePolling {
    pub fn new(event_id: EventId) -> Self {
        Self { event_id }
    }
}

impl Command for StartSchedulePolling {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to answer the schedule poll on behalf of a user.
#[derive(Debug, Clone)]
pub struct SubmitPollResponse {
    pub event_id: EventId,
    pub user_id: UserId,
    pub answers: Vec<DateAvailability>,
}

impl SubmitPollResponse {
    pub fn new(event_id: EventId, user_id: UserId, answers: Vec<DateAvailability>) -> Self {
        Self {
            event_id,
            user_id,
            answers,
        }
    }
}

impl Command for SubmitPollResponse {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to choose the final date while polling continues.
#[derive(Debug, Clone)]
pub struct SelectScheduleDate {
    pub event_id: EventId,
    pub date: DateTime<Utc>,
}

impl SelectScheduleDate {
    pub fn new(event_id: EventId, date: DateTime<Utc>) -> Self {
        Self { event_id, date }
    }
}

impl Command for SelectScheduleDate {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to fix the date and confirm the event in one step.
#[derive(Debug, Clone)]
pub struct ConfirmSchedule {
    pub event_id: EventId,
    pub date: DateTime<Utc>,
}

impl ConfirmSchedule {
    pub fn new(event_id: EventId, date: DateTime<Utc>) -> Self {
        Self { event_id, date }
    }
}

impl Command for ConfirmSchedule {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to confirm the event with the already selected date.
#[derive(Debug, Clone)]
pub struct PublishEvent {
    pub event_id: EventId,
}

impl PublishEvent {
    pub fn new(event_id: EventId) -> Self {
        Self { event_id }
    }
}

impl Command for PublishEvent {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to call off an event.
#[derive(Debug, Clone)]
pub struct CancelEvent {
    pub event_id: EventId,

    /// Optional reason, logged only.
    pub reason: Option<String>,
}

impl CancelEvent {
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            reason: None,
        }
    }

    pub fn with_reason(event_id: EventId, reason: impl Into<String>) -> Self {
        Self {
            event_id,
            reason: Some(reason.into()),
        }
    }
}

impl Command for CancelEvent {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to mark a confirmed event as finished.
#[derive(Debug, Clone)]
pub struct FinishEvent {
    pub event_id: EventId,
}

impl FinishEvent {
    pub fn new(event_id: EventId) -> Self {
        Self { event_id }
    }
}

impl Command for FinishEvent {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to register a user for an event.
#[derive(Debug, Clone)]
pub struct RegisterForEvent {
    pub event_id: EventId,
    pub user_id: UserId,
}

impl RegisterForEvent {
    pub fn new(event_id: EventId, user_id: UserId) -> Self {
        Self { event_id, user_id }
    }
}

impl Command for RegisterForEvent {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to cancel a user's active registration.
#[derive(Debug, Clone)]
pub struct CancelRegistration {
    pub event_id: EventId,
    pub user_id: UserId,
}

impl CancelRegistration {
    pub fn new(event_id: EventId, user_id: UserId) -> Self {
        Self { event_id, user_id }
    }
}

impl Command for CancelRegistration {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Command to remove an event from the repository.
#[derive(Debug, Clone)]
pub struct DeleteEvent {
    pub event_id: EventId,
}

impl DeleteEvent {
    pub fn new(event_id: EventId) -> Self {
        Self { event_id }
    }
}

impl Command for DeleteEvent {
    fn event_id(&self) -> EventId {
        self.event_id
    }
}
