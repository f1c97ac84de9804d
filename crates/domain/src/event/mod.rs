//! Event aggregate and related types.

mod aggregate;
mod commands;
mod fee_setting;
mod queries;
mod registration;
mod schedule_poll;
mod service;
mod state;
mod user;
mod value_objects;

pub use aggregate::{Event, EventDraft};
pub use commands::*;
pub use fee_setting::{FeeSetting, resolve_fee};
pub use queries::{DateCount, EventDetails, EventFilter, EventSummary, PollView};
pub use registration::Registration;
pub use schedule_poll::{DATE_POLL, DateAvailability, PollResponse, SchedulePoll};
pub use service::EventService;
pub use state::{EventStatus, RegistrationStatus};
pub use user::User;
pub use value_objects::{EventId, Generation, JPY, Money, PollId, RegistrationId, Role, Tag, UserId};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during event operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Malformed input such as an empty title or a negative amount.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The event is not in a status that allows the action.
    #[error("Invalid transition: cannot {action} from {current_status} status")]
    InvalidTransition {
        current_status: EventStatus,
        action: &'static str,
    },

    /// The registration is not in a status that allows the action.
    #[error("Invalid registration transition: cannot {action} from {current_status} status")]
    InvalidRegistrationTransition {
        current_status: RegistrationStatus,
        action: &'static str,
    },

    /// Publishing needs a finalized schedule date.
    #[error("Schedule has not been finalized")]
    ScheduleNotFinalized,

    /// The schedule date is not strictly in the future.
    #[error("Schedule date {date} is not in the future")]
    PastScheduleDate { date: DateTime<Utc> },

    /// The user holds none of the event's allowed roles.
    #[error("User {user_id} has no role allowed for this event")]
    IneligibleRole { user_id: UserId },

    /// The user already has an active registration.
    #[error("User {user_id} is already registered")]
    AlreadyRegistered { user_id: UserId },

    /// The user has no active registration to cancel.
    #[error("No active registration for user {user_id}")]
    RegistrationNotFound { user_id: UserId },

    /// The date is not one of the poll's candidate dates.
    #[error("Date {date} is not a candidate date")]
    DateNotCandidate { date: DateTime<Utc> },

    /// The user already answered the schedule poll.
    #[error("User {user_id} has already responded to the poll")]
    DuplicateResponse { user_id: UserId },

    /// Money arithmetic across different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// Subtraction would produce a negative amount.
    #[error("Amount cannot go negative: {minuend} - {subtrahend}")]
    NegativeAmount { minuend: i64, subtrahend: i64 },
}

impl EventError {
    /// Shorthand for a [`EventError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        EventError::Validation(message.into())
    }
}
