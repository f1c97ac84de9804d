//! Domain layer for campus circle events.
//!
//! This crate provides:
//! - The Event aggregate with its lifecycle, schedule poll, fee rules and registrations
//! - Repository and user directory ports, with a snapshot-backed repository
//! - CommandHandler for load, mutate, save with conflict retry
//! - EventService exposing the command and query surface

pub mod aggregate;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod repository;
pub mod user_directory;

pub use aggregate::Aggregate;
pub use command::{Command, CommandHandler, CommandResult};
pub use config::ServiceConfig;
pub use error::DomainError;
pub use event::{
    CancelEvent, CancelRegistration, ConfirmSchedule, CreateEvent, DateAvailability, DeleteEvent,
    Event, EventDetails, EventDraft, EventError, EventFilter, EventId, EventService, EventStatus,
    EventSummary, FeeSetting, FinishEvent, Generation, Money, PublishEvent, RegisterForEvent,
    Registration, RegistrationStatus, Role, SchedulePoll, SelectScheduleDate,
    StartSchedulePolling, SubmitPollResponse, Tag, UpdateEventDetails, User, UserId,
};
pub use repository::{EventRepository, SnapshotEventRepository};
pub use user_directory::{InMemoryUserDirectory, UserDirectory};
