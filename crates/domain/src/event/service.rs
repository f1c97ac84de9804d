//! Event service providing the command and query API for events.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, IdGenerator, RandomIdGenerator, SystemClock};

use crate::command::{Command, CommandHandler, CommandResult};
use crate::config::ServiceConfig;
use crate::error::DomainError;
use crate::repository::EventRepository;
use crate::user_directory::UserDirectory;

use super::{
    CancelEvent, CancelRegistration, ConfirmSchedule, CreateEvent, DeleteEvent, Event,
    EventDetails, EventFilter, EventId, EventStatus, EventSummary, FinishEvent, Money,
    PublishEvent, RegisterForEvent, Registration, SelectScheduleDate, StartSchedulePolling,
    SubmitPollResponse, UpdateEventDetails, UserId,
};

fn record_transition(to: EventStatus) {
    metrics::counter!("event_transitions_total", "to" => to.as_str()).increment(1);
}

/// Service for managing events.
///
/// Every command loads the event, applies one aggregate operation with the
/// current time from the clock, and saves it back through the command handler.
pub struct EventService<R: EventRepository, U: UserDirectory> {
    handler: CommandHandler<R>,
    users: U,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<R: EventRepository, U: UserDirectory> EventService<R, U> {
    /// Creates a service with random ids, the system clock and default settings.
    pub fn new(repository: R, users: U) -> Self {
        Self::with_parts(
            repository,
            users,
            Arc::new(RandomIdGenerator),
            Arc::new(SystemClock),
            &ServiceConfig::default(),
        )
    }

    pub fn with_parts(
        repository: R,
        users: U,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            handler: CommandHandler::with_config(repository, config),
            users,
            ids,
            clock,
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<R> {
        &self.handler
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a new draft event for an existing organizer.
    #[tracing::instrument(skip(self))]
    pub async fn create_event(&self, cmd: CreateEvent) -> Result<CommandResult, DomainError> {
        self.users.find_user(cmd.organizer_id).await?;

        let event = Event::create(
            self.ids.as_ref(),
            cmd.organizer_id,
            cmd.draft,
            cmd.candidate_dates,
            self.now(),
        )?;
        let result = self.handler.create(event).await?;

        metrics::counter!("events_created_total").increment(1);
        tracing::info!(event_id = %result.event.id(), "event created");
        Ok(result)
    }

    /// Replaces the details of a draft event.
    #[tracing::instrument(skip(self))]
    pub async fn update_event_details(
        &self,
        cmd: UpdateEventDetails,
    ) -> Result<CommandResult, DomainError> {
        let now = self.now();
        self.handler
            .execute(cmd.event_id(), |event| {
                event.update_details(cmd.draft.clone(), now)
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn start_schedule_polling(
        &self,
        cmd: StartSchedulePolling,
    ) -> Result<CommandResult, DomainError> {
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| event.start_schedule_polling(now))
            .await?;

        record_transition(EventStatus::SchedulePolling);
        tracing::info!(event_id = %cmd.event_id, "schedule polling started");
        Ok(result)
    }

    /// Records a user's availability on the poll.
    #[tracing::instrument(skip(self))]
    pub async fn submit_poll_response(
        &self,
        cmd: SubmitPollResponse,
    ) -> Result<CommandResult, DomainError> {
        let user = self.users.find_user(cmd.user_id).await?;
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| {
                event.submit_poll_response(&user, cmd.answers.clone(), now)
            })
            .await?;

        metrics::counter!("poll_responses_total").increment(1);
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn select_schedule_date(
        &self,
        cmd: SelectScheduleDate,
    ) -> Result<CommandResult, DomainError> {
        let now = self.now();
        self.handler
            .execute(cmd.event_id(), |event| {
                event.select_schedule_date(cmd.date, now)
            })
            .await
    }

    /// Fixes the date and confirms the event.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_schedule(
        &self,
        cmd: ConfirmSchedule,
    ) -> Result<CommandResult, DomainError> {
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| event.confirm_schedule(cmd.date, now))
            .await?;

        record_transition(EventStatus::Confirmed);
        tracing::info!(event_id = %cmd.event_id, date = %cmd.date, "schedule confirmed");
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn publish_event(&self, cmd: PublishEvent) -> Result<CommandResult, DomainError> {
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| event.publish(now))
            .await?;

        record_transition(EventStatus::Confirmed);
        tracing::info!(event_id = %cmd.event_id, "event published");
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_event(&self, cmd: CancelEvent) -> Result<CommandResult, DomainError> {
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| event.cancel(now))
            .await?;

        record_transition(EventStatus::Cancelled);
        tracing::info!(event_id = %cmd.event_id, reason = ?cmd.reason, "event cancelled");
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn finish_event(&self, cmd: FinishEvent) -> Result<CommandResult, DomainError> {
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| event.finish(now))
            .await?;

        record_transition(EventStatus::Finished);
        tracing::info!(event_id = %cmd.event_id, "event finished");
        Ok(result)
    }

    /// Registers a user. Returns the new registration.
    #[tracing::instrument(skip(self))]
    pub async fn register_for_event(
        &self,
        cmd: RegisterForEvent,
    ) -> Result<CommandResult<Registration>, DomainError> {
        let user = self.users.find_user(cmd.user_id).await?;
        let ids = self.ids.as_ref();
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| event.add_registration(&user, ids, now))
            .await?;

        metrics::counter!("event_registrations_total").increment(1);
        tracing::info!(
            event_id = %cmd.event_id,
            user_id = %cmd.user_id,
            fee = %result.output.applied_fee(),
            "user registered"
        );
        Ok(result)
    }

    /// Cancels a user's active registration. Returns the cancelled entry.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_registration(
        &self,
        cmd: CancelRegistration,
    ) -> Result<CommandResult<Registration>, DomainError> {
        let now = self.now();
        let result = self
            .handler
            .execute(cmd.event_id(), |event| {
                event.cancel_registration(cmd.user_id, now)
            })
            .await?;

        metrics::counter!("event_registration_cancellations_total").increment(1);
        tracing::info!(event_id = %cmd.event_id, user_id = %cmd.user_id, "registration cancelled");
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_event(&self, cmd: DeleteEvent) -> Result<(), DomainError> {
        self.handler.repository().delete(cmd.event_id()).await?;
        tracing::info!(event_id = %cmd.event_id, "event deleted");
        Ok(())
    }

    // Queries

    #[tracing::instrument(skip(self))]
    pub async fn get_event(&self, event_id: EventId) -> Result<Event, DomainError> {
        self.handler.load(event_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_event_details(&self, event_id: EventId) -> Result<EventDetails, DomainError> {
        let event = self.handler.load(event_id).await?;
        Ok(EventDetails::try_from(&event)?)
    }

    /// Lists events matching the filter, oldest write first.
    #[tracing::instrument(skip(self))]
    pub async fn list_events(&self, filter: EventFilter) -> Result<Vec<EventSummary>, DomainError> {
        let repository = self.handler.repository();
        let events = if let Some(status) = filter.status {
            repository.find_by_status(status).await?
        } else if let Some(organizer_id) = filter.organizer_id {
            repository.find_by_organizer(organizer_id).await?
        } else if let Some(participant_id) = filter.participant_id {
            repository.find_by_participant(participant_id).await?
        } else {
            repository.find_all().await?
        };

        Ok(events
            .iter()
            .filter(|event| filter.matches(event))
            .map(EventSummary::from)
            .collect())
    }

    /// The fee the user would pay if they registered now.
    #[tracing::instrument(skip(self))]
    pub async fn applicable_fee(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Money, DomainError> {
        let user = self.users.find_user(user_id).await?;
        let event = self.handler.load(event_id).await?;
        Ok(event.applicable_fee(&user))
    }

    #[tracing::instrument(skip(self))]
    pub async fn availability_summary(
        &self,
        event_id: EventId,
    ) -> Result<BTreeMap<DateTime<Utc>, usize>, DomainError> {
        let event = self.handler.load(event_id).await?;
        Ok(event.schedule_poll().availability_summary())
    }
}
