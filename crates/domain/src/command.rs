//! Command handling infrastructure.

use snapshot_store::Version;

use crate::aggregate::Aggregate;
use crate::config::ServiceConfig;
use crate::error::DomainError;
use crate::event::{Event, EventError, EventId};
use crate::repository::EventRepository;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<T = ()> {
    /// The event after the command, as stored.
    pub event: Event,

    /// Whatever the command produced besides the new state.
    pub output: T,

    /// The new version of the event after the command.
    pub new_version: Version,
}

/// Trait for commands that target an existing event.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the event's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// Returns the ID of the event this command targets.
    fn event_id(&self) -> EventId;
}

/// Handler for executing commands against events.
///
/// The handler is responsible for:
/// 1. Loading the event from the repository
/// 2. Running the command against it
/// 3. Saving the event with an optimistic version check
/// 4. Re-running the whole cycle when another writer got there first
pub struct CommandHandler<R: EventRepository> {
    repository: R,
    max_attempts: u32,
}

impl<R: EventRepository> CommandHandler<R> {
    /// Creates a new command handler with default settings.
    pub fn new(repository: R) -> Self {
        Self::with_config(repository, &ServiceConfig::default())
    }

    pub fn with_config(repository: R, config: &ServiceConfig) -> Self {
        Self {
            repository,
            max_attempts: config.max_command_attempts.max(1),
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Loads an event; missing events are an error.
    pub async fn load(&self, event_id: EventId) -> Result<Event, DomainError> {
        self.repository.find_by_id(event_id).await
    }

    /// Stores a freshly created event.
    ///
    /// Not retried: a conflict here means the id is already taken.
    pub async fn create(&self, mut event: Event) -> Result<CommandResult, DomainError> {
        let new_version = self.repository.save(&event).await?;
        event.set_version(new_version);
        Ok(CommandResult {
            event,
            output: (),
            new_version,
        })
    }

    /// Executes a command and persists the result.
    ///
    /// The command function receives the current state and mutates it in
    /// place, or rejects it. On a concurrency conflict the event is reloaded
    /// and the function runs again, so it must not depend on earlier attempts.
    /// Domain errors are returned immediately.
    pub async fn execute<T, F>(
        &self,
        event_id: EventId,
        mut command_fn: F,
    ) -> Result<CommandResult<T>, DomainError>
    where
        F: FnMut(&mut Event) -> Result<T, EventError> + Send,
        T: Send,
    {
        let mut attempt = 1;
        loop {
            let mut event = self.load(event_id).await?;
            let output = command_fn(&mut event)?;

            match self.repository.save(&event).await {
                Ok(new_version) => {
                    event.set_version(new_version);
                    return Ok(CommandResult {
                        event,
                        output,
                        new_version,
                    });
                }
                Err(e) if e.is_conflict() => {
                    metrics::counter!("command_conflicts_total").increment(1);
                    if attempt >= self.max_attempts {
                        metrics::counter!("command_retries_exhausted_total").increment(1);
                        tracing::warn!(%event_id, attempt, "giving up after concurrency conflicts");
                        return Err(e);
                    }
                    tracing::warn!(%event_id, attempt, "concurrency conflict, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
