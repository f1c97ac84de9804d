//! A user's participation in an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventError, EventId, Money, RegistrationId, RegistrationStatus, UserId};

/// Links one user to one event, with the fee fixed at registration time.
///
/// Owned by its [`Event`](super::Event); only the user id is kept, never the
/// user itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    id: RegistrationId,
    event_id: EventId,
    user_id: UserId,
    status: RegistrationStatus,
    applied_fee: Money,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Registration {
    pub(super) fn new(
        id: RegistrationId,
        event_id: EventId,
        user_id: UserId,
        applied_fee: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_id,
            user_id,
            status: RegistrationStatus::Registered,
            applied_fee,
            registered_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn applied_fee(&self) -> &Money {
        &self.applied_fee
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }

    /// Cancels the registration. Only a registered entry can be cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), EventError> {
        if !self.status.can_transition_to(RegistrationStatus::Cancelled) {
            return Err(EventError::InvalidRegistrationTransition {
                current_status: self.status,
                action: "cancel registration",
            });
        }

        self.status = RegistrationStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }
}

impl std::fmt::Display for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Registration {} (user {}, {}, {})",
            self.id,
            self.user_id,
            self.status,
            self.applied_fee.format_jpy()
        )
    }
}
