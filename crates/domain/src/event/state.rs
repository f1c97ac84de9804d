//! Event and registration state machines.

use serde::{Deserialize, Serialize};

use super::EventError;

/// The status of an event in its lifecycle.
///
/// State transitions:
/// ```text
/// Draft ──► SchedulePolling ──► Confirmed ──► Finished
///   │              │                │
///   └──────────────┴────────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Being prepared by the organizer; details can still change.
    #[default]
    Draft,

    /// Collecting date availability from prospective participants.
    SchedulePolling,

    /// Date fixed and participants are being gathered.
    Confirmed,

    /// The event took place (terminal state).
    Finished,

    /// The event was called off (terminal state).
    Cancelled,
}

impl EventStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [EventStatus; 5] = [
        EventStatus::Draft,
        EventStatus::SchedulePolling,
        EventStatus::Confirmed,
        EventStatus::Finished,
        EventStatus::Cancelled,
    ];

    /// Returns the statuses reachable in one step from this one.
    pub fn allowed_transitions(&self) -> &'static [EventStatus] {
        match self {
            EventStatus::Draft => &[EventStatus::SchedulePolling, EventStatus::Cancelled],
            EventStatus::SchedulePolling => &[EventStatus::Confirmed, EventStatus::Cancelled],
            EventStatus::Confirmed => &[EventStatus::Finished, EventStatus::Cancelled],
            EventStatus::Finished | EventStatus::Cancelled => &[],
        }
    }

    /// Returns true if `target` is reachable in one step.
    pub fn can_transition_to(&self, target: EventStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Returns true if title, roles, fees and the like may still be edited.
    pub fn can_edit_details(&self) -> bool {
        matches!(self, EventStatus::Draft)
    }

    /// Returns true if the schedule poll is open for answers.
    pub fn accepts_poll_responses(&self) -> bool {
        matches!(self, EventStatus::SchedulePolling)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Returns the status name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::SchedulePolling => "SCHEDULE_POLLING",
            EventStatus::Confirmed => "CONFIRMED",
            EventStatus::Finished => "FINISHED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| EventError::validation(format!("invalid event status: {s}")))
    }
}

/// The status of a single registration.
///
/// ```text
/// Registered ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    #[default]
    Registered,

    /// Terminal.
    Cancelled,
}

impl RegistrationStatus {
    pub fn can_transition_to(&self, target: RegistrationStatus) -> bool {
        matches!(
            (self, target),
            (RegistrationStatus::Registered, RegistrationStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RegistrationStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "REGISTERED",
            RegistrationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RegistrationStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(RegistrationStatus::Registered),
            "CANCELLED" => Ok(RegistrationStatus::Cancelled),
            other => Err(EventError::validation(format!(
                "invalid registration status: {other}"
            ))),
        }
    }
}
