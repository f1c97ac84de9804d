//! Read models built from the event aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Event, EventError, EventId, EventStatus, FeeSetting, Money, PollId, PollResponse,
    Registration, Role, Tag, UserId,
};

/// Criteria for listing events. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub tag: Option<Tag>,
    pub organizer_id: Option<UserId>,

    /// Only events where this user holds an active registration.
    pub participant_id: Option<UserId>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn organizer(mut self, organizer_id: UserId) -> Self {
        self.organizer_id = Some(organizer_id);
        self
    }

    pub fn participant(mut self, participant_id: UserId) -> Self {
        self.participant_id = Some(participant_id);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.status.is_none_or(|status| event.status() == status)
            && self.tag.as_ref().is_none_or(|tag| event.has_tag(tag))
            && self
                .organizer_id
                .is_none_or(|organizer| event.is_organized_by(organizer))
            && self
                .participant_id
                .is_none_or(|participant| event.is_participant(participant))
    }
}

/// Compact view for event listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub id: EventId,
    pub organizer_id: UserId,
    pub title: String,
    pub status: EventStatus,
    pub venue: String,
    pub tags: Vec<Tag>,
    pub finalized_date: Option<DateTime<Utc>>,
    pub participant_count: usize,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id(),
            organizer_id: event.organizer_id(),
            title: event.title().to_string(),
            status: event.status(),
            venue: event.venue().to_string(),
            tags: event.tags().iter().cloned().collect(),
            finalized_date: event.schedule_poll().finalized_date(),
            participant_count: event.participant_count(),
        }
    }
}

/// Available count for one candidate date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: DateTime<Utc>,
    pub available: usize,
}

/// Schedule poll as shown on the event page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollView {
    pub id: PollId,
    pub poll_type: String,
    pub candidate_dates: Vec<DateTime<Utc>>,
    pub responses: Vec<PollResponse>,
    pub finalized_date: Option<DateTime<Utc>>,
    pub availability: Vec<DateCount>,
    pub most_available_dates: Vec<DateTime<Utc>>,
}

/// Full view of an event, including its poll and registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetails {
    pub id: EventId,
    pub organizer_id: UserId,
    pub title: String,
    pub description: String,
    pub status: EventStatus,
    pub venue: String,
    pub allowed_roles: Vec<Role>,
    pub tags: Vec<Tag>,
    pub schedule_poll: PollView,
    pub fee_settings: Vec<FeeSetting>,
    pub registrations: Vec<Registration>,
    pub participant_count: usize,
    pub expected_revenue: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Event> for EventDetails {
    type Error = EventError;

    fn try_from(event: &Event) -> Result<Self, Self::Error> {
        let poll = event.schedule_poll();
        let availability = poll
            .availability_summary()
            .into_iter()
            .map(|(date, available)| DateCount { date, available })
            .collect();

        Ok(Self {
            id: event.id(),
            organizer_id: event.organizer_id(),
            title: event.title().to_string(),
            description: event.description().to_string(),
            status: event.status(),
            venue: event.venue().to_string(),
            allowed_roles: event.allowed_roles().iter().cloned().collect(),
            tags: event.tags().iter().cloned().collect(),
            schedule_poll: PollView {
                id: poll.id(),
                poll_type: poll.poll_type().to_string(),
                candidate_dates: poll.candidate_dates().collect(),
                responses: poll.responses().to_vec(),
                finalized_date: poll.finalized_date(),
                availability,
                most_available_dates: poll.most_available_dates(),
            },
            fee_settings: event.fee_settings().to_vec(),
            registrations: event.registrations().to_vec(),
            participant_count: event.participant_count(),
            expected_revenue: event.expected_revenue()?,
            created_at: event.created_at(),
            updated_at: event.updated_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::SequentialIdGenerator;
    use uuid::Uuid;

    use crate::event::{DateAvailability, EventDraft, Generation, User};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    fn member(n: u128) -> User {
        User::new(
            UserId::from_uuid(Uuid::from_u128(500 + n)),
            format!("member-{n}"),
            [Role::new("member").unwrap()],
            Generation::new("2024").unwrap(),
        )
        .unwrap()
    }

    fn event(ids: &SequentialIdGenerator) -> Event {
        let draft = EventDraft::new("Board game night")
            .allowed_role(Role::new("member").unwrap())
            .tag(Tag::new("indoor").unwrap());
        Event::create(
            ids,
            member(0).id(),
            draft,
            [now() + Duration::days(1), now() + Duration::days(2)],
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_filter_matches() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        event.add_registration(&member(1), &ids, now()).unwrap();

        assert!(EventFilter::new().matches(&event));
        assert!(EventFilter::new().status(EventStatus::Draft).matches(&event));
        assert!(!EventFilter::new().status(EventStatus::Confirmed).matches(&event));
        assert!(EventFilter::new().tag(Tag::new("indoor").unwrap()).matches(&event));
        assert!(!EventFilter::new().tag(Tag::new("outdoor").unwrap()).matches(&event));
        assert!(EventFilter::new().organizer(member(0).id()).matches(&event));
        assert!(!EventFilter::new().organizer(member(1).id()).matches(&event));
        assert!(EventFilter::new().participant(member(1).id()).matches(&event));
        assert!(!EventFilter::new().participant(member(2).id()).matches(&event));
    }

    #[test]
    fn test_summary() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        event.add_registration(&member(1), &ids, now()).unwrap();

        let summary = EventSummary::from(&event);
        assert_eq!(summary.title, "Board game night");
        assert_eq!(summary.participant_count, 1);
        assert_eq!(summary.finalized_date, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "DRAFT");
        assert_eq!(json["tags"], serde_json::json!(["indoor"]));
    }

    #[test]
    fn test_details_include_availability() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        let first = now() + Duration::days(1);
        event.start_schedule_polling(now()).unwrap();
        event
            .submit_poll_response(&member(1), vec![DateAvailability::new(first, true)], now())
            .unwrap();

        let details = EventDetails::try_from(&event).unwrap();
        assert_eq!(details.schedule_poll.availability.len(), 2);
        assert_eq!(
            details.schedule_poll.availability[0],
            DateCount {
                date: first,
                available: 1
            }
        );
        assert_eq!(details.schedule_poll.availability[1].available, 0);
        assert_eq!(details.schedule_poll.most_available_dates, vec![first]);
        assert_eq!(details.expected_revenue, Money::zero_jpy());
    }
}
