//! Event aggregate implementation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::{AggregateId, IdGenerator};
use serde::{Deserialize, Serialize};
use snapshot_store::Version;

use crate::aggregate::Aggregate;

use super::{
    DATE_POLL, DateAvailability, EventError, EventId, EventStatus, FeeSetting, Money,
    Registration, RegistrationId, Role, SchedulePoll, Tag, User, UserId, resolve_fee,
};

/// Editable details of an event.
///
/// Used both when creating an event and when updating a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub venue: String,
    pub allowed_roles: Vec<Role>,
    pub tags: Vec<Tag>,
    pub fee_settings: Vec<FeeSetting>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    pub fn allowed_role(mut self, role: Role) -> Self {
        self.allowed_roles.push(role);
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn fee_setting(mut self, setting: FeeSetting) -> Self {
        self.fee_settings.push(setting);
        self
    }

    /// Checks the draft and returns the normalized title and role set.
    fn validate(&self) -> Result<(String, BTreeSet<Role>), EventError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(EventError::validation("title cannot be empty"));
        }

        let roles: BTreeSet<Role> = self.allowed_roles.iter().cloned().collect();
        if roles.is_empty() {
            return Err(EventError::validation("allowed roles cannot be empty"));
        }

        Ok((title.to_string(), roles))
    }
}

/// Event aggregate root.
///
/// Owns its schedule poll, fee settings and registrations. Every change goes
/// through the methods below; time is always passed in by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,

    /// Stored version for optimistic concurrency. Tracked by the store, not
    /// serialized with the state.
    #[serde(skip)]
    version: Version,

    organizer_id: UserId,
    title: String,
    description: String,
    status: EventStatus,
    allowed_roles: BTreeSet<Role>,
    tags: BTreeSet<Tag>,
    venue: String,
    schedule_poll: SchedulePoll,
    fee_settings: Vec<FeeSetting>,

    /// Append-only; cancelled entries stay.
    registrations: Vec<Registration>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Event {
    fn aggregate_type() -> &'static str {
        "Event"
    }

    fn aggregate_id(&self) -> AggregateId {
        self.id.into()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Query methods
impl Event {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn organizer_id(&self) -> UserId {
        self.organizer_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn allowed_roles(&self) -> &BTreeSet<Role> {
        &self.allowed_roles
    }

    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    pub fn schedule_poll(&self) -> &SchedulePoll {
        &self.schedule_poll
    }

    pub fn fee_settings(&self) -> &[FeeSetting] {
        &self.fee_settings
    }

    /// All registrations in the order they were made, cancelled ones included.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the most recent registration of a user, active or not.
    pub fn registration_for(&self, user_id: UserId) -> Option<&Registration> {
        self.registrations
            .iter()
            .rev()
            .find(|r| r.user_id() == user_id)
    }

    pub fn active_registration_for(&self, user_id: UserId) -> Option<&Registration> {
        self.active_registrations().find(|r| r.user_id() == user_id)
    }

    pub fn active_registrations(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter().filter(|r| r.is_active())
    }

    pub fn participant_count(&self) -> usize {
        self.active_registrations().count()
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.active_registration_for(user_id).is_some()
    }

    pub fn is_organized_by(&self, user_id: UserId) -> bool {
        self.organizer_id == user_id
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Returns true if the user holds a role allowed to take part.
    pub fn is_eligible(&self, user: &User) -> bool {
        user.has_any_role(&self.allowed_roles)
    }

    /// Returns the fee the user would pay, zero yen when no rule matches.
    pub fn applicable_fee(&self, user: &User) -> Money {
        resolve_fee(&self.fee_settings, user)
            .map(|setting| setting.fee().clone())
            .unwrap_or_else(Money::zero_jpy)
    }

    /// Sum of the fees of all active registrations.
    pub fn expected_revenue(&self) -> Result<Money, EventError> {
        let mut fees = self.active_registrations().map(Registration::applied_fee);
        let Some(first) = fees.next() else {
            return Ok(Money::zero_jpy());
        };
        fees.try_fold(first.clone(), |total, fee| total.add(fee))
    }
}

// Command methods
impl Event {
    /// Creates a draft event along with its schedule poll.
    pub fn create(
        ids: &dyn IdGenerator,
        organizer_id: UserId,
        draft: EventDraft,
        candidate_dates: impl IntoIterator<Item = DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        let (title, allowed_roles) = draft.validate()?;
        let id = EventId::generate(ids);
        let schedule_poll = SchedulePoll::new(ids, DATE_POLL, candidate_dates)?;

        Ok(Self {
            id,
            version: Version::initial(),
            organizer_id,
            title,
            description: draft.description,
            status: EventStatus::Draft,
            allowed_roles,
            tags: draft.tags.into_iter().collect(),
            venue: draft.venue,
            schedule_poll,
            fee_settings: draft.fee_settings,
            registrations: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable details. Only drafts can be edited.
    pub fn update_details(&mut self, draft: EventDraft, now: DateTime<Utc>) -> Result<(), EventError> {
        if !self.status.can_edit_details() {
            return Err(self.invalid_transition("update details"));
        }

        let (title, allowed_roles) = draft.validate()?;

        self.title = title;
        self.description = draft.description;
        self.venue = draft.venue;
        self.allowed_roles = allowed_roles;
        self.tags = draft.tags.into_iter().collect();
        self.fee_settings = draft.fee_settings;
        self.updated_at = now;
        Ok(())
    }

    /// Opens the schedule poll for answers.
    pub fn start_schedule_polling(&mut self, now: DateTime<Utc>) -> Result<(), EventError> {
        self.transition_to(EventStatus::SchedulePolling, "start schedule polling", now)
    }

    /// Records a user's date availability while the poll is open.
    pub fn submit_poll_response(
        &mut self,
        user: &User,
        answers: Vec<DateAvailability>,
        now: DateTime<Utc>,
    ) -> Result<(), EventError> {
        if !self.status.accepts_poll_responses() {
            return Err(self.invalid_transition("submit poll response"));
        }
        if !self.is_eligible(user) {
            return Err(EventError::IneligibleRole { user_id: user.id() });
        }

        self.schedule_poll
            .add_response(user.id(), user.name(), answers)?;
        self.updated_at = now;
        Ok(())
    }

    /// Picks the final date without leaving the polling phase.
    ///
    /// Use [`Event::publish`] afterwards to confirm the event.
    pub fn select_schedule_date(
        &mut self,
        date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), EventError> {
        if self.status != EventStatus::SchedulePolling {
            return Err(self.invalid_transition("select schedule date"));
        }

        self.schedule_poll.finalize_schedule(date)?;
        self.updated_at = now;
        Ok(())
    }

    /// Fixes the event date and confirms the event in one step.
    ///
    /// The date must be a candidate and strictly after `now`.
    pub fn confirm_schedule(
        &mut self,
        date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), EventError> {
        if self.status != EventStatus::SchedulePolling {
            return Err(self.invalid_transition("confirm schedule"));
        }
        if !self.schedule_poll.is_candidate(date) {
            return Err(EventError::DateNotCandidate { date });
        }
        if date <= now {
            return Err(EventError::PastScheduleDate { date });
        }

        self.schedule_poll.finalize_schedule(date)?;
        self.status = EventStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    /// Confirms the event using the date already selected on the poll.
    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), EventError> {
        if !self.status.can_transition_to(EventStatus::Confirmed) {
            return Err(self.invalid_transition("publish"));
        }

        let date = self
            .schedule_poll
            .finalized_date()
            .ok_or(EventError::ScheduleNotFinalized)?;
        if date <= now {
            return Err(EventError::PastScheduleDate { date });
        }

        self.status = EventStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), EventError> {
        self.transition_to(EventStatus::Cancelled, "cancel", now)
    }

    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<(), EventError> {
        self.transition_to(EventStatus::Finished, "finish", now)
    }

    /// Registers a user at the fee that applies to them right now.
    ///
    /// Fails if the user holds no allowed role or is already registered.
    pub fn add_registration(
        &mut self,
        user: &User,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
    ) -> Result<Registration, EventError> {
        if !self.is_eligible(user) {
            return Err(EventError::IneligibleRole { user_id: user.id() });
        }
        if self.is_participant(user.id()) {
            return Err(EventError::AlreadyRegistered { user_id: user.id() });
        }

        let registration = Registration::new(
            RegistrationId::generate(ids),
            self.id,
            user.id(),
            self.applicable_fee(user),
            now,
        );
        self.registrations.push(registration.clone());
        self.updated_at = now;
        Ok(registration)
    }

    /// Cancels the user's active registration. The entry stays in the history.
    pub fn cancel_registration(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Registration, EventError> {
        let registration = self
            .registrations
            .iter_mut()
            .find(|r| r.user_id() == user_id && r.is_active())
            .ok_or(EventError::RegistrationNotFound { user_id })?;

        registration.cancel(now)?;
        let cancelled = registration.clone();
        self.updated_at = now;
        Ok(cancelled)
    }

    fn transition_to(
        &mut self,
        target: EventStatus,
        action: &'static str,
        now: DateTime<Utc>,
    ) -> Result<(), EventError> {
        if !self.status.can_transition_to(target) {
            return Err(self.invalid_transition(action));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    fn invalid_transition(&self, action: &'static str) -> EventError {
        EventError::InvalidTransition {
            current_status: self.status,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::SequentialIdGenerator;
    use uuid::Uuid;

    use crate::event::{Generation, RegistrationStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 10, 9, 0, 0).unwrap()
    }

    fn day(n: i64) -> DateTime<Utc> {
        now() + Duration::days(n)
    }

    fn role(name: &str) -> Role {
        Role::new(name).unwrap()
    }

    fn user(n: u128, role_name: &str, generation: &str) -> User {
        User::new(
            UserId::from_uuid(Uuid::from_u128(1000 + n)),
            format!("user-{n}"),
            [role(role_name)],
            Generation::new(generation).unwrap(),
        )
        .unwrap()
    }

    fn draft() -> EventDraft {
        EventDraft::new("Spring camp")
            .description("Two nights in Nagano")
            .venue("Hakuba")
            .allowed_role(role("member"))
            .tag(Tag::new("camp").unwrap())
            .fee_setting(FeeSetting::for_role(role("member"), Money::jpy(1000).unwrap()))
            .fee_setting(FeeSetting::for_generation(
                role("member"),
                Generation::new("2024").unwrap(),
                Money::jpy(500).unwrap(),
            ))
    }

    fn event(ids: &SequentialIdGenerator) -> Event {
        Event::create(ids, user(0, "member", "2020").id(), draft(), [day(10), day(3)], now())
            .unwrap()
    }

    #[test]
    fn test_create_event() {
        let ids = SequentialIdGenerator::new();
        let event = event(&ids);

        assert_eq!(event.status(), EventStatus::Draft);
        assert!(event.registrations().is_empty());
        assert_eq!(event.title(), "Spring camp");
        assert_eq!(event.version(), Version::initial());
        assert_eq!(event.created_at(), now());
        assert_eq!(
            event.schedule_poll().candidate_dates().collect::<Vec<_>>(),
            vec![day(3), day(10)]
        );
        assert!(event.has_tag(&Tag::new("camp").unwrap()));
    }

    #[test]
    fn test_create_rejects_invalid_draft() {
        let ids = SequentialIdGenerator::new();
        let organizer = user(0, "member", "2020").id();

        let untitled = EventDraft::new("   ").allowed_role(role("member"));
        assert!(matches!(
            Event::create(&ids, organizer, untitled, [day(1)], now()),
            Err(EventError::Validation(_))
        ));

        let no_roles = EventDraft::new("Party");
        assert!(matches!(
            Event::create(&ids, organizer, no_roles, [day(1)], now()),
            Err(EventError::Validation(_))
        ));

        assert!(matches!(
            Event::create(&ids, organizer, draft(), Vec::new(), now()),
            Err(EventError::Validation(_))
        ));
    }

    #[test]
    fn test_update_details_only_in_draft() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);

        let updated = EventDraft::new("Summer camp")
            .allowed_role(role("member"))
            .allowed_role(role("alumni"));
        event.update_details(updated, day(1)).unwrap();
        assert_eq!(event.title(), "Summer camp");
        assert_eq!(event.allowed_roles().len(), 2);
        assert!(event.fee_settings().is_empty());
        assert!(event.tags().is_empty());
        assert_eq!(event.updated_at(), day(1));

        assert!(matches!(
            event.update_details(EventDraft::new("x"), day(1)),
            Err(EventError::Validation(_))
        ));

        event.start_schedule_polling(day(1)).unwrap();
        assert_eq!(
            event.update_details(draft(), day(2)),
            Err(EventError::InvalidTransition {
                current_status: EventStatus::SchedulePolling,
                action: "update details",
            })
        );
        assert_eq!(event.title(), "Summer camp");
    }

    #[test]
    fn test_confirm_schedule_checks() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);

        assert!(matches!(
            event.confirm_schedule(day(3), now()),
            Err(EventError::InvalidTransition { .. })
        ));

        event.start_schedule_polling(now()).unwrap();

        assert_eq!(
            event.confirm_schedule(day(4), now()),
            Err(EventError::DateNotCandidate { date: day(4) })
        );
        assert_eq!(
            event.confirm_schedule(day(3), day(3)),
            Err(EventError::PastScheduleDate { date: day(3) })
        );
        assert_eq!(event.status(), EventStatus::SchedulePolling);
        assert!(!event.schedule_poll().is_finalized());

        event.confirm_schedule(day(3), now()).unwrap();
        assert_eq!(event.status(), EventStatus::Confirmed);
        assert_eq!(event.schedule_poll().finalized_date(), Some(day(3)));
    }

    #[test]
    fn test_publish_requires_future_finalized_date() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);

        assert!(matches!(
            event.publish(now()),
            Err(EventError::InvalidTransition { .. })
        ));

        event.start_schedule_polling(now()).unwrap();
        assert_eq!(event.publish(now()), Err(EventError::ScheduleNotFinalized));

        event.select_schedule_date(day(3), now()).unwrap();
        assert_eq!(event.status(), EventStatus::SchedulePolling);
        assert_eq!(
            event.publish(day(5)),
            Err(EventError::PastScheduleDate { date: day(3) })
        );

        event.publish(now()).unwrap();
        assert_eq!(event.status(), EventStatus::Confirmed);
    }

    #[test]
    fn test_poll_response_requires_polling_and_role() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        let member = user(1, "member", "2024");
        let guest = user(2, "guest", "2024");
        let answers = vec![DateAvailability::new(day(3), true)];

        assert!(matches!(
            event.submit_poll_response(&member, answers.clone(), now()),
            Err(EventError::InvalidTransition { .. })
        ));

        event.start_schedule_polling(now()).unwrap();
        assert_eq!(
            event.submit_poll_response(&guest, answers.clone(), now()),
            Err(EventError::IneligibleRole { user_id: guest.id() })
        );

        event.submit_poll_response(&member, answers.clone(), now()).unwrap();
        assert_eq!(
            event.submit_poll_response(&member, answers, now()),
            Err(EventError::DuplicateResponse { user_id: member.id() })
        );
        assert_eq!(event.schedule_poll().availability_summary()[&day(3)], 1);
    }

    #[test]
    fn test_registration_flow() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        let member = user(1, "member", "2024");

        let registration = event.add_registration(&member, &ids, now()).unwrap();
        assert_eq!(registration.applied_fee(), &Money::jpy(500).unwrap());
        assert_eq!(registration.event_id(), event.id());
        assert!(event.is_participant(member.id()));

        assert_eq!(
            event.add_registration(&member, &ids, now()),
            Err(EventError::AlreadyRegistered { user_id: member.id() })
        );
        assert_eq!(event.registrations().len(), 1);

        let guest = user(2, "guest", "2024");
        assert_eq!(
            event.add_registration(&guest, &ids, now()),
            Err(EventError::IneligibleRole { user_id: guest.id() })
        );
        assert_eq!(event.registrations().len(), 1);
    }

    #[test]
    fn test_role_check_precedes_duplicate_check() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        let member = user(1, "member", "2024");
        event.add_registration(&member, &ids, now()).unwrap();

        event
            .update_details(EventDraft::new("Staff only").allowed_role(role("staff")), now())
            .unwrap();
        assert_eq!(
            event.add_registration(&member, &ids, now()),
            Err(EventError::IneligibleRole { user_id: member.id() })
        );
    }

    #[test]
    fn test_cancel_and_reregister() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        let member = user(1, "member", "2023");

        assert_eq!(
            event.cancel_registration(member.id(), now()),
            Err(EventError::RegistrationNotFound { user_id: member.id() })
        );

        let first = event.add_registration(&member, &ids, now()).unwrap();
        let cancelled = event.cancel_registration(member.id(), day(1)).unwrap();
        assert_eq!(cancelled.id(), first.id());
        assert_eq!(cancelled.status(), RegistrationStatus::Cancelled);
        assert!(!event.is_participant(member.id()));
        assert_eq!(event.participant_count(), 0);

        let second = event.add_registration(&member, &ids, day(2)).unwrap();
        assert_ne!(second.id(), first.id());
        assert_eq!(event.registrations().len(), 2);
        assert_eq!(event.registration_for(member.id()).map(|r| r.id()), Some(second.id()));
        assert_eq!(event.participant_count(), 1);
    }

    #[test]
    fn test_applicable_fee_and_revenue() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        assert_eq!(event.expected_revenue().unwrap(), Money::zero_jpy());

        let junior = user(1, "member", "2024");
        let senior = user(2, "member", "2023");
        let outsider = user(3, "guest", "2024");

        assert_eq!(event.applicable_fee(&junior), Money::jpy(500).unwrap());
        assert_eq!(event.applicable_fee(&senior), Money::jpy(1000).unwrap());
        assert_eq!(event.applicable_fee(&outsider), Money::zero_jpy());

        event.add_registration(&junior, &ids, now()).unwrap();
        event.add_registration(&senior, &ids, now()).unwrap();
        assert_eq!(event.expected_revenue().unwrap(), Money::jpy(1500).unwrap());

        event.cancel_registration(senior.id(), now()).unwrap();
        assert_eq!(event.expected_revenue().unwrap(), Money::jpy(500).unwrap());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        event.cancel(now()).unwrap();

        assert!(event.cancel(now()).is_err());
        assert!(event.finish(now()).is_err());
        assert!(event.start_schedule_polling(now()).is_err());
        assert!(event.publish(now()).is_err());
        assert_eq!(event.status(), EventStatus::Cancelled);
    }

    #[test]
    fn test_serialization_skips_version() {
        let ids = SequentialIdGenerator::new();
        let mut event = event(&ids);
        event.set_version(Version::new(7));

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("version").is_none());
        assert_eq!(json["status"], "DRAFT");
        assert_eq!(json["organizer_id"], serde_json::json!(event.organizer_id()));

        let mut restored: Event = serde_json::from_value(json).unwrap();
        assert_eq!(restored.version(), Version::initial());
        restored.set_version(Version::new(7));
        assert_eq!(restored, event);
    }
}
