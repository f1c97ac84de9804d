//! Schedule polling: candidate dates, availability answers, finalized date.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use common::IdGenerator;
use serde::{Deserialize, Serialize};

use super::{EventError, PollId, UserId};

/// Poll type used for date availability polls.
pub const DATE_POLL: &str = "date";

/// One user's answer for one candidate date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAvailability {
    pub date: DateTime<Utc>,
    pub available: bool,
}

impl DateAvailability {
    pub fn new(date: DateTime<Utc>, available: bool) -> Self {
        Self { date, available }
    }
}

/// A user's full answer to the poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub user_id: UserId,
    pub user_name: String,
    pub answers: Vec<DateAvailability>,
}

/// Collects date availability and holds the date finally chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePoll {
    id: PollId,
    poll_type: String,
    candidate_dates: BTreeSet<DateTime<Utc>>,
    responses: Vec<PollResponse>,
    finalized_date: Option<DateTime<Utc>>,
}

impl SchedulePoll {
    /// Creates a poll over the given candidate dates.
    ///
    /// Candidates are sorted ascending and duplicates collapse.
    pub fn new(
        ids: &dyn IdGenerator,
        poll_type: impl Into<String>,
        candidate_dates: impl IntoIterator<Item = DateTime<Utc>>,
    ) -> Result<Self, EventError> {
        let poll_type = poll_type.into();
        if poll_type.trim().is_empty() {
            return Err(EventError::validation("poll type cannot be empty"));
        }

        let candidate_dates: BTreeSet<_> = candidate_dates.into_iter().collect();
        if candidate_dates.is_empty() {
            return Err(EventError::validation("candidate dates cannot be empty"));
        }

        Ok(Self {
            id: PollId::generate(ids),
            poll_type,
            candidate_dates,
            responses: Vec::new(),
            finalized_date: None,
        })
    }

    pub fn id(&self) -> PollId {
        self.id
    }

    pub fn poll_type(&self) -> &str {
        &self.poll_type
    }

    /// Candidate dates in ascending order.
    pub fn candidate_dates(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.candidate_dates.iter().copied()
    }

    pub fn is_candidate(&self, date: DateTime<Utc>) -> bool {
        self.candidate_dates.contains(&date)
    }

    pub fn responses(&self) -> &[PollResponse] {
        &self.responses
    }

    pub fn response_for(&self, user_id: UserId) -> Option<&PollResponse> {
        self.responses.iter().find(|r| r.user_id == user_id)
    }

    pub fn finalized_date(&self) -> Option<DateTime<Utc>> {
        self.finalized_date
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_date.is_some()
    }

    /// Records a user's answer.
    ///
    /// Each user answers once; every answered date must be a candidate and
    /// appear at most once in the answer.
    pub fn add_response(
        &mut self,
        user_id: UserId,
        user_name: impl Into<String>,
        answers: Vec<DateAvailability>,
    ) -> Result<(), EventError> {
        if self.response_for(user_id).is_some() {
            return Err(EventError::DuplicateResponse { user_id });
        }

        let mut seen = HashSet::with_capacity(answers.len());
        for answer in &answers {
            if !self.is_candidate(answer.date) {
                return Err(EventError::DateNotCandidate { date: answer.date });
            }
            if !seen.insert(answer.date) {
                return Err(EventError::validation(format!(
                    "date {} answered more than once",
                    answer.date
                )));
            }
        }

        self.responses.push(PollResponse {
            user_id,
            user_name: user_name.into(),
            answers,
        });
        Ok(())
    }

    /// Fixes the event date. Overwrites an earlier choice.
    pub fn finalize_schedule(&mut self, date: DateTime<Utc>) -> Result<(), EventError> {
        if !self.is_candidate(date) {
            return Err(EventError::DateNotCandidate { date });
        }
        self.finalized_date = Some(date);
        Ok(())
    }

    /// Number of respondents available on each candidate date, zeros included.
    pub fn availability_summary(&self) -> BTreeMap<DateTime<Utc>, usize> {
        let mut summary: BTreeMap<_, _> = self.candidate_dates.iter().map(|d| (*d, 0)).collect();

        for response in &self.responses {
            for answer in response.answers.iter().filter(|a| a.available) {
                if let Some(count) = summary.get_mut(&answer.date) {
                    *count += 1;
                }
            }
        }

        summary
    }

    /// Candidate dates sharing the highest availability count.
    ///
    /// Empty when nobody is available on any date.
    pub fn most_available_dates(&self) -> Vec<DateTime<Utc>> {
        let summary = self.availability_summary();
        let best = summary.values().copied().max().unwrap_or(0);
        if best == 0 {
            return Vec::new();
        }
        summary
            .into_iter()
            .filter(|(_, count)| *count == best)
            .map(|(date, _)| date)
            .collect()
    }
}
