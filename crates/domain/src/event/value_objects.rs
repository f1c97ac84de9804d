//! Value objects for the event domain.

use common::{AggregateId, IdGenerator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventError;

/// Currency code every event falls back to when no fee rule applies.
pub const JPY: &str = "JPY";

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Draws a fresh event ID from the given generator.
    pub fn generate(ids: &dyn IdGenerator) -> Self {
        Self(ids.next_uuid())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EventId> for AggregateId {
    fn from(id: EventId) -> Self {
        AggregateId::from_uuid(id.0)
    }
}

impl From<AggregateId> for EventId {
    fn from(id: AggregateId) -> Self {
        Self(id.as_uuid())
    }
}

/// Unique identifier for a user, issued by the external user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a user ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique identifier for a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    pub fn generate(ids: &dyn IdGenerator) -> Self {
        Self(ids.next_uuid())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a schedule poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(Uuid);

impl PollId {
    pub fn generate(ids: &dyn IdGenerator) -> Self {
        Self(ids.next_uuid())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for PollId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn non_empty(value: impl Into<String>, what: &str) -> Result<String, EventError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EventError::validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Role identifier such as `"member"` or `"alumni"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    /// Creates a role, rejecting blank names.
    pub fn new(name: impl Into<String>) -> Result<Self, EventError> {
        Ok(Self(non_empty(name, "role")?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Role {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.0
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cohort identifier of a user, typically the enrollment year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Generation(String);

impl Generation {
    /// Creates a generation, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, EventError> {
        Ok(Self(non_empty(value, "generation")?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Generation {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Generation> for String {
    fn from(value: Generation) -> Self {
        value.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-form label attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Creates a tag, rejecting blank labels.
    pub fn new(label: impl Into<String>) -> Result<Self, EventError> {
        Ok(Self(non_empty(label, "tag")?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tag> for String {
    fn from(value: Tag) -> Self {
        value.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An exact, non-negative amount in a single currency.
///
/// Amounts are integers in the currency's smallest unit (yen for JPY).
/// Arithmetic between different currencies is rejected rather than converted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StoredMoney")]
pub struct Money {
    amount: i64,
    currency: String,
}

/// Wire shape of `Money`, validated on the way in.
#[derive(Deserialize)]
struct StoredMoney {
    amount: i64,
    currency: String,
}

impl TryFrom<StoredMoney> for Money {
    type Error = EventError;

    fn try_from(stored: StoredMoney) -> Result<Self, Self::Error> {
        Money::new(stored.amount, stored.currency)
    }
}

impl Money {
    /// Creates a money amount, rejecting negative amounts and blank currencies.
    ///
    /// The currency code is normalized to upper case.
    pub fn new(amount: i64, currency: impl Into<String>) -> Result<Self, EventError> {
        if amount < 0 {
            return Err(EventError::validation(format!(
                "amount cannot be negative: {amount}"
            )));
        }
        let currency = non_empty(currency, "currency")?.to_ascii_uppercase();
        Ok(Self { amount, currency })
    }

    /// Creates a Japanese yen amount.
    pub fn jpy(amount: i64) -> Result<Self, EventError> {
        Self::new(amount, JPY)
    }

    /// Returns zero yen.
    pub fn zero_jpy() -> Self {
        Self {
            amount: 0,
            currency: JPY.to_string(),
        }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Adds another amount of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, EventError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| EventError::validation("amount overflow"))?;
        Money::new(amount, self.currency.clone())
    }

    /// Subtracts another amount of the same currency.
    ///
    /// Fails if the result would be negative.
    pub fn subtract(&self, other: &Money) -> Result<Money, EventError> {
        self.ensure_same_currency(other)?;
        if self.amount < other.amount {
            return Err(EventError::NegativeAmount {
                minuend: self.amount,
                subtrahend: other.amount,
            });
        }
        Money::new(self.amount - other.amount, self.currency.clone())
    }

    /// Formats yen as `¥1000`; other currencies use the plain format.
    pub fn format_jpy(&self) -> String {
        if self.currency != JPY {
            return self.to_string();
        }
        format!("¥{}", self.amount)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), EventError> {
        if self.currency != other.currency {
            return Err(EventError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
