//! Shared building blocks for the campus event system.
//!
//! Identifiers, id generation and clocks live here so that every crate can
//! receive them as injected collaborators instead of reaching for globals.

pub mod clock;
pub mod id;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use id::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use types::AggregateId;
