pub mod calendar;
pub mod config;
pub mod error;
pub mod expander;
pub mod recurrence;
pub mod statistics;
pub mod types;

pub use calendar::DayOfWeek;
pub use error::{Error, Result};
pub use expander::{expand, expand_all, next_occurrence, Expansion, Occurrences};
pub use recurrence::{RecurrenceRule, RecurrenceType, WeekdaySet};
pub use statistics::{aggregate, aggregate_buckets, aggregate_rules};
pub use types::*;
