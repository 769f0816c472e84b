use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid recurrence rule: {field}")]
    InvalidRule { field: &'static str },

    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Invalid worship type: {0}")]
    InvalidWorshipType(String),

    #[error("Invalid weekday tag: {0}")]
    InvalidWeekday(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn invalid_rule(field: &'static str) -> Self {
        Self::InvalidRule { field }
    }

    /// Name of the offending rule field, if this is a rule validation failure.
    pub fn rule_field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRule { field } => Some(field),
            _ => None,
        }
    }
}
