// src/error.rs
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::hhmm;
use crate::model::{Employee, Shift, ShiftTime};

// --- Validation Errors ---

/// One side of a gap/overlap violation: who worked and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftSpan {
    pub employee: Employee,
    pub start: ShiftTime,
    pub end: ShiftTime,
}

impl From<&Shift> for ShiftSpan {
    fn from(shift: &Shift) -> Self {
        Self {
            employee: shift.employee.clone(),
            start: shift.start,
            end: shift.end,
        }
    }
}

impl std::fmt::Display for ShiftSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' {}-{}", self.employee, self.start, self.end)
    }
}

/// The first rule violation found in a roster, or the reason no verdict was
/// reached. Messages are the default English rendering; callers that need
/// other wording should match on the variant fields or on [`ErrorKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("There is no validation rule set for this work schedule")]
    MissingPolicy,

    #[error("Shift date {date} is not in the schedule year {expected_year} (found {actual_year})")]
    ShiftYearMismatch {
        expected_year: i32,
        actual_year: i32,
        date: NaiveDate,
    },

    #[error("Shift date {date} is not in the schedule month {expected_year}-{expected_month:02}")]
    ShiftMonthMismatch {
        expected_year: i32,
        expected_month: u32,
        date: NaiveDate,
    },

    #[error("Shift duration can't be negative or zero: {shift}")]
    NonPositiveDuration { shift: Box<Shift> },

    #[error("Only the operator schedule type supports shift continuity validation: {shift}")]
    ContinuityUnsupportedForType { shift: Box<Shift> },

    #[error("A required 'end' continuation marker is missing for employee '{employee}' on {previous_date} (continued on {date})")]
    MissingEndContinuationMarker {
        employee: Employee,
        previous_date: NaiveDate,
        date: NaiveDate,
    },

    #[error("Multiple 'end' continuation markers were found for employee '{employee}' on {previous_date} (continued on {date})")]
    DuplicateEndContinuationMarker {
        employee: Employee,
        previous_date: NaiveDate,
        date: NaiveDate,
    },

    #[error("A gap of {} was detected between shifts on {date}: {previous} and {current}", hhmm::format(.gap))]
    ShiftGapDetected {
        date: NaiveDate,
        previous: ShiftSpan,
        current: ShiftSpan,
        gap: Duration,
    },

    #[error("There is an overlap between shifts on {date}: {previous} and {current}")]
    ShiftOverlapDetected {
        date: NaiveDate,
        previous: ShiftSpan,
        current: ShiftSpan,
    },

    #[error("Employee '{employee}' logged {} on {date}, which exceeds the maximum allowed {}", hhmm::format(.total), hhmm::format(.limit))]
    EmployeeDailyDurationExceeded {
        employee: Employee,
        total: Duration,
        limit: Duration,
        date: NaiveDate,
    },

    #[error("The combined shift time {} on {date} exceeds the allowed maximum of {}", hhmm::format(.combined), hhmm::format(.limit))]
    CombinedDailyDurationExceeded {
        combined: Duration,
        limit: Duration,
        date: NaiveDate,
    },

    #[error("Shift data is missing for the following days: [{}]", join_dates(.dates))]
    MissingRequiredDays { dates: Vec<NaiveDate> },

    #[error("Validation was cancelled before reaching a verdict")]
    Cancelled,
}

/// Stable discriminant of [`ValidationError`], handy as a message key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingPolicy,
    ShiftYearMismatch,
    ShiftMonthMismatch,
    NonPositiveDuration,
    ContinuityUnsupportedForType,
    MissingEndContinuationMarker,
    DuplicateEndContinuationMarker,
    ShiftGapDetected,
    ShiftOverlapDetected,
    EmployeeDailyDurationExceeded,
    CombinedDailyDurationExceeded,
    MissingRequiredDays,
    Cancelled,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::MissingPolicy => ErrorKind::MissingPolicy,
            ValidationError::ShiftYearMismatch { .. } => ErrorKind::ShiftYearMismatch,
            ValidationError::ShiftMonthMismatch { .. } => ErrorKind::ShiftMonthMismatch,
            ValidationError::NonPositiveDuration { .. } => ErrorKind::NonPositiveDuration,
            ValidationError::ContinuityUnsupportedForType { .. } => {
                ErrorKind::ContinuityUnsupportedForType
            }
            ValidationError::MissingEndContinuationMarker { .. } => {
                ErrorKind::MissingEndContinuationMarker
            }
            ValidationError::DuplicateEndContinuationMarker { .. } => {
                ErrorKind::DuplicateEndContinuationMarker
            }
            ValidationError::ShiftGapDetected { .. } => ErrorKind::ShiftGapDetected,
            ValidationError::ShiftOverlapDetected { .. } => ErrorKind::ShiftOverlapDetected,
            ValidationError::EmployeeDailyDurationExceeded { .. } => {
                ErrorKind::EmployeeDailyDurationExceeded
            }
            ValidationError::CombinedDailyDurationExceeded { .. } => {
                ErrorKind::CombinedDailyDurationExceeded
            }
            ValidationError::MissingRequiredDays { .. } => ErrorKind::MissingRequiredDays,
            ValidationError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// `false` only for [`ValidationError::Cancelled`], which says nothing
    /// about the roster itself.
    pub fn is_violation(&self) -> bool {
        !matches!(self, ValidationError::Cancelled)
    }
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|date| date.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// --- Model & Configuration Errors ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid year-month {year}-{month}")]
    InvalidYearMonth { year: i32, month: u32 },
    #[error("Shift time {value} is outside 00:00-24:00")]
    ShiftTimeOutOfRange { value: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON serialization/deserialization failed: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
}
