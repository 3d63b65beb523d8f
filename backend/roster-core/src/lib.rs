// src/lib.rs
//! Certifies that a month's shift roster is internally consistent before it
//! is turned into payroll timesheets.

pub mod batch;
pub mod cancel;
pub mod config;
pub mod error;
pub mod hhmm;
pub mod model;
pub mod rules;
pub mod timesheet;
pub mod validated;
pub mod validation;


pub use batch::{validate_batch, BatchError, ScheduleResult};
pub use cancel::CancellationFlag;
pub use config::AppConfig;
pub use error::{ConfigError, ErrorKind, ModelError, ShiftSpan, ValidationError};
pub use model::{
    Company, Employee, Location, ScheduleMetadata, ScheduleSource, ScheduleType, Shift, ShiftTime,
    WorkSchedule, YearMonth,
};
pub use rules::{RuleBook, ValidationRule};
pub use timesheet::{Holidays, TimeSheet, TimeSheetSummary};
pub use validated::ValidatedSchedule;
pub use validation::ScheduleValidator;
