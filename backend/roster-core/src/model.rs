// src/model.rs
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::error::ModelError;
use crate::hhmm;
use crate::rules::{RuleBook, ValidationRule};

/// Continuation markers are shown with this glyph wherever a shift is printed.
pub const CONTINUATION_MARKER: &str = "\u{2192}";

// --- Identities ---

fn folded(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars().flat_map(char::to_lowercase)
}

// Names compare and hash ignoring case so they can key maps directly.
macro_rules! case_insensitive_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                folded(&self.0).eq(folded(&other.0))
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                for c in folded(&self.0) {
                    c.hash(state);
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }
    };
}

case_insensitive_name!(
    /// Employee named on a shift.
    Employee
);
case_insensitive_name!(Company);
case_insensitive_name!(
    /// Site address the roster belongs to.
    Location
);

// --- Calendar ---

#[derive(Deserialize)]
struct RawYearMonth {
    year: i32,
    month: u32,
}

/// A calendar month. First and last days are resolved on construction, so
/// every `YearMonth` in circulation is a real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawYearMonth")]
pub struct YearMonth {
    year: i32,
    month: u32,
    #[serde(skip)]
    first_day: NaiveDate,
    #[serde(skip)]
    last_day: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidYearMonth { year, month };
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;
        Ok(Self {
            year,
            month,
            first_day,
            last_day,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// Every date of the month in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day;
        self.first_day.iter_days().take_while(move |day| *day <= last)
    }
}

impl TryFrom<RawYearMonth> for YearMonth {
    type Error = ModelError;

    fn try_from(raw: RawYearMonth) -> Result<Self, Self::Error> {
        YearMonth::new(raw.year, raw.month)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

// --- Shifts ---

#[derive(Deserialize)]
struct RawShiftTime {
    #[serde(with = "crate::hhmm")]
    value: Duration,
    #[serde(default)]
    has_continuation_marker: bool,
}

/// A shift endpoint: offset from midnight in `00:00..=24:00`, plus whether it
/// stands for the day boundary shared with the neighbouring date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawShiftTime")]
pub struct ShiftTime {
    #[serde(with = "crate::hhmm")]
    value: Duration,
    has_continuation_marker: bool,
}

impl ShiftTime {
    pub fn new(value: Duration, has_continuation_marker: bool) -> Result<Self, ModelError> {
        if value < Duration::zero() || value > Duration::hours(24) {
            return Err(ModelError::ShiftTimeOutOfRange {
                value: hhmm::format(&value),
            });
        }
        Ok(Self {
            value,
            has_continuation_marker,
        })
    }

    /// Plain clock time.
    pub fn at(hours: i64, minutes: i64) -> Result<Self, ModelError> {
        let value = Duration::try_hours(hours)
            .zip(Duration::try_minutes(minutes))
            .and_then(|(h, m)| h.checked_add(&m))
            .ok_or_else(|| ModelError::ShiftTimeOutOfRange {
                value: format!("{:02}:{:02}", hours, minutes),
            })?;
        Self::new(value, false)
    }

    /// Shift carried over from the previous day, starting at 00:00.
    pub fn start_marker() -> Self {
        Self {
            value: Duration::zero(),
            has_continuation_marker: true,
        }
    }

    /// Shift carried over into the next day, ending at 24:00.
    pub fn end_marker() -> Self {
        Self {
            value: Duration::hours(24),
            has_continuation_marker: true,
        }
    }

    pub fn value(&self) -> Duration {
        self.value
    }

    pub fn has_continuation_marker(&self) -> bool {
        self.has_continuation_marker
    }
}

impl TryFrom<RawShiftTime> for ShiftTime {
    type Error = ModelError;

    fn try_from(raw: RawShiftTime) -> Result<Self, Self::Error> {
        ShiftTime::new(raw.value, raw.has_continuation_marker)
    }
}

impl std::fmt::Display for ShiftTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_continuation_marker {
            write!(f, "{}{}", hhmm::format(&self.value), CONTINUATION_MARKER)
        } else {
            f.write_str(&hhmm::format(&self.value))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub date: NaiveDate,
    pub employee: Employee,
    pub start: ShiftTime,
    pub end: ShiftTime,
}

impl Shift {
    pub fn new(date: NaiveDate, employee: impl Into<Employee>, start: ShiftTime, end: ShiftTime) -> Self {
        Self {
            date,
            employee: employee.into(),
            start,
            end,
        }
    }

    /// A full day when both ends are markers, otherwise the clock difference.
    pub fn exact_duration(&self) -> Duration {
        if self.start.has_continuation_marker && self.end.has_continuation_marker {
            Duration::hours(24)
        } else {
            self.end.value - self.start.value
        }
    }

    /// Exact duration rounded to the nearest minute, halves to even.
    pub fn rounded_duration(&self) -> Duration {
        let millis = self.exact_duration().num_milliseconds();
        let (minutes, rest) = (millis.div_euclid(60_000), millis.rem_euclid(60_000));
        let round_up = rest > 30_000 || (rest == 30_000 && minutes % 2 != 0);
        Duration::minutes(if round_up { minutes + 1 } else { minutes })
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}' {}-{}", self.date, self.employee, self.start, self.end)
    }
}

// --- Work Schedule ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScheduleType {
    #[default]
    Unknown,
    Operator,
}

impl ScheduleType {
    /// Whether shifts of this type may run across midnight via markers.
    pub fn supports_continuity(&self) -> bool {
        matches!(self, ScheduleType::Operator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScheduleSource {
    #[default]
    Unknown,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub name: String,
    pub source: ScheduleSource,
    pub read_at: DateTime<Utc>,
}

/// A month of shifts for one company and location, as handed over by a
/// loader. Nothing here has been checked yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub company: Company,
    pub location: Location,
    pub year_month: YearMonth,
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub metadata: ScheduleMetadata,
    #[serde(default)]
    pub rule: Option<ValidationRule>,
}

impl WorkSchedule {
    pub fn new(
        company: impl Into<Company>,
        location: impl Into<Location>,
        year_month: YearMonth,
        schedule_type: ScheduleType,
        shifts: Vec<Shift>,
    ) -> Self {
        Self {
            company: company.into(),
            location: location.into(),
            year_month,
            schedule_type,
            shifts,
            metadata: ScheduleMetadata::default(),
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_metadata(mut self, metadata: ScheduleMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Takes the book's rule for this schedule's type. Types without a rule
    /// leave the schedule without one.
    pub fn with_rule_from(mut self, rule_book: &RuleBook) -> Self {
        self.rule = rule_book.rule_for(self.schedule_type).cloned();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    fn t(hours: i64, minutes: i64) -> ShiftTime {
        ShiftTime::at(hours, minutes).unwrap()
    }

    #[test]
    fn employee_names_ignore_case() {
        assert_eq!(Employee::new("Bob"), Employee::new("BOB"));
        assert_ne!(Employee::new("Bob"), Employee::new("Rob"));

        let mut totals: HashMap<Employee, i32> = HashMap::new();
        *totals.entry(Employee::new("anna")).or_default() += 1;
        *totals.entry(Employee::new("Anna")).or_default() += 1;
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&Employee::new("ANNA")], 2);
    }

    #[test]
    fn exact_duration_uses_full_day_only_for_double_marker() {
        let date = d("2024-03-10");
        let full = Shift::new(date, "Bob", ShiftTime::start_marker(), ShiftTime::end_marker());
        assert_eq!(full.exact_duration(), Duration::hours(24));

        let evening = Shift::new(date, "Bob", t(22, 0), ShiftTime::end_marker());
        assert_eq!(evening.exact_duration(), Duration::hours(2));

        let morning = Shift::new(date, "Bob", ShiftTime::start_marker(), t(6, 0));
        assert_eq!(morning.exact_duration(), Duration::hours(6));

        let backwards = Shift::new(date, "Bob", t(10, 0), t(9, 0));
        assert_eq!(backwards.exact_duration(), -Duration::hours(1));
    }

    fn clock(seconds: i64) -> ShiftTime {
        ShiftTime::new(Duration::seconds(seconds), false).unwrap()
    }

    #[test]
    fn rounded_duration_rounds_half_minutes_to_even() {
        let date = d("2024-03-10");
        let eight = 8 * 3600;

        // 60.5 minutes
        let shift = Shift::new(date, "Bob", clock(eight), clock(eight + 3630));
        assert_eq!(shift.rounded_duration(), Duration::minutes(60));

        // 61.5 minutes
        let shift = Shift::new(date, "Bob", clock(eight), clock(eight + 3690));
        assert_eq!(shift.rounded_duration(), Duration::minutes(62));

        let shift = Shift::new(date, "Bob", clock(eight), clock(eight + 3631));
        assert_eq!(shift.rounded_duration(), Duration::minutes(61));

        let shift = Shift::new(date, "Bob", clock(eight), clock(eight + 3629));
        assert_eq!(shift.rounded_duration(), Duration::minutes(60));

        // -0.5 minutes
        let shift = Shift::new(date, "Bob", clock(eight + 30), clock(eight));
        assert_eq!(shift.rounded_duration(), Duration::zero());

        // -1.5 minutes
        let shift = Shift::new(date, "Bob", clock(eight + 90), clock(eight));
        assert_eq!(shift.rounded_duration(), Duration::minutes(-2));
    }

    #[test]
    fn shift_time_must_lie_within_the_day() {
        assert!(ShiftTime::new(Duration::zero(), false).is_ok());
        assert!(ShiftTime::new(Duration::hours(24), true).is_ok());
        assert_eq!(
            ShiftTime::new(Duration::minutes(-1), false),
            Err(ModelError::ShiftTimeOutOfRange {
                value: "-00:01".to_string()
            })
        );
        assert!(ShiftTime::new(Duration::hours(24) + Duration::seconds(1), false).is_err());
        assert!(ShiftTime::at(25, 0).is_err());
        assert!(ShiftTime::at(i64::MAX, 0).is_err());
    }

    #[test]
    fn schedule_with_shift_time_outside_the_day_is_rejected_on_load() {
        let json = |start: &str, end: &str| {
            format!(
                r#"{{
                    "company": "Acme",
                    "location": "Main Street 1",
                    "year_month": {{ "year": 2024, "month": 3 }},
                    "type": "Operator",
                    "shifts": [
                        {{
                            "date": "2024-03-10",
                            "employee": "Bob",
                            "start": {{ "value": "{}" }},
                            "end": {{ "value": "{}" }}
                        }}
                    ]
                }}"#,
                start, end
            )
        };

        assert!(serde_json::from_str::<WorkSchedule>(&json("-05:00", "30:00")).is_err());
        assert!(serde_json::from_str::<WorkSchedule>(&json("08:00", "30:00")).is_err());
        assert!(serde_json::from_str::<WorkSchedule>(&json("-05:00", "08:00")).is_err());

        let schedule: WorkSchedule = serde_json::from_str(&json("08:00", "16:00")).unwrap();
        assert_eq!(schedule.shifts[0].exact_duration(), Duration::hours(8));
    }

    #[test]
    fn year_month_lists_every_day() {
        let february = YearMonth::new(2024, 2).unwrap();
        assert_eq!(february.first_day(), d("2024-02-01"));
        assert_eq!(february.last_day(), d("2024-02-29"));
        assert_eq!(february.days().count(), 29);

        let december = YearMonth::new(2023, 12).unwrap();
        assert_eq!(december.last_day(), d("2023-12-31"));
        assert_eq!(december.days().last(), Some(d("2023-12-31")));
    }

    #[test]
    fn year_month_rejects_invalid_month() {
        assert_eq!(
            YearMonth::new(2024, 13),
            Err(ModelError::InvalidYearMonth { year: 2024, month: 13 })
        );
        assert!(serde_json::from_str::<YearMonth>(r#"{"year":2024,"month":0}"#).is_err());
    }

    #[test]
    fn schedule_reads_from_json() {
        let json = r#"{
            "company": "Acme",
            "location": "Main Street 1",
            "year_month": { "year": 2024, "month": 3 },
            "type": "Operator",
            "shifts": [
                {
                    "date": "2024-03-10",
                    "employee": "Bob",
                    "start": { "value": "22:00" },
                    "end": { "value": "24:00", "has_continuation_marker": true }
                }
            ]
        }"#;
        let schedule: WorkSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.schedule_type, ScheduleType::Operator);
        assert_eq!(schedule.year_month.last_day(), d("2024-03-31"));
        assert_eq!(schedule.shifts[0].end, ShiftTime::end_marker());
        assert_eq!(schedule.metadata.source, ScheduleSource::Unknown);
        assert!(schedule.rule.is_none());
    }

    #[test]
    fn metadata_records_where_a_schedule_came_from() {
        let read_at = "2024-04-01T07:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let schedule = WorkSchedule::new(
            "Acme",
            "Main Street 1",
            YearMonth::new(2024, 3).unwrap(),
            ScheduleType::Operator,
            Vec::new(),
        )
        .with_metadata(ScheduleMetadata {
            name: "march.json".to_string(),
            source: ScheduleSource::File,
            read_at,
        });

        let json = serde_json::to_string(&schedule).unwrap();
        let reloaded: WorkSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.metadata.name, "march.json");
        assert_eq!(reloaded.metadata.source, ScheduleSource::File);
        assert_eq!(reloaded.metadata.read_at, read_at);
    }
}
