// src/timesheet.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::model::{Company, Employee, Location, ScheduleType, Shift, YearMonth};
use crate::validated::ValidatedSchedule;

/// Standard working time credited for each working day of the month.
pub const WORK_DAY_HOURS: i64 = 8;

// --- Holidays ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Holidays {
    dates: BTreeSet<NaiveDate>,
}

impl Holidays {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

// --- Time Sheets ---

/// One employee's share of a validated roster, ready for payroll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSheet {
    pub employee: Employee,
    pub company: Company,
    pub location: Location,
    pub year_month: YearMonth,
    pub schedule_type: ScheduleType,
    pub shifts: Vec<Shift>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSheetSummary {
    #[serde(with = "crate::hhmm")]
    pub expected_work_time: Duration,
    #[serde(with = "crate::hhmm")]
    pub worked_time: Duration,
    #[serde(with = "crate::hhmm")]
    pub holiday_work_time: Duration,
    #[serde(with = "crate::hhmm")]
    pub overtime: Duration,
}

impl TimeSheet {
    /// Splits a roster into one sheet per employee, in the order employees
    /// first appear. Shifts on each sheet are ordered by date, then time.
    pub fn split(schedule: &ValidatedSchedule) -> Vec<TimeSheet> {
        let mut positions: HashMap<&Employee, usize> = HashMap::new();
        let mut sheets: Vec<TimeSheet> = Vec::new();

        for shift in &schedule.shifts {
            let position = *positions.entry(&shift.employee).or_insert_with(|| {
                sheets.push(TimeSheet {
                    employee: shift.employee.clone(),
                    company: schedule.company.clone(),
                    location: schedule.location.clone(),
                    year_month: schedule.year_month,
                    schedule_type: schedule.schedule_type,
                    shifts: Vec::new(),
                });
                sheets.len() - 1
            });
            sheets[position].shifts.push(shift.clone());
        }

        for sheet in &mut sheets {
            sheet.shifts.sort_by_key(|shift| {
                (shift.date, shift.start.value(), shift.end.value())
            });
        }

        debug!(
            "Split schedule for {} ({}) into {} time sheets",
            schedule.company,
            schedule.year_month,
            sheets.len()
        );
        sheets
    }

    /// Payroll figures for the month. Weekdays that are not holidays count
    /// as working days; shift time is taken at minute precision.
    pub fn summarize(&self, holidays: &Holidays) -> TimeSheetSummary {
        let expected_work_time = self
            .year_month
            .days()
            .filter(|date| !holidays.contains(*date) && !is_weekend(*date))
            .fold(Duration::zero(), |acc, _| acc + Duration::hours(WORK_DAY_HOURS));

        let mut worked_time = Duration::zero();
        let mut holiday_work_time = Duration::zero();
        for shift in &self.shifts {
            let duration = shift.rounded_duration();
            worked_time += duration;
            if holidays.contains(shift.date) {
                holiday_work_time += duration;
            }
        }

        let overtime = if worked_time > expected_work_time {
            worked_time - expected_work_time
        } else {
            Duration::zero()
        };

        TimeSheetSummary {
            expected_work_time,
            worked_time,
            holiday_work_time,
            overtime,
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShiftTime, WorkSchedule};
    use crate::rules::ValidationRule;
    use crate::validation::ScheduleValidator;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    fn t(hours: i64, minutes: i64) -> ShiftTime {
        ShiftTime::at(hours, minutes).unwrap()
    }

    fn validated(shifts: Vec<Shift>) -> ValidatedSchedule {
        // June 2024 starts on a Saturday: 20 weekdays.
        let schedule = WorkSchedule::new(
            "Acme",
            "Main Street 1",
            YearMonth::new(2024, 6).unwrap(),
            ScheduleType::Operator,
            shifts,
        );
        ScheduleValidator::new()
            .validate_with_rule(&schedule, Some(&ValidationRule::permissive()))
            .unwrap()
    }

    #[test]
    fn split_groups_employees_ignoring_case() {
        let schedule = validated(vec![
            Shift::new(d("2024-06-04"), "Anna", t(8, 0), t(16, 0)),
            Shift::new(d("2024-06-03"), "Bob", t(8, 0), t(16, 0)),
            Shift::new(d("2024-06-03"), "ANNA", t(16, 0), t(20, 0)),
        ]);

        let sheets = TimeSheet::split(&schedule);
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].employee.as_str(), "Anna");
        assert_eq!(sheets[0].shifts.len(), 2);
        assert_eq!(sheets[0].shifts[0].date, d("2024-06-03"));
        assert_eq!(sheets[1].employee.as_str(), "Bob");
        assert_eq!(sheets[1].company.as_str(), "Acme");
    }

    #[test]
    fn summary_counts_holidays_and_overtime() {
        let mut shifts = Vec::new();
        for date in YearMonth::new(2024, 6).unwrap().days() {
            shifts.push(Shift::new(date, "Anna", t(8, 0), t(16, 0)));
        }
        let schedule = validated(shifts);
        let holidays = Holidays::new([d("2024-06-03")]);

        let sheets = TimeSheet::split(&schedule);
        let summary = sheets[0].summarize(&holidays);

        assert_eq!(summary.expected_work_time, Duration::hours(19 * 8));
        assert_eq!(summary.worked_time, Duration::hours(30 * 8));
        assert_eq!(summary.holiday_work_time, Duration::hours(8));
        assert_eq!(summary.overtime, Duration::hours(11 * 8));
    }

    #[test]
    fn summary_has_no_overtime_below_expected_time() {
        let schedule = validated(vec![Shift::new(
            d("2024-06-05"),
            "Bob",
            t(22, 0),
            ShiftTime::end_marker(),
        )]);
        let summary = TimeSheet::split(&schedule)[0].summarize(&Holidays::default());

        assert_eq!(summary.expected_work_time, Duration::hours(20 * 8));
        assert_eq!(summary.worked_time, Duration::hours(2));
        assert_eq!(summary.holiday_work_time, Duration::zero());
        assert_eq!(summary.overtime, Duration::zero());
    }
}
