// src/validation.rs
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::cancel::CancellationFlag;
use crate::error::{ShiftSpan, ValidationError};
use crate::model::{Employee, ScheduleType, Shift, WorkSchedule, YearMonth};
use crate::rules::ValidationRule;
use crate::validated::ValidatedSchedule;

// --- Validator ---

/// Checks a roster against a [`ValidationRule`] and stops at the first
/// violation.
///
/// Shifts are visited date by date in ascending order, and within a date by
/// `(start, end)`. All state lives on the stack of a single call, so one
/// validator can serve any number of threads at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleValidator;

impl ScheduleValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates against the rule carried by the schedule itself.
    pub fn validate(&self, schedule: &WorkSchedule) -> Result<ValidatedSchedule, ValidationError> {
        self.validate_with_rule(schedule, schedule.rule.as_ref())
    }

    pub fn validate_with_rule(
        &self,
        schedule: &WorkSchedule,
        rule: Option<&ValidationRule>,
    ) -> Result<ValidatedSchedule, ValidationError> {
        self.validate_cancellable(schedule, rule, &CancellationFlag::new())
    }

    pub fn validate_cancellable(
        &self,
        schedule: &WorkSchedule,
        rule: Option<&ValidationRule>,
        cancel: &CancellationFlag,
    ) -> Result<ValidatedSchedule, ValidationError> {
        let rule = rule.ok_or(ValidationError::MissingPolicy);
        let result = rule.and_then(|rule| {
            debug!(
                "Validating schedule: Company={}, Location={}, Month={}, Shifts={}",
                schedule.company,
                schedule.location,
                schedule.year_month,
                schedule.shifts.len()
            );
            check_schedule(schedule, rule, cancel)?;
            Ok(ValidatedSchedule::new(schedule.clone(), rule))
        });

        match &result {
            Ok(_) => info!(
                "Schedule for {} / {} ({}) is valid",
                schedule.company, schedule.location, schedule.year_month
            ),
            Err(ValidationError::Cancelled) => info!(
                "Validation of schedule for {} / {} ({}) was cancelled",
                schedule.company, schedule.location, schedule.year_month
            ),
            Err(e) => warn!(
                "Schedule for {} / {} ({}) failed validation: {}",
                schedule.company, schedule.location, schedule.year_month, e
            ),
        }
        result
    }
}

// --- Validation Logic ---

struct DateGroup<'a> {
    date: NaiveDate,
    shifts: Vec<&'a Shift>,
}

fn check_schedule(
    schedule: &WorkSchedule,
    rule: &ValidationRule,
    cancel: &CancellationFlag,
) -> Result<(), ValidationError> {
    cancel.check()?;

    let mut required_dates: BTreeSet<NaiveDate> = schedule.year_month.days().collect();

    let mut groups: BTreeMap<NaiveDate, Vec<&Shift>> = BTreeMap::new();
    for shift in &schedule.shifts {
        groups.entry(shift.date).or_default().push(shift);
    }

    let mut previous_group: Option<DateGroup<'_>> = None;

    for (date, mut shifts) in groups {
        cancel.check()?;
        debug!("Validating {} shifts on {}", shifts.len(), date);

        ensure_date_in_month(schedule.year_month, date)?;
        required_dates.remove(&date);

        // Stable, so equal times keep roster order.
        shifts.sort_by_key(|shift| (shift.start.value(), shift.end.value()));

        let mut previous_shift: Option<&Shift> = None;
        let mut totals = DailyTotals::default();

        for shift in shifts.iter().copied() {
            cancel.check()?;

            ensure_positive_duration(shift)?;

            if rule.validate_shift_continuity {
                if let Some(previous_group) = &previous_group {
                    check_continuity(schedule.schedule_type, previous_group, shift)?;
                }
            }

            if let Some(previous) = previous_shift {
                if !rule.allow_gap_between_shifts {
                    check_gap(date, previous, shift)?;
                }
                if !rule.allow_overlap_between_shifts {
                    check_overlap(date, previous, shift)?;
                }
            }

            totals.add(&shift.employee, shift.exact_duration());
            previous_shift = Some(shift);
        }

        check_daily_totals(rule, date, &totals)?;

        previous_group = Some(DateGroup { date, shifts });
    }

    if rule.require_shifts_every_day && !required_dates.is_empty() {
        return Err(ValidationError::MissingRequiredDays {
            dates: required_dates.into_iter().collect(),
        });
    }

    Ok(())
}

fn ensure_date_in_month(year_month: YearMonth, date: NaiveDate) -> Result<(), ValidationError> {
    if date.year() != year_month.year() {
        return Err(ValidationError::ShiftYearMismatch {
            expected_year: year_month.year(),
            actual_year: date.year(),
            date,
        });
    }
    if date.month() != year_month.month() {
        return Err(ValidationError::ShiftMonthMismatch {
            expected_year: year_month.year(),
            expected_month: year_month.month(),
            date,
        });
    }
    Ok(())
}

fn ensure_positive_duration(shift: &Shift) -> Result<(), ValidationError> {
    if shift.exact_duration() <= Duration::zero() {
        return Err(ValidationError::NonPositiveDuration {
            shift: Box::new(shift.clone()),
        });
    }
    Ok(())
}

/// A shift starting on a marker must continue exactly one shift of the same
/// employee that ended on a marker in the previous group.
fn check_continuity(
    schedule_type: ScheduleType,
    previous_group: &DateGroup<'_>,
    shift: &Shift,
) -> Result<(), ValidationError> {
    if !shift.start.has_continuation_marker() {
        return Ok(());
    }

    if !schedule_type.supports_continuity() {
        return Err(ValidationError::ContinuityUnsupportedForType {
            shift: Box::new(shift.clone()),
        });
    }

    let continued = previous_group
        .shifts
        .iter()
        .filter(|candidate| {
            candidate.date == previous_group.date
                && candidate.end.has_continuation_marker()
                && candidate.employee == shift.employee
        })
        .count();

    match continued {
        1 => Ok(()),
        0 => Err(ValidationError::MissingEndContinuationMarker {
            employee: shift.employee.clone(),
            previous_date: previous_group.date,
            date: shift.date,
        }),
        _ => Err(ValidationError::DuplicateEndContinuationMarker {
            employee: shift.employee.clone(),
            previous_date: previous_group.date,
            date: shift.date,
        }),
    }
}

fn check_gap(date: NaiveDate, previous: &Shift, shift: &Shift) -> Result<(), ValidationError> {
    let gap = shift.start.value() - previous.end.value();
    if gap != Duration::zero() {
        return Err(ValidationError::ShiftGapDetected {
            date,
            previous: ShiftSpan::from(previous),
            current: ShiftSpan::from(shift),
            gap,
        });
    }
    Ok(())
}

fn check_overlap(date: NaiveDate, previous: &Shift, shift: &Shift) -> Result<(), ValidationError> {
    if previous.end.value() > shift.start.value() {
        return Err(ValidationError::ShiftOverlapDetected {
            date,
            previous: ShiftSpan::from(previous),
            current: ShiftSpan::from(shift),
        });
    }
    Ok(())
}

// --- Daily Totals ---

/// Per-employee time for one date, in the order employees first appear.
#[derive(Default)]
struct DailyTotals<'a> {
    index: HashMap<&'a Employee, usize>,
    totals: Vec<(&'a Employee, Duration)>,
}

impl<'a> DailyTotals<'a> {
    fn add(&mut self, employee: &'a Employee, duration: Duration) {
        match self.index.get(employee) {
            Some(&position) => self.totals[position].1 += duration,
            None => {
                self.index.insert(employee, self.totals.len());
                self.totals.push((employee, duration));
            }
        }
    }
}

fn check_daily_totals(
    rule: &ValidationRule,
    date: NaiveDate,
    totals: &DailyTotals<'_>,
) -> Result<(), ValidationError> {
    let mut combined = Duration::zero();

    for (employee, total) in &totals.totals {
        if let Some(limit) = rule.max_shift_duration_employee_per_day {
            if *total > limit {
                return Err(ValidationError::EmployeeDailyDurationExceeded {
                    employee: (*employee).clone(),
                    total: *total,
                    limit,
                    date,
                });
            }
        }
        combined += *total;
    }

    if let Some(limit) = rule.max_shift_duration_combined_per_day {
        if combined > limit {
            return Err(ValidationError::CombinedDailyDurationExceeded {
                combined,
                limit,
                date,
            });
        }
    }

    Ok(())
}
