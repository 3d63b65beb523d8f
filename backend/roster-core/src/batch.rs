// src/batch.rs
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info};

use crate::cancel::CancellationFlag;
use crate::error::ValidationError;
use crate::model::WorkSchedule;
use crate::validated::ValidatedSchedule;
use crate::validation::ScheduleValidator;

pub type ScheduleResult = Result<ValidatedSchedule, ValidationError>;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Validation task for schedule #{index} did not complete: {source}")]
    Join {
        index: usize,
        #[source]
        source: JoinError,
    },
}

/// Validates every schedule on the blocking pool, each against its own rule.
/// Results come back in input order; a cancelled flag turns the remaining
/// work into [`ValidationError::Cancelled`].
pub async fn validate_batch(
    validator: ScheduleValidator,
    schedules: Vec<WorkSchedule>,
    cancel: CancellationFlag,
) -> Result<Vec<ScheduleResult>, BatchError> {
    info!("Validating batch of {} schedules", schedules.len());

    let handles: Vec<_> = schedules
        .into_iter()
        .map(|schedule| {
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || {
                validator.validate_cancellable(&schedule, schedule.rule.as_ref(), &cancel)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let result = handle.await.map_err(|source| {
            error!("Validation task #{} failed to join: {}", index, source);
            BatchError::Join { index, source }
        })?;
        results.push(result);
    }

    let valid = results.iter().filter(|result| result.is_ok()).count();
    info!(
        "Batch finished: {} of {} schedules valid",
        valid,
        results.len()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{ScheduleType, Shift, ShiftTime, YearMonth};
    use crate::rules::ValidationRule;
    use chrono::NaiveDate;

    fn schedule(month: u32, shifts: Vec<Shift>) -> WorkSchedule {
        WorkSchedule::new(
            "Acme",
            "Main Street 1",
            YearMonth::new(2024, month).unwrap(),
            ScheduleType::Operator,
            shifts,
        )
        .with_rule(ValidationRule::operator_default())
    }

    fn full_month(month: u32) -> WorkSchedule {
        let year_month = YearMonth::new(2024, month).unwrap();
        let shifts = year_month
            .days()
            .map(|date| Shift::new(date, "Anna", ShiftTime::start_marker(), ShiftTime::end_marker()))
            .collect();
        schedule(month, shifts)
    }

    #[tokio::test]
    async fn results_keep_input_order() {
        let broken = schedule(
            5,
            vec![Shift::new(
                NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                "Anna",
                ShiftTime::at(8, 0).unwrap(),
                ShiftTime::at(16, 0).unwrap(),
            )],
        );
        let schedules = vec![full_month(3), broken, full_month(7)];

        let results = validate_batch(ScheduleValidator::new(), schedules, CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().year_month.month(), 3);
        assert_eq!(
            results[1].as_ref().unwrap_err().kind(),
            ErrorKind::MissingRequiredDays
        );
        assert_eq!(results[2].as_ref().unwrap().year_month.month(), 7);
    }

    #[tokio::test]
    async fn cancelled_batch_reports_cancelled() {
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let results = validate_batch(
            ScheduleValidator::new(),
            vec![full_month(1), full_month(2)],
            cancel,
        )
        .await
        .unwrap();

        assert!(results
            .iter()
            .all(|result| matches!(result, Err(ValidationError::Cancelled))));
    }
}
