// src/validated.rs
use std::ops::Deref;

use crate::model::WorkSchedule;
use crate::rules::ValidationRule;

/// A roster that passed validation. Only the validator hands these out, so
/// holding one is proof the roster was checked against `rule()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSchedule {
    schedule: WorkSchedule,
    rule: ValidationRule,
}

impl ValidatedSchedule {
    pub(crate) fn new(mut schedule: WorkSchedule, rule: &ValidationRule) -> Self {
        schedule.rule = Some(rule.clone());
        Self {
            schedule,
            rule: rule.clone(),
        }
    }

    pub fn schedule(&self) -> &WorkSchedule {
        &self.schedule
    }

    /// The rule the roster was checked against.
    pub fn rule(&self) -> &ValidationRule {
        &self.rule
    }

    pub fn into_inner(self) -> WorkSchedule {
        self.schedule
    }
}

impl Deref for ValidatedSchedule {
    type Target = WorkSchedule;

    fn deref(&self) -> &Self::Target {
        &self.schedule
    }
}
