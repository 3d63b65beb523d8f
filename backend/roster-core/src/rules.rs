// src/rules.rs
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::model::ScheduleType;

// --- Validation Rule ---

/// Switches and ceilings applied to one roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub require_shifts_every_day: bool,
    pub validate_shift_continuity: bool,
    pub allow_gap_between_shifts: bool,
    pub allow_overlap_between_shifts: bool,
    #[serde(default, with = "crate::hhmm::option")]
    pub max_shift_duration_employee_per_day: Option<Duration>,
    #[serde(default, with = "crate::hhmm::option")]
    pub max_shift_duration_combined_per_day: Option<Duration>,
}

impl ValidationRule {
    /// Round-the-clock coverage: every day staffed, no gaps or overlaps, no
    /// more than 24 hours per employee or in total on any date.
    pub fn operator_default() -> Self {
        Self {
            require_shifts_every_day: true,
            validate_shift_continuity: true,
            allow_gap_between_shifts: false,
            allow_overlap_between_shifts: false,
            max_shift_duration_employee_per_day: Some(Duration::hours(24)),
            max_shift_duration_combined_per_day: Some(Duration::hours(24)),
        }
    }

    /// Nothing enforced.
    pub fn permissive() -> Self {
        Self {
            require_shifts_every_day: false,
            validate_shift_continuity: false,
            allow_gap_between_shifts: true,
            allow_overlap_between_shifts: true,
            max_shift_duration_employee_per_day: None,
            max_shift_duration_combined_per_day: None,
        }
    }
}

// --- Rule Book ---

#[derive(Debug, Default, Serialize, Deserialize)]
struct RuleBookFile {
    #[serde(default)]
    rules: HashMap<ScheduleType, ValidationRule>,
}

/// Rule per schedule type. Overrides loaded from JSON are laid over the
/// built-in defaults, so a file only needs to mention the types it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBook {
    rules: HashMap<ScheduleType, ValidationRule>,
}

impl Default for RuleBook {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert(ScheduleType::Operator, ValidationRule::operator_default());
        Self { rules }
    }
}

impl RuleBook {
    pub fn rule_for(&self, schedule_type: ScheduleType) -> Option<&ValidationRule> {
        self.rules.get(&schedule_type)
    }

    pub fn set_rule(&mut self, schedule_type: ScheduleType, rule: ValidationRule) {
        self.rules.insert(schedule_type, rule);
    }

    /// Rules sorted by type, for display and serialization.
    pub fn rules(&self) -> Vec<(ScheduleType, &ValidationRule)> {
        let mut rules: Vec<_> = self.rules.iter().map(|(t, r)| (*t, r)).collect();
        rules.sort_by_key(|(schedule_type, _)| *schedule_type as u8);
        rules
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: RuleBookFile = serde_json::from_str(json)?;
        let mut book = RuleBook::default();
        for (schedule_type, rule) in file.rules {
            debug!("Overriding validation rule for {:?}: {:?}", schedule_type, rule);
            book.set_rule(schedule_type, rule);
        }
        Ok(book)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading validation rules from {}", path.display());
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        let file = RuleBookFile {
            rules: self.rules.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}
