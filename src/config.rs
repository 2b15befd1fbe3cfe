//! Run configuration.
//!
//! A [`SchedulingConfig`] is built once per run and passed by reference to
//! every component. Nothing in the crate reads process-wide settings.
//!
//! # File format
//!
//! ```json
//! {
//!   "window_start": "2025-05-26",
//!   "window_end": "2025-06-13",
//!   "min_gap_days": 1,
//!   "max_exams_per_day": 5,
//!   "skip_weekends": true,
//!   "holidays": ["2025-06-03"],
//!   "department_prefixes": { "EGCO": "CE", "EGEL": "EEE" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ScheduleError};

/// Scheduling constraints and run options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Minimum calendar days between two exams of one student.
    #[serde(default = "default_min_gap_days")]
    pub min_gap_days: u32,
    /// Forbid two exams of one student on the same date.
    #[serde(default = "default_true")]
    pub no_same_day: bool,
    /// Day capacity: distinct courses examined on one date.
    #[serde(default = "default_max_exams_per_day")]
    pub max_exams_per_day: u32,
    /// Exclude Saturdays and Sundays from the window.
    #[serde(default = "default_true")]
    pub skip_weekends: bool,
    /// First date of the window (inclusive).
    pub window_start: NaiveDate,
    /// Last date of the window (inclusive).
    pub window_end: NaiveDate,
    /// Dates excluded from the window.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    /// Ordered time slots within a day. `None` = whole-day slots.
    #[serde(default)]
    pub time_slots: Option<Vec<String>>,
    /// Course-code prefix → department label, used by the report.
    #[serde(default)]
    pub department_prefixes: BTreeMap<String, String>,
    /// Seed for the slot permutation. `None` = seeded from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Remote suggestion service settings.
    #[serde(default)]
    pub remote: Option<RemoteServiceConfig>,
}

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteServiceConfig {
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_min_gap_days() -> u32 {
    1
}

fn default_max_exams_per_day() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_timeout_secs() -> u64 {
    120
}

impl SchedulingConfig {
    /// Creates a config for the given window with default constraints.
    pub fn new(window_start: NaiveDate, window_end: NaiveDate) -> Self {
        Self {
            min_gap_days: default_min_gap_days(),
            no_same_day: true,
            max_exams_per_day: default_max_exams_per_day(),
            skip_weekends: true,
            window_start,
            window_end,
            holidays: Vec::new(),
            time_slots: None,
            department_prefixes: BTreeMap::new(),
            seed: None,
            remote: None,
        }
    }

    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Sets the minimum gap in days.
    pub fn with_min_gap_days(mut self, days: u32) -> Self {
        self.min_gap_days = days;
        self
    }

    /// Sets the same-day rule.
    pub fn with_no_same_day(mut self, no_same_day: bool) -> Self {
        self.no_same_day = no_same_day;
        self
    }

    /// Sets the day capacity.
    pub fn with_max_exams_per_day(mut self, max: u32) -> Self {
        self.max_exams_per_day = max;
        self
    }

    /// Sets weekend exclusion.
    pub fn with_skip_weekends(mut self, skip: bool) -> Self {
        self.skip_weekends = skip;
        self
    }

    /// Adds an excluded date.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.push(date);
        self
    }

    /// Sets the ordered time slots.
    pub fn with_time_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.time_slots = Some(slots.into_iter().map(Into::into).collect());
        self
    }

    /// Maps a course-code prefix to a department label.
    pub fn with_department_prefix(
        mut self,
        prefix: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        self.department_prefixes
            .insert(prefix.into(), department.into());
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the remote service settings.
    pub fn with_remote(mut self, remote: RemoteServiceConfig) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Checks value ranges. Window emptiness is reported by the slot space.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.max_exams_per_day == 0 {
            return Err(ScheduleError::InvalidConfig(
                "max_exams_per_day must be at least 1".into(),
            ));
        }
        if let Some(slots) = &self.time_slots {
            if slots.is_empty() {
                return Err(ScheduleError::InvalidConfig(
                    "time_slots must be omitted or non-empty".into(),
                ));
            }
            if slots.iter().any(|s| s.trim().is_empty()) {
                return Err(ScheduleError::InvalidConfig(
                    "time slot labels must be non-empty".into(),
                ));
            }
        }
        Ok(())
    }
}

impl RemoteServiceConfig {
    /// Creates settings for the given endpoint with default model options.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
