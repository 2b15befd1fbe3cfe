//! Error types.
//!
//! Only configuration-level impossibilities are fatal ([`ScheduleError`]).
//! Per-course and per-student anomalies are carried as data on the
//! [`Schedule`](crate::models::Schedule) and the
//! [`EnrollmentIndex`](crate::enrollment::EnrollmentIndex) instead.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Fatal errors that abort a run before scheduling starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The configured window yields no schedulable slot.
    #[error("no schedulable slots between {start} and {end}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
    /// The course catalog is empty.
    #[error("no courses to schedule")]
    NoCourses,
    /// No student has a valid enrollment.
    #[error("no students enrolled")]
    NoStudents,
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the remote suggestion service.
///
/// Never fatal: every variant triggers the fallback to the greedy scheduler.
#[derive(Debug, Error)]
pub enum RemoteServiceError {
    #[error("remote suggestion service is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service responded with status {0}")]
    Status(u16),
    #[error("response is not a valid schedule: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("service returned no content")]
    EmptyResponse,
    #[error("suggested schedule rejected: {reason}")]
    Rejected { reason: String },
}

/// Failures writing export artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
