//! Exam timetabling for a single institution's exam session.
//!
//! Assigns every course exam to a date (and optionally a time slot) inside
//! a configured window so that no student sits two exams on one day, every
//! student gets a minimum number of days between exams, and no date holds
//! more than a fixed number of exams.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Course`, `Student`, `Roster`, `SlotUnit`,
//!   `SlotSpace`, `Schedule`
//! - **`enrollment`**: Student ↔ course index with malformed-record tracking
//! - **`conflict`**: Pairwise shared-student counts and course pressure
//! - **`scheduler`**: Greedy slot assignment and the summary report
//! - **`validation`**: Residual conflict detection on any schedule
//! - **`remote`**: Optional external schedule suggestions and their
//!   acceptance gate
//! - **`pipeline`**: One end-to-end run with remote-then-greedy fallback
//! - **`export`**: Schedule and per-student CSV rows
//! - **`config`**, **`error`**: Run configuration and error types
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use u_exam_schedule::config::SchedulingConfig;
//! use u_exam_schedule::enrollment::EnrollmentIndex;
//! use u_exam_schedule::models::{Course, Roster, Student};
//! use u_exam_schedule::pipeline::ExamTimetabler;
//!
//! let roster = Roster::new(
//!     vec![Course::new("EGCO111", "Programming"), Course::new("EGEL201", "Circuits")],
//!     vec![Student::new("6501").with_courses(["EGCO111", "EGEL201"])],
//! );
//! let config = SchedulingConfig::new(
//!     NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
//!     NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
//! )
//! .with_seed(7);
//!
//! let index = EnrollmentIndex::from_roster(&roster);
//! let outcome = ExamTimetabler::new(config).run(&index).unwrap();
//! assert!(outcome.conflicts.is_empty());
//! assert_eq!(outcome.schedule.assignment_count(), 2);
//! ```
//!
//! # References
//!
//! - Carter, Laporte & Lee (1996), "Examination Timetabling: Algorithmic
//!   Strategies and Applications"
//! - Burke & Petrovic (2002), "Recent research directions in automated
//!   timetabling"

pub mod config;
pub mod conflict;
pub mod enrollment;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod scheduler;
pub mod validation;
