//! Exam scheduling domain models.
//!
//! Provides the data types for one exam session: the course catalog,
//! students and their enrollments, schedulable slots, and the resulting
//! timetable.
//!
//! # Lifecycle
//!
//! | Type | Loaded | Mutated by |
//! |------|--------|-----------|
//! | Course, Student, Enrollment | once per run | nobody |
//! | SlotSpace | once per run | nobody |
//! | Schedule | per run | the scheduler (or a remote suggestion), read-only afterwards |

mod calendar;
mod course;
mod schedule;
mod student;

pub use calendar::{is_weekend, SlotSpace, SlotUnit};
pub use course::{Course, Department, Level};
pub use schedule::{CourseStatus, Schedule, ScheduleAssignment, UnscheduledCourse};
pub use student::{Enrollment, Roster, Student};
