//! Conflict verification for committed schedules.
//!
//! Rebuilds every student's exam calendar from the schedule and the
//! enrollment index alone, without trusting any scheduler state, and
//! checks adjacent exams of each student. Detects:
//! - Two exams on the same date (when `no_same_day` is set)
//! - Two exams in the same slot (when same-day exams are allowed)
//! - Two exams on distinct dates fewer than `min_gap_days` apart
//!
//! The same pass validates greedy output and externally suggested
//! schedules. A non-empty result means the schedule must not be trusted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SchedulingConfig;
use crate::enrollment::EnrollmentIndex;
use crate::models::{Schedule, SlotUnit};

/// One exam in a student's calendar.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentExam {
    pub slot: SlotUnit,
    pub course_code: String,
}

/// Student id → exams sorted by (date, time slot, course code).
pub type StudentCalendars = BTreeMap<String, Vec<StudentExam>>;

/// A residual conflict between two exams of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub kind: ConflictKind,
    pub student_id: String,
    /// Earlier exam.
    pub first: StudentExam,
    /// Later exam.
    pub second: StudentExam,
    /// Calendar days between the two exams.
    pub days_between: i64,
}

/// Categories of student conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Two exams on one date.
    SameDay,
    /// Two exams in one (date, time slot).
    SlotClash,
    /// Two exams closer than the minimum gap.
    InsufficientGap,
}

impl ConflictRecord {
    /// Course codes implicated, earlier exam first.
    pub fn courses(&self) -> [&str; 2] {
        [self.first.course_code.as_str(), self.second.course_code.as_str()]
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameDay => f.write_str("Same Day Conflict"),
            Self::SlotClash => f.write_str("Slot Clash"),
            Self::InsufficientGap => f.write_str("Insufficient Days Conflict"),
        }
    }
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({}) and {} ({}), {} day(s) apart",
            self.kind,
            self.student_id,
            self.first.course_code,
            self.first.slot,
            self.second.course_code,
            self.second.slot,
            self.days_between
        )
    }
}

/// Rebuilds each enrolled student's exam calendar from a schedule.
///
/// Students without any scheduled exam are omitted.
pub fn build_student_calendars(schedule: &Schedule, index: &EnrollmentIndex) -> StudentCalendars {
    let mut calendars: StudentCalendars = BTreeMap::new();
    for assignment in &schedule.assignments {
        let Some(students) = index.students_of(&assignment.course_code) else {
            continue;
        };
        for student_id in students {
            calendars
                .entry(student_id.clone())
                .or_default()
                .push(StudentExam {
                    slot: assignment.slot.clone(),
                    course_code: assignment.course_code.clone(),
                });
        }
    }
    for exams in calendars.values_mut() {
        exams.sort();
    }
    calendars
}

/// Verifies a committed schedule.
///
/// # Returns
/// All conflicts, ordered by student id then date. Empty = clean.
pub fn verify_schedule(
    schedule: &Schedule,
    index: &EnrollmentIndex,
    config: &SchedulingConfig,
) -> Vec<ConflictRecord> {
    let calendars = build_student_calendars(schedule, index);
    let min_gap = i64::from(config.min_gap_days);
    let mut conflicts = Vec::new();

    for (student_id, exams) in &calendars {
        for pair in exams.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let days = first.slot.days_between(&second.slot);
            let kind = if days == 0 {
                if config.no_same_day {
                    Some(ConflictKind::SameDay)
                } else if first.slot == second.slot {
                    Some(ConflictKind::SlotClash)
                } else {
                    None
                }
            } else if days < min_gap {
                Some(ConflictKind::InsufficientGap)
            } else {
                None
            };

            if let Some(kind) = kind {
                conflicts.push(ConflictRecord {
                    kind,
                    student_id: student_id.clone(),
                    first: first.clone(),
                    second: second.clone(),
                    days_between: days,
                });
            }
        }
    }

    info!(
        students = calendars.len(),
        conflicts = conflicts.len(),
        "schedule verification complete"
    );
    conflicts
}
