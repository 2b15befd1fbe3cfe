//! Exam schedule (solution) model.
//!
//! A schedule holds one assignment per scheduled course and one record per
//! course that could not be placed. A course never appears in both lists.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use super::SlotUnit;

/// A committed exam timetable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Scheduled courses, in commit order.
    pub assignments: Vec<ScheduleAssignment>,
    /// Courses left without a slot.
    pub unscheduled: Vec<UnscheduledCourse>,
    #[serde(skip)]
    by_course: HashMap<String, usize>,
}

/// A course placed in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub course_code: String,
    pub slot: SlotUnit,
}

/// A course that could not be placed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledCourse {
    pub course_code: String,
    pub reason: String,
}

/// Per-course scheduling state.
///
/// `Pending` only exists while the scheduler is running; both other
/// states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseStatus {
    Pending,
    Scheduled,
    Unscheduled,
}

impl ScheduleAssignment {
    pub fn new(course_code: impl Into<String>, slot: SlotUnit) -> Self {
        Self {
            course_code: course_code.into(),
            slot,
        }
    }

    /// Exam date.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.slot.date
    }
}

impl UnscheduledCourse {
    pub fn new(course_code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            course_code: course_code.into(),
            reason: reason.into(),
        }
    }
}

impl PartialEq for Schedule {
    fn eq(&self, other: &Self) -> bool {
        self.assignments == other.assignments && self.unscheduled == other.unscheduled
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scheduled course.
    ///
    /// A second assignment for the same course replaces the index entry but
    /// both stay in `assignments`, so verification still sees them.
    pub fn add_assignment(&mut self, assignment: ScheduleAssignment) {
        self.by_course
            .insert(assignment.course_code.clone(), self.assignments.len());
        self.assignments.push(assignment);
    }

    /// Records an unscheduled course.
    pub fn add_unscheduled(&mut self, course: UnscheduledCourse) {
        self.unscheduled.push(course);
    }

    /// Slot of a scheduled course.
    pub fn slot_for(&self, course_code: &str) -> Option<&SlotUnit> {
        let indexed = self
            .by_course
            .get(course_code)
            .and_then(|&idx| self.assignments.get(idx))
            .filter(|a| a.course_code == course_code);
        indexed
            .or_else(|| {
                self.assignments
                    .iter()
                    .rev()
                    .find(|a| a.course_code == course_code)
            })
            .map(|a| &a.slot)
    }

    /// Terminal state of a course. Unknown courses are `Pending`.
    pub fn status(&self, course_code: &str) -> CourseStatus {
        if self.slot_for(course_code).is_some() {
            CourseStatus::Scheduled
        } else if self.unscheduled.iter().any(|u| u.course_code == course_code) {
            CourseStatus::Unscheduled
        } else {
            CourseStatus::Pending
        }
    }

    /// Number of exams per date.
    pub fn day_loads(&self) -> BTreeMap<NaiveDate, usize> {
        let mut loads = BTreeMap::new();
        for a in &self.assignments {
            *loads.entry(a.date()).or_insert(0) += 1;
        }
        loads
    }

    /// Earliest and latest exam date.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.assignments.iter().map(|a| a.date()).min()?;
        let last = self.assignments.iter().map(|a| a.date()).max()?;
        Some((first, last))
    }

    /// Calendar days from first to last exam, inclusive. 0 when empty.
    pub fn days_spanned(&self) -> i64 {
        self.date_range()
            .map(|(first, last)| (last - first).num_days() + 1)
            .unwrap_or(0)
    }

    /// Number of scheduled courses.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Number of unscheduled courses.
    pub fn unscheduled_count(&self) -> usize {
        self.unscheduled.len()
    }
}
