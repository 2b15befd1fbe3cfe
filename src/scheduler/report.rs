//! Schedule summary report.
//!
//! Aggregates a committed schedule and its verified conflicts into the
//! figures a registrar reads after a run.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Days spanned | Last exam date - first exam date + 1 |
//! | Days used | Distinct exam dates |
//! | Average gap | Mean of adjacent exam gaps over all students |
//! | Busiest day | Date with most exams (earliest on ties) |
//! | Department breakdown | Exams and conflicts per course-code prefix |
//!
//! Empty input yields zeros and `N/A`, never an error.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::enrollment::EnrollmentIndex;
use crate::models::Schedule;
use crate::validation::{build_student_calendars, ConflictKind, ConflictRecord};

/// Department label for codes matching no prefix.
const OTHER_DEPARTMENT: &str = "Other";

/// Course-code prefix → department label.
///
/// The longest matching prefix wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentMap {
    prefixes: BTreeMap<String, String>,
}

/// Exam and conflict counts for one department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentStats {
    pub exams: usize,
    pub conflicts: usize,
}

/// The date with the most exams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusiestDay {
    pub date: NaiveDate,
    pub exam_count: usize,
    /// Distinct students sitting an exam that date.
    pub student_count: usize,
}

/// Summary of one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    /// Students with at least one enrollment.
    pub total_students: usize,
    /// Catalog courses.
    pub total_courses: usize,
    pub scheduled_count: usize,
    pub unscheduled_count: usize,
    pub days_spanned: i64,
    pub days_used: usize,
    /// `None` when no student has two exams.
    pub average_gap_days: Option<f64>,
    pub busiest_day: Option<BusiestDay>,
    pub conflict_count: usize,
    pub students_with_conflicts: usize,
    pub same_day_students: usize,
    /// Students with a conflict one day apart.
    pub back_to_back_students: usize,
    pub departments: BTreeMap<String, DepartmentStats>,
    /// Non-fatal problems collected during the run.
    pub issues: Vec<String>,
}

impl DepartmentMap {
    /// Creates an empty map (every course maps to "Other").
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map from prefix → department pairs.
    pub fn from_prefixes(prefixes: &BTreeMap<String, String>) -> Self {
        Self {
            prefixes: prefixes.clone(),
        }
    }

    /// Adds a prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>, department: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), department.into());
        self
    }

    /// Department label for a course code.
    pub fn department_of(&self, course_code: &str) -> &str {
        self.prefixes
            .iter()
            .filter(|(prefix, _)| course_code.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, dept)| dept.as_str())
            .unwrap_or(OTHER_DEPARTMENT)
    }
}

impl ScheduleReport {
    /// Builds the report.
    ///
    /// # Arguments
    /// * `schedule` - The committed schedule.
    /// * `index` - Enrollments the schedule was built from.
    /// * `conflicts` - Output of [`verify_schedule`](crate::validation::verify_schedule).
    /// * `departments` - Prefix mapping for the department breakdown.
    pub fn calculate(
        schedule: &Schedule,
        index: &EnrollmentIndex,
        conflicts: &[ConflictRecord],
        departments: &DepartmentMap,
    ) -> Self {
        // Temporal spread
        let calendars = build_student_calendars(schedule, index);
        let mut total_gap: i64 = 0;
        let mut gap_count: usize = 0;
        for exams in calendars.values() {
            for pair in exams.windows(2) {
                total_gap += pair[0].slot.days_between(&pair[1].slot);
                gap_count += 1;
            }
        }
        let average_gap_days = if gap_count == 0 {
            None
        } else {
            Some(total_gap as f64 / gap_count as f64)
        };

        // Busiest day
        let day_loads = schedule.day_loads();
        let busiest_day = day_loads
            .iter()
            .max_by(|(da, a), (db, b)| a.cmp(b).then_with(|| db.cmp(da)))
            .map(|(&date, &exam_count)| {
                let students: BTreeSet<&str> = schedule
                    .assignments
                    .iter()
                    .filter(|a| a.date() == date)
                    .filter_map(|a| index.students_of(&a.course_code))
                    .flatten()
                    .map(String::as_str)
                    .collect();
                BusiestDay {
                    date,
                    exam_count,
                    student_count: students.len(),
                }
            });

        // Conflicts
        let mut conflicted = BTreeSet::new();
        let mut same_day = BTreeSet::new();
        let mut back_to_back = BTreeSet::new();
        for c in conflicts {
            conflicted.insert(c.student_id.as_str());
            match c.kind {
                ConflictKind::SameDay | ConflictKind::SlotClash => {
                    same_day.insert(c.student_id.as_str());
                }
                ConflictKind::InsufficientGap if c.days_between == 1 => {
                    back_to_back.insert(c.student_id.as_str());
                }
                ConflictKind::InsufficientGap => {}
            }
        }

        // Department breakdown
        let mut breakdown: BTreeMap<String, DepartmentStats> = BTreeMap::new();
        for a in &schedule.assignments {
            breakdown
                .entry(departments.department_of(&a.course_code).to_string())
                .or_default()
                .exams += 1;
        }
        for c in conflicts {
            breakdown
                .entry(departments.department_of(&c.first.course_code).to_string())
                .or_default()
                .conflicts += 1;
        }

        let issues = schedule
            .unscheduled
            .iter()
            .map(|u| format!("Course {} could not be scheduled: {}", u.course_code, u.reason))
            .collect();

        Self {
            total_students: index.student_count(),
            total_courses: index.course_count(),
            scheduled_count: schedule.assignment_count(),
            unscheduled_count: schedule.unscheduled_count(),
            days_spanned: schedule.days_spanned(),
            days_used: day_loads.len(),
            average_gap_days,
            busiest_day,
            conflict_count: conflicts.len(),
            students_with_conflicts: conflicted.len(),
            same_day_students: same_day.len(),
            back_to_back_students: back_to_back.len(),
            departments: breakdown,
            issues,
        }
    }

    /// Appends a non-fatal issue.
    pub fn push_issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    /// Whether every course was placed without residual conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflict_count == 0 && self.unscheduled_count == 0
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exam Schedule Summary Report")?;
        writeln!(f, "=============================")?;
        writeln!(f)?;
        writeln!(f, "- Total students processed: {}", self.total_students)?;
        writeln!(f, "- Total courses: {}", self.total_courses)?;
        writeln!(f, "- Total exams scheduled: {}", self.scheduled_count)?;
        writeln!(f, "- Courses not scheduled: {}", self.unscheduled_count)?;
        writeln!(f, "- Days spanned: {} ({} exam days)", self.days_spanned, self.days_used)?;
        writeln!(f, "- Conflict Analysis:")?;
        writeln!(f, "  - Students with detected conflicts: {}", self.students_with_conflicts)?;
        writeln!(f, "  - Same-day conflicts: {}", self.same_day_students)?;
        writeln!(f, "  - Back-to-back conflicts (1 day gap): {}", self.back_to_back_students)?;
        writeln!(f, "- Temporal Spread:")?;
        match self.average_gap_days {
            Some(gap) => writeln!(f, "  - Avg. gap between student exams: {gap:.2} days")?,
            None => writeln!(f, "  - Avg. gap between student exams: N/A")?,
        }
        match &self.busiest_day {
            Some(day) => writeln!(
                f,
                "  - Busiest day: {} ({} exams, {} students)",
                day.date.format("%Y-%m-%d"),
                day.exam_count,
                day.student_count
            )?,
            None => writeln!(f, "  - Busiest day: N/A")?,
        }
        writeln!(f, "- Department Breakdown (by course prefix):")?;
        for (dept, stats) in &self.departments {
            writeln!(f, "  - {dept}: {} exams, {} conflicts", stats.exams, stats.conflicts)?;
        }
        if self.conflict_count == 0 {
            writeln!(f, "- Policy Adherence: Yes (no conflicts found)")?;
        } else {
            writeln!(f, "- Policy Adherence: No ({} conflicts)", self.conflict_count)?;
        }
        if !self.issues.is_empty() {
            writeln!(f, "- Issues:")?;
            for issue in &self.issues {
                writeln!(f, "  - {issue}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Roster, ScheduleAssignment, SlotUnit, Student, UnscheduledCourse};
    use crate::validation::StudentExam;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn sample_index() -> EnrollmentIndex {
        EnrollmentIndex::from_roster(&Roster::new(
            vec![
                Course::new("EGCO111", "Programming"),
                Course::new("EGEL201", "Circuits"),
                Course::new("MATH101", "Calculus"),
            ],
            vec![
                Student::new("S1").with_courses(["EGCO111", "EGEL201"]),
                Student::new("S2").with_courses(["EGCO111", "MATH101"]),
                Student::new("S3").with_courses(["EGEL201"]),
            ],
        ))
    }

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(ScheduleAssignment::new("EGCO111", SlotUnit::whole_day(d(2))));
        s.add_assignment(ScheduleAssignment::new("EGEL201", SlotUnit::whole_day(d(4))));
        s.add_assignment(ScheduleAssignment::new("MATH101", SlotUnit::whole_day(d(4))));
        s
    }

    fn departments() -> DepartmentMap {
        DepartmentMap::new()
            .with_prefix("EGCO", "CE")
            .with_prefix("EGEL", "EEE")
    }

    #[test]
    fn test_report_basic() {
        let report =
            ScheduleReport::calculate(&sample_schedule(), &sample_index(), &[], &departments());
        assert_eq!(report.total_students, 3);
        assert_eq!(report.total_courses, 3);
        assert_eq!(report.scheduled_count, 3);
        assert_eq!(report.unscheduled_count, 0);
        assert_eq!(report.days_spanned, 3);
        assert_eq!(report.days_used, 2);
        // S1: 2 days, S2: 2 days
        assert!((report.average_gap_days.unwrap() - 2.0).abs() < 1e-10);
        assert!(report.is_clean());
    }

    #[test]
    fn test_busiest_day() {
        let report =
            ScheduleReport::calculate(&sample_schedule(), &sample_index(), &[], &departments());
        let busiest = report.busiest_day.unwrap();
        assert_eq!(busiest.date, d(4));
        assert_eq!(busiest.exam_count, 2);
        // EGEL201: S1, S3; MATH101: S2
        assert_eq!(busiest.student_count, 3);
    }

    #[test]
    fn test_busiest_day_tie_takes_earliest() {
        let mut s = Schedule::new();
        s.add_assignment(ScheduleAssignment::new("EGEL201", SlotUnit::whole_day(d(5))));
        s.add_assignment(ScheduleAssignment::new("EGCO111", SlotUnit::whole_day(d(3))));
        let report = ScheduleReport::calculate(&s, &sample_index(), &[], &departments());
        assert_eq!(report.busiest_day.unwrap().date, d(3));
    }

    #[test]
    fn test_department_breakdown() {
        let conflict = ConflictRecord {
            kind: ConflictKind::InsufficientGap,
            student_id: "S1".into(),
            first: StudentExam {
                slot: SlotUnit::whole_day(d(2)),
                course_code: "EGCO111".into(),
            },
            second: StudentExam {
                slot: SlotUnit::whole_day(d(3)),
                course_code: "EGEL201".into(),
            },
            days_between: 1,
        };
        let report = ScheduleReport::calculate(
            &sample_schedule(),
            &sample_index(),
            &[conflict],
            &departments(),
        );
        assert_eq!(report.departments["CE"], DepartmentStats { exams: 1, conflicts: 1 });
        assert_eq!(report.departments["EEE"], DepartmentStats { exams: 1, conflicts: 0 });
        assert_eq!(report.departments["Other"].exams, 1);
        assert_eq!(report.students_with_conflicts, 1);
        assert_eq!(report.back_to_back_students, 1);
        assert_eq!(report.same_day_students, 0);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let map = DepartmentMap::new().with_prefix("EG", "ENG").with_prefix("EGCO", "CE");
        assert_eq!(map.department_of("EGCO111"), "CE");
        assert_eq!(map.department_of("EGXX1"), "ENG");
        assert_eq!(map.department_of("MATH101"), "Other");
    }

    #[test]
    fn test_unscheduled_become_issues() {
        let mut s = sample_schedule();
        s.add_unscheduled(UnscheduledCourse::new("PHYS100", "no conflict-free slot found in window"));
        let mut report = ScheduleReport::calculate(&s, &sample_index(), &[], &departments());
        report.push_issue("1 enrollment record dropped");
        assert_eq!(report.unscheduled_count, 1);
        assert_eq!(
            report.issues[0],
            "Course PHYS100 could not be scheduled: no conflict-free slot found in window"
        );
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_report_empty() {
        let report = ScheduleReport::calculate(
            &Schedule::new(),
            &EnrollmentIndex::default(),
            &[],
            &DepartmentMap::new(),
        );
        assert_eq!(report.scheduled_count, 0);
        assert_eq!(report.days_spanned, 0);
        assert!(report.average_gap_days.is_none());
        assert!(report.busiest_day.is_none());
        let text = report.to_string();
        assert!(text.contains("Avg. gap between student exams: N/A"));
        assert!(text.contains("Busiest day: N/A"));
    }

    #[test]
    fn test_report_text() {
        let report =
            ScheduleReport::calculate(&sample_schedule(), &sample_index(), &[], &departments());
        let text = report.to_string();
        assert!(text.contains("- Total exams scheduled: 3"));
        assert!(text.contains("Avg. gap between student exams: 2.00 days"));
        assert!(text.contains("Busiest day: 2025-06-04 (2 exams, 3 students)"));
        assert!(text.contains("  - CE: 1 exams, 0 conflicts"));
    }
}
