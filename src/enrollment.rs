//! Enrollment index.
//!
//! Builds the two lookups every later stage works from:
//! student → enrolled course codes and course → enrolled student ids.
//!
//! Duplicate `(student, course)` pairs collapse. Records with a blank
//! student id or course code are dropped and kept as
//! [`MalformedEnrollment`] warnings; they never abort the run.
//!
//! All maps are ordered, so iteration (and therefore a seeded scheduling
//! run) is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::models::{Course, Enrollment, Roster, Student};

/// Name used for enrolled course codes that are missing from the catalog.
pub const UNKNOWN_COURSE_NAME: &str = "Unknown Course";

/// A dropped enrollment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEnrollment {
    pub student_id: String,
    pub course_code: String,
    pub reason: String,
}

/// Bidirectional student ↔ course lookup.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentIndex {
    courses: BTreeMap<String, Course>,
    students: BTreeMap<String, Student>,
    student_courses: BTreeMap<String, BTreeSet<String>>,
    course_students: BTreeMap<String, BTreeSet<String>>,
    dropped: Vec<MalformedEnrollment>,
}

impl EnrollmentIndex {
    /// Indexes a roster.
    pub fn from_roster(roster: &Roster) -> Self {
        Self::build(&roster.courses, &roster.students, roster.enrollments())
    }

    /// Indexes a course catalog, student metadata, and raw enrollment records.
    ///
    /// Enrollments may reference students or courses absent from the
    /// metadata; those are added with default metadata (courses get the
    /// name [`UNKNOWN_COURSE_NAME`]).
    pub fn build<I>(courses: &[Course], students: &[Student], enrollments: I) -> Self
    where
        I: IntoIterator<Item = Enrollment>,
    {
        let mut index = Self::default();

        for course in courses {
            let code = course.code.trim();
            if code.is_empty() {
                warn!(name = %course.name, "dropping catalog course with empty code");
                continue;
            }
            if index.courses.contains_key(code) {
                warn!(code, "duplicate course code in catalog, keeping first");
                continue;
            }
            let mut course = course.clone();
            course.code = code.to_string();
            index.courses.insert(course.code.clone(), course);
        }

        for student in students {
            let id = student.id.trim();
            if id.is_empty() {
                continue;
            }
            if index.students.contains_key(id) {
                warn!(student_id = id, "duplicate student id, keeping first");
                continue;
            }
            let mut student = student.clone();
            student.id = id.to_string();
            index.students.insert(student.id.clone(), student);
        }

        for record in enrollments {
            index.insert(record);
        }

        info!(
            courses = index.courses.len(),
            students = index.student_courses.len(),
            enrollments = index.enrollment_count(),
            dropped = index.dropped.len(),
            "enrollment index built"
        );
        index
    }

    fn insert(&mut self, record: Enrollment) {
        let student_id = record.student_id.trim();
        let course_code = record.course_code.trim();

        let reason = match (student_id.is_empty(), course_code.is_empty()) {
            (true, true) => Some("empty student id and course code"),
            (true, false) => Some("empty student id"),
            (false, true) => Some("empty course code"),
            (false, false) => None,
        };
        if let Some(reason) = reason {
            warn!(
                student_id = %record.student_id,
                course_code = %record.course_code,
                reason,
                "dropping malformed enrollment"
            );
            self.dropped.push(MalformedEnrollment {
                student_id: record.student_id,
                course_code: record.course_code,
                reason: reason.to_string(),
            });
            return;
        }

        if !self.courses.contains_key(course_code) {
            debug!(course_code, "enrolled course missing from catalog");
            self.courses.insert(
                course_code.to_string(),
                Course::new(course_code, UNKNOWN_COURSE_NAME),
            );
        }
        self.students
            .entry(student_id.to_string())
            .or_insert_with(|| Student::new(student_id));

        self.student_courses
            .entry(student_id.to_string())
            .or_default()
            .insert(course_code.to_string());
        self.course_students
            .entry(course_code.to_string())
            .or_default()
            .insert(student_id.to_string());
    }

    /// All catalog course codes, ascending.
    pub fn course_codes(&self) -> impl Iterator<Item = &str> {
        self.courses.keys().map(String::as_str)
    }

    /// Course metadata.
    pub fn course(&self, code: &str) -> Option<&Course> {
        self.courses.get(code)
    }

    /// Course name, or [`UNKNOWN_COURSE_NAME`].
    pub fn course_name(&self, code: &str) -> &str {
        self.courses
            .get(code)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_COURSE_NAME)
    }

    /// Student metadata.
    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.get(id)
    }

    /// Students with at least one enrollment, with their course sets.
    pub fn enrolled_students(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.student_courses.iter().map(|(id, c)| (id.as_str(), c))
    }

    /// Course codes a student is enrolled in.
    pub fn courses_of(&self, student_id: &str) -> Option<&BTreeSet<String>> {
        self.student_courses.get(student_id)
    }

    /// Student ids enrolled in a course.
    pub fn students_of(&self, course_code: &str) -> Option<&BTreeSet<String>> {
        self.course_students.get(course_code)
    }

    /// Whether a student is enrolled in a course.
    pub fn is_enrolled(&self, student_id: &str, course_code: &str) -> bool {
        self.student_courses
            .get(student_id)
            .is_some_and(|c| c.contains(course_code))
    }

    /// Number of catalog courses.
    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Number of students with at least one enrollment.
    pub fn student_count(&self) -> usize {
        self.student_courses.len()
    }

    /// Number of distinct enrollment pairs.
    pub fn enrollment_count(&self) -> usize {
        self.student_courses.values().map(BTreeSet::len).sum()
    }

    /// Records dropped while indexing.
    pub fn dropped(&self) -> &[MalformedEnrollment] {
        &self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_roster() -> Roster {
        Roster::new(
            vec![
                Course::new("A", "Alpha"),
                Course::new("B", "Beta"),
                Course::new("C", "Gamma"),
            ],
            vec![
                Student::new("S1").with_courses(["A", "B"]),
                Student::new("S2").with_courses(["A", "B"]),
                Student::new("S3").with_courses(["A", "C"]),
            ],
        )
    }

    #[test]
    fn test_both_directions() {
        let index = EnrollmentIndex::from_roster(&sample_roster());
        assert_eq!(index.course_count(), 3);
        assert_eq!(index.student_count(), 3);
        assert_eq!(index.enrollment_count(), 6);
        assert_eq!(index.students_of("A").unwrap().len(), 3);
        assert_eq!(index.students_of("C").unwrap().len(), 1);
        assert!(index.courses_of("S3").unwrap().contains("C"));
        assert!(index.is_enrolled("S1", "B"));
        assert!(!index.is_enrolled("S3", "B"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let roster = Roster::new(
            vec![Course::new("A", "Alpha")],
            vec![Student::new("S1").with_courses(["A", "A", " A "])],
        );
        let index = EnrollmentIndex::from_roster(&roster);
        assert_eq!(index.enrollment_count(), 1);
        assert_eq!(index.students_of("A").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_dropped() {
        let records = vec![
            Enrollment::new("S1", "A"),
            Enrollment::new("", "A"),
            Enrollment::new("S2", "  "),
        ];
        let index = EnrollmentIndex::build(&[Course::new("A", "Alpha")], &[], records);
        assert_eq!(index.enrollment_count(), 1);
        assert_eq!(index.dropped().len(), 2);
        assert_eq!(index.dropped()[0].reason, "empty student id");
        assert_eq!(index.dropped()[1].reason, "empty course code");
    }

    #[test]
    fn test_unknown_course_added() {
        let index = EnrollmentIndex::build(&[], &[], vec![Enrollment::new("S1", "X9")]);
        assert_eq!(index.course_count(), 1);
        assert_eq!(index.course_name("X9"), UNKNOWN_COURSE_NAME);
        assert!(index.student("S1").is_some());
    }

    #[test]
    fn test_catalog_course_without_students() {
        let roster = Roster::new(
            vec![Course::new("A", "Alpha"), Course::new("Z", "Zeta")],
            vec![Student::new("S1").with_course("A")],
        );
        let index = EnrollmentIndex::from_roster(&roster);
        let codes: Vec<&str> = index.course_codes().collect();
        assert_eq!(codes, vec!["A", "Z"]);
        assert!(index.students_of("Z").is_none());
    }

    #[test]
    fn test_duplicate_catalog_code_keeps_first() {
        let index = EnrollmentIndex::build(
            &[Course::new("A", "First"), Course::new("A", "Second")],
            &[],
            Vec::new(),
        );
        assert_eq!(index.course_name("A"), "First");
    }
}
