//! Student, enrollment, and roster models.
//!
//! A [`Roster`] is what a roster provider hands to the crate: the course
//! catalog plus every student with the codes they are enrolled in.

use serde::{Deserialize, Serialize};

use super::{Course, Department, Level};

/// A student sitting exams in this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub department: Department,
    #[serde(default)]
    pub level: Level,
    /// Enrolled course codes. Duplicates collapse when indexed.
    #[serde(default)]
    pub courses: Vec<String>,
}

/// A single (student, course) enrollment pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String,
    pub course_code: String,
}

/// Course catalog and student enrollments for one exam session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub courses: Vec<Course>,
    pub students: Vec<Student>,
}

impl Student {
    /// Creates a student with no enrollments.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            department: Department::default(),
            level: Level::default(),
            courses: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: Department) -> Self {
        self.department = department;
        self
    }

    /// Sets the level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enrolls in a course.
    pub fn with_course(mut self, code: impl Into<String>) -> Self {
        self.courses.push(code.into());
        self
    }

    /// Enrolls in several courses.
    pub fn with_courses<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.courses.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Enrollment pairs for this student, in declaration order.
    pub fn enrollments(&self) -> impl Iterator<Item = Enrollment> + '_ {
        self.courses.iter().map(move |code| Enrollment::new(&self.id, code))
    }
}

impl Enrollment {
    pub fn new(student_id: impl Into<String>, course_code: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            course_code: course_code.into(),
        }
    }
}

impl Roster {
    /// Creates a roster.
    pub fn new(courses: Vec<Course>, students: Vec<Student>) -> Self {
        Self { courses, students }
    }

    /// All enrollment pairs across students.
    pub fn enrollments(&self) -> impl Iterator<Item = Enrollment> + '_ {
        self.students.iter().flat_map(Student::enrollments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_enrollments() {
        let s = Student::new("S1")
            .with_name("Alice")
            .with_courses(["A", "B"])
            .with_course("C");
        let pairs: Vec<Enrollment> = s.enrollments().collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], Enrollment::new("S1", "C"));
    }

    #[test]
    fn test_roster_from_json() {
        let roster: Roster = serde_json::from_str(
            r#"{
                "courses": [{"code": "A", "name": "Alpha"}],
                "students": [{"id": "S1", "department": "CE", "level": "Dip", "courses": ["A"]}]
            }"#,
        )
        .unwrap();
        assert_eq!(roster.courses.len(), 1);
        assert_eq!(roster.students[0].department, Department::ComputerEngineering);
        assert_eq!(roster.enrollments().count(), 1);
    }
}
