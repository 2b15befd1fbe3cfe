//! Conflict analysis.
//!
//! Counts, for every unordered pair of courses, how many students are
//! enrolled in both, and derives each course's conflict pressure.
//!
//! # Algorithm
//! For each student, for each pair of distinct courses in that student's
//! (sorted) enrollment set, increment the counter of the canonical pair
//! `(min, max)`. Pairs are ranked by count descending, then by pair
//! ascending.
//!
//! # Complexity
//! O(s * k²) where s=students, k=courses per student.
//!
//! Pressure is advisory: it orders courses for the scheduler and is never
//! a constraint.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::enrollment::EnrollmentIndex;

/// Shared-student count for a canonical course pair (`course1 < course2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub course1: String,
    pub course2: String,
    pub common_students: u32,
}

/// Ranked conflict pairs and per-course pressure.
#[derive(Debug, Clone, Default)]
pub struct ConflictAnalysis {
    pairs: Vec<ConflictPair>,
    pressure: BTreeMap<String, u64>,
}

impl ConflictPair {
    /// Whether the pair involves a course.
    pub fn involves(&self, course_code: &str) -> bool {
        self.course1 == course_code || self.course2 == course_code
    }
}

impl ConflictAnalysis {
    /// Analyzes all enrollments of an index.
    pub fn analyze(index: &EnrollmentIndex) -> Self {
        let mut counts: BTreeMap<(&str, &str), u32> = BTreeMap::new();

        for (_, courses) in index.enrolled_students() {
            // BTreeSet iteration is sorted, so (i, j) with i < j is canonical
            let courses: Vec<&str> = courses.iter().map(String::as_str).collect();
            for (i, &c1) in courses.iter().enumerate() {
                for &c2 in &courses[i + 1..] {
                    *counts.entry((c1, c2)).or_insert(0) += 1;
                }
            }
        }

        let mut pressure: BTreeMap<String, u64> =
            index.course_codes().map(|c| (c.to_string(), 0)).collect();
        for (&(c1, c2), &n) in &counts {
            *pressure.entry(c1.to_string()).or_insert(0) += u64::from(n);
            *pressure.entry(c2.to_string()).or_insert(0) += u64::from(n);
        }

        let mut pairs: Vec<ConflictPair> = counts
            .into_iter()
            .map(|((c1, c2), n)| ConflictPair {
                course1: c1.to_string(),
                course2: c2.to_string(),
                common_students: n,
            })
            .collect();
        pairs.sort_by(rank_order);

        debug!(pairs = pairs.len(), "conflict analysis complete");
        Self { pairs, pressure }
    }

    /// All pairs, highest shared-student count first.
    pub fn pairs(&self) -> &[ConflictPair] {
        &self.pairs
    }

    /// The `n` highest-ranked pairs.
    pub fn top(&self, n: usize) -> &[ConflictPair] {
        &self.pairs[..n.min(self.pairs.len())]
    }

    /// Shared-student count for a pair, in either order.
    pub fn common_students(&self, a: &str, b: &str) -> u32 {
        let (c1, c2) = if a <= b { (a, b) } else { (b, a) };
        self.pairs
            .iter()
            .find(|p| p.course1 == c1 && p.course2 == c2)
            .map(|p| p.common_students)
            .unwrap_or(0)
    }

    /// Sum of all pair counts involving a course.
    pub fn pressure(&self, course_code: &str) -> u64 {
        self.pressure.get(course_code).copied().unwrap_or(0)
    }

    /// Course codes ordered for scheduling: pressure descending,
    /// then code ascending.
    pub fn priority_order<'a, I>(&self, courses: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut order: Vec<&'a str> = courses.into_iter().collect();
        order.sort_by(|a, b| {
            self.pressure(b)
                .cmp(&self.pressure(a))
                .then_with(|| a.cmp(b))
        });
        order.dedup();
        order
    }
}

fn rank_order(a: &ConflictPair, b: &ConflictPair) -> Ordering {
    b.common_students
        .cmp(&a.common_students)
        .then_with(|| a.course1.cmp(&b.course1))
        .then_with(|| a.course2.cmp(&b.course2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Roster, Student};

    fn index(students: Vec<Student>) -> EnrollmentIndex {
        let mut codes: Vec<String> = students.iter().flat_map(|s| s.courses.clone()).collect();
        codes.sort();
        codes.dedup();
        let courses = codes.iter().map(|c| Course::new(c, c)).collect();
        EnrollmentIndex::from_roster(&Roster::new(courses, students))
    }

    #[test]
    fn test_ranking() {
        let idx = index(vec![
            Student::new("s1").with_courses(["A", "B"]),
            Student::new("s2").with_courses(["A", "B"]),
            Student::new("s3").with_courses(["A", "C"]),
        ]);
        let analysis = ConflictAnalysis::analyze(&idx);
        let pairs = analysis.pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].course1.as_str(), pairs[0].course2.as_str()), ("A", "B"));
        assert_eq!(pairs[0].common_students, 2);
        assert_eq!((pairs[1].course1.as_str(), pairs[1].course2.as_str()), ("A", "C"));
        assert_eq!(pairs[1].common_students, 1);
    }

    #[test]
    fn test_pair_canonical_order() {
        // enrollment order B, A still yields the pair (A, B)
        let idx = index(vec![
            Student::new("s1").with_courses(["B", "A"]),
            Student::new("s2").with_courses(["A", "B"]),
        ]);
        let analysis = ConflictAnalysis::analyze(&idx);
        assert_eq!(analysis.pairs().len(), 1);
        assert_eq!(analysis.pairs()[0].course1, "A");
        assert_eq!(analysis.common_students("B", "A"), 2);
    }

    #[test]
    fn test_tie_break_lexicographic() {
        let idx = index(vec![
            Student::new("s1").with_courses(["C", "D"]),
            Student::new("s2").with_courses(["A", "B"]),
        ]);
        let analysis = ConflictAnalysis::analyze(&idx);
        assert_eq!(analysis.pairs()[0].course1, "A");
        assert_eq!(analysis.pairs()[1].course1, "C");
    }

    #[test]
    fn test_pressure_and_priority() {
        let idx = index(vec![
            Student::new("s1").with_courses(["A", "B"]),
            Student::new("s2").with_courses(["A", "B"]),
            Student::new("s3").with_courses(["A", "C"]),
            Student::new("s4").with_courses(["D"]),
        ]);
        let analysis = ConflictAnalysis::analyze(&idx);
        assert_eq!(analysis.pressure("A"), 3);
        assert_eq!(analysis.pressure("B"), 2);
        assert_eq!(analysis.pressure("C"), 1);
        assert_eq!(analysis.pressure("D"), 0);
        assert_eq!(
            analysis.priority_order(idx.course_codes()),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn test_priority_ties_by_code() {
        let idx = index(vec![
            Student::new("s1").with_courses(["Y", "X"]),
            Student::new("s2").with_courses(["Q"]),
            Student::new("s3").with_courses(["P"]),
        ]);
        let analysis = ConflictAnalysis::analyze(&idx);
        assert_eq!(
            analysis.priority_order(idx.course_codes()),
            vec!["X", "Y", "P", "Q"]
        );
    }

    #[test]
    fn test_top_truncates() {
        let idx = index(vec![Student::new("s1").with_courses(["A", "B", "C"])]);
        let analysis = ConflictAnalysis::analyze(&idx);
        assert_eq!(analysis.pairs().len(), 3);
        assert_eq!(analysis.top(2).len(), 2);
        assert_eq!(analysis.top(50).len(), 3);
    }

    #[test]
    fn test_no_pairs() {
        let analysis = ConflictAnalysis::analyze(&EnrollmentIndex::default());
        assert!(analysis.pairs().is_empty());
        assert_eq!(analysis.pressure("A"), 0);
    }
}
