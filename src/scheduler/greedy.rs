//! Conflict-aware greedy exam scheduler.
//!
//! # Algorithm
//!
//! 1. Order courses by conflict pressure (descending), ties by code.
//! 2. For each course, take a random permutation of the slot space.
//! 3. Reject a slot if its date is at day capacity, or if any enrolled
//!    student already has an exam that date (no-same-day) or within
//!    `min_gap_days` of it (min-gap).
//! 4. Commit the first surviving slot; if none survives, the course is
//!    left unscheduled with a reason.
//!
//! High-pressure courses get first pick; low-pressure courses are the
//! ones squeezed out when capacity runs short.
//!
//! # Complexity
//! O(c * s * e) where c=courses, s=slots, e=enrolled students per course.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::config::SchedulingConfig;
use crate::conflict::ConflictAnalysis;
use crate::enrollment::EnrollmentIndex;
use crate::models::{Schedule, ScheduleAssignment, SlotSpace, SlotUnit, UnscheduledCourse};

/// Reason recorded for a course no slot could take.
pub const NO_SLOT_REASON: &str = "no conflict-free slot found in window";

/// Why a candidate slot was rejected for a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRejection {
    /// The date already holds `max_exams_per_day` exams.
    DayFull,
    /// A student already has an exam that date.
    SameDay { student_id: String },
    /// A student already has an exam in this exact slot.
    SlotTaken { student_id: String },
    /// A student has an exam fewer than `min_gap_days` away.
    InsufficientGap { student_id: String, days: i64 },
}

/// Greedy exam scheduler.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_exam_schedule::config::SchedulingConfig;
/// use u_exam_schedule::conflict::ConflictAnalysis;
/// use u_exam_schedule::enrollment::EnrollmentIndex;
/// use u_exam_schedule::models::{Course, Roster, SlotSpace, Student};
/// use u_exam_schedule::scheduler::GreedyScheduler;
///
/// let roster = Roster::new(
///     vec![Course::new("A", "Alpha"), Course::new("B", "Beta")],
///     vec![Student::new("S1").with_courses(["A", "B"])],
/// );
/// let config = SchedulingConfig::new(
///     NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 6, 6).unwrap(),
/// )
/// .with_seed(42);
///
/// let index = EnrollmentIndex::from_roster(&roster);
/// let analysis = ConflictAnalysis::analyze(&index);
/// let slots = SlotSpace::generate(&config).unwrap();
///
/// let schedule = GreedyScheduler::from_config(&config).schedule(&index, &analysis, &slots);
/// assert_eq!(schedule.assignment_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyScheduler {
    max_exams_per_day: usize,
    min_gap_days: i64,
    no_same_day: bool,
    seed: Option<u64>,
}

impl GreedyScheduler {
    /// Creates a scheduler with default constraints (5 per day, 1 day gap,
    /// no same-day exams, OS-seeded).
    pub fn new() -> Self {
        Self {
            max_exams_per_day: 5,
            min_gap_days: 1,
            no_same_day: true,
            seed: None,
        }
    }

    /// Creates a scheduler from a run configuration.
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            max_exams_per_day: config.max_exams_per_day as usize,
            min_gap_days: i64::from(config.min_gap_days),
            no_same_day: config.no_same_day,
            seed: config.seed,
        }
    }

    /// Sets the day capacity.
    pub fn with_max_exams_per_day(mut self, max: usize) -> Self {
        self.max_exams_per_day = max;
        self
    }

    /// Sets the minimum gap in days.
    pub fn with_min_gap_days(mut self, days: u32) -> Self {
        self.min_gap_days = i64::from(days);
        self
    }

    /// Sets the same-day rule.
    pub fn with_no_same_day(mut self, no_same_day: bool) -> Self {
        self.no_same_day = no_same_day;
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Schedules every catalog course of `index` into `slots`.
    ///
    /// Uses the configured seed, or OS entropy when unset.
    pub fn schedule(
        &self,
        index: &EnrollmentIndex,
        analysis: &ConflictAnalysis,
        slots: &SlotSpace,
    ) -> Schedule {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.schedule_with_rng(index, analysis, slots, &mut rng)
    }

    /// Schedules with a caller-supplied random source.
    pub fn schedule_with_rng<R: Rng + ?Sized>(
        &self,
        index: &EnrollmentIndex,
        analysis: &ConflictAnalysis,
        slots: &SlotSpace,
        rng: &mut R,
    ) -> Schedule {
        let mut schedule = Schedule::new();
        let mut state = AssignmentState::default();
        let order = analysis.priority_order(index.course_codes());

        info!(
            courses = order.len(),
            slots = slots.len(),
            max_exams_per_day = self.max_exams_per_day,
            min_gap_days = self.min_gap_days,
            "greedy scheduling started"
        );

        let mut trial_order: Vec<usize> = (0..slots.len()).collect();
        for course_code in order {
            let students: Vec<&str> = index
                .students_of(course_code)
                .map(|s| s.iter().map(String::as_str).collect())
                .unwrap_or_default();

            trial_order.shuffle(rng);
            let chosen = trial_order.iter().map(|&i| &slots.units()[i]).find(|slot| {
                match self.check(&state, slot, &students) {
                    Ok(()) => true,
                    Err(rejection) => {
                        trace!(course_code, %slot, ?rejection, "slot rejected");
                        false
                    }
                }
            });

            match chosen {
                Some(slot) => {
                    debug!(course_code, %slot, students = students.len(), "course scheduled");
                    state.commit(slot, &students);
                    schedule.add_assignment(ScheduleAssignment::new(course_code, slot.clone()));
                }
                None => {
                    warn!(course_code, students = students.len(), "course left unscheduled");
                    schedule.add_unscheduled(UnscheduledCourse::new(course_code, NO_SLOT_REASON));
                }
            }
        }

        info!(
            scheduled = schedule.assignment_count(),
            unscheduled = schedule.unscheduled_count(),
            days_used = state.day_load.len(),
            "greedy scheduling finished"
        );
        schedule
    }

    /// Checks one candidate slot against the running state.
    fn check(
        &self,
        state: &AssignmentState<'_>,
        slot: &SlotUnit,
        students: &[&str],
    ) -> Result<(), SlotRejection> {
        if state.load(slot.date) >= self.max_exams_per_day {
            return Err(SlotRejection::DayFull);
        }

        for &student_id in students {
            let Some(taken) = state.calendars.get(student_id) else {
                continue;
            };
            for existing in taken {
                let days = existing.days_between(slot);
                if days == 0 {
                    if self.no_same_day {
                        return Err(SlotRejection::SameDay {
                            student_id: student_id.to_string(),
                        });
                    }
                    if existing == slot {
                        return Err(SlotRejection::SlotTaken {
                            student_id: student_id.to_string(),
                        });
                    }
                } else if days < self.min_gap_days {
                    return Err(SlotRejection::InsufficientGap {
                        student_id: student_id.to_string(),
                        days,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Day loads and student calendars, owned by one scheduling run.
#[derive(Debug, Default)]
struct AssignmentState<'a> {
    day_load: BTreeMap<NaiveDate, usize>,
    calendars: HashMap<&'a str, Vec<SlotUnit>>,
}

impl<'a> AssignmentState<'a> {
    fn load(&self, date: NaiveDate) -> usize {
        self.day_load.get(&date).copied().unwrap_or(0)
    }

    fn commit(&mut self, slot: &SlotUnit, students: &[&'a str]) {
        *self.day_load.entry(slot.date).or_insert(0) += 1;
        for &student_id in students {
            self.calendars
                .entry(student_id)
                .or_default()
                .push(slot.clone());
        }
    }
}
