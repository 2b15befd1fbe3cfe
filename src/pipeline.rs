//! End-to-end timetabling run.
//!
//! index → conflict analysis → (remote suggestion | greedy) → verification
//! → report. A remote suggestion is used only when it passes
//! [`accept_suggestion`]; any failure falls back to the greedy scheduler
//! in the same call.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::SchedulingConfig;
use crate::conflict::ConflictAnalysis;
use crate::enrollment::EnrollmentIndex;
use crate::error::{RemoteServiceError, ScheduleError};
use crate::models::{Schedule, SlotSpace};
use crate::remote::{accept_suggestion, SuggestionRequest, SuggestionService};
use crate::scheduler::{DepartmentMap, GreedyScheduler, ScheduleReport};
use crate::validation::{verify_schedule, ConflictRecord};

/// Which component produced the committed schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSource {
    Greedy,
    Remote,
}

/// Everything a run produces.
#[derive(Debug)]
pub struct TimetableOutcome {
    pub schedule: Schedule,
    pub source: ScheduleSource,
    pub slots: SlotSpace,
    pub analysis: ConflictAnalysis,
    /// Residual conflicts of `schedule`. Empty for a clean run.
    pub conflicts: Vec<ConflictRecord>,
    pub report: ScheduleReport,
    /// Why a configured remote service was not used.
    pub remote_error: Option<RemoteServiceError>,
}

/// Runs the timetabling pipeline for one configuration.
pub struct ExamTimetabler<'a> {
    config: SchedulingConfig,
    remote: Option<&'a dyn SuggestionService>,
    departments: DepartmentMap,
}

impl fmt::Display for ScheduleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => f.write_str("local greedy scheduler"),
            Self::Remote => f.write_str("remote suggestion service"),
        }
    }
}

impl<'a> ExamTimetabler<'a> {
    /// Creates a local-only timetabler. Departments come from
    /// `config.department_prefixes`.
    pub fn new(config: SchedulingConfig) -> Self {
        let departments = DepartmentMap::from_prefixes(&config.department_prefixes);
        Self {
            config,
            remote: None,
            departments,
        }
    }

    /// Tries `service` before the greedy scheduler.
    pub fn with_remote(mut self, service: &'a dyn SuggestionService) -> Self {
        self.remote = Some(service);
        self
    }

    /// Overrides the department mapping used by the report.
    pub fn with_departments(mut self, departments: DepartmentMap) -> Self {
        self.departments = departments;
        self
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Runs the pipeline.
    ///
    /// # Errors
    /// Only configuration-level problems are fatal: invalid values, no
    /// courses, no enrolled students, or an empty slot space.
    pub fn run(&self, index: &EnrollmentIndex) -> Result<TimetableOutcome, ScheduleError> {
        self.config.validate()?;
        if index.course_count() == 0 {
            return Err(ScheduleError::NoCourses);
        }
        if index.student_count() == 0 {
            return Err(ScheduleError::NoStudents);
        }

        let slots = SlotSpace::generate(&self.config)?;
        debug!(
            units = slots.len(),
            dates = slots.dates().len(),
            time_slots = slots.uses_time_slots(),
            "slot space generated"
        );
        let analysis = ConflictAnalysis::analyze(index);
        info!(
            courses = index.course_count(),
            students = index.student_count(),
            slots = slots.len(),
            conflict_pairs = analysis.pairs().len(),
            "timetabling run started"
        );

        let (remote_schedule, remote_error) = match self.remote {
            Some(service) => match self.try_remote(service, index, &analysis, &slots) {
                Ok(accepted) => (Some(accepted), None),
                Err(e) => {
                    warn!(error = %e, "remote suggestion discarded, falling back to greedy");
                    (None, Some(e))
                }
            },
            None => (None, None),
        };

        let (schedule, source, remote_issues) = match remote_schedule {
            Some((schedule, issues)) => (schedule, ScheduleSource::Remote, issues),
            None => {
                let schedule =
                    GreedyScheduler::from_config(&self.config).schedule(index, &analysis, &slots);
                (schedule, ScheduleSource::Greedy, Vec::new())
            }
        };

        let conflicts = verify_schedule(&schedule, index, &self.config);
        if !conflicts.is_empty() {
            warn!(conflicts = conflicts.len(), "committed schedule has residual conflicts");
        }

        let mut report = ScheduleReport::calculate(&schedule, index, &conflicts, &self.departments);
        for dropped in index.dropped() {
            report.push_issue(format!(
                "Dropped enrollment record (student '{}', course '{}'): {}",
                dropped.student_id, dropped.course_code, dropped.reason
            ));
        }
        if let Some(e) = &remote_error {
            report.push_issue(format!("Remote suggestion not used: {e}"));
        }
        for issue in remote_issues {
            report.push_issue(format!("Remote service: {issue}"));
        }

        info!(
            source = %source,
            scheduled = schedule.assignment_count(),
            unscheduled = schedule.unscheduled_count(),
            conflicts = conflicts.len(),
            "timetabling run finished"
        );

        Ok(TimetableOutcome {
            schedule,
            source,
            slots,
            analysis,
            conflicts,
            report,
            remote_error,
        })
    }

    fn try_remote(
        &self,
        service: &dyn SuggestionService,
        index: &EnrollmentIndex,
        analysis: &ConflictAnalysis,
        slots: &SlotSpace,
    ) -> Result<(Schedule, Vec<String>), RemoteServiceError> {
        let request = SuggestionRequest::from_index(index, analysis, &self.config);
        let response = service.suggest(&request)?;
        let schedule = accept_suggestion(&response, index, slots, &self.config)?;
        info!(
            scheduled = schedule.assignment_count(),
            "remote suggestion accepted"
        );
        Ok((schedule, response.issues))
    }
}
