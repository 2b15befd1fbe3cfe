//! Export records and CSV writers.
//!
//! Rows are plain values built from a committed schedule; writing them
//! never touches the schedule itself. The `time_slot` column only appears
//! when the slot space uses time slots.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::enrollment::EnrollmentIndex;
use crate::error::ExportError;
use crate::models::{Schedule, ScheduleAssignment, SlotSpace, SlotUnit};
use crate::validation::build_student_calendars;

/// One line of the schedule export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleExportRow {
    /// `None` for an unscheduled course.
    pub date: Option<NaiveDate>,
    pub course_code: String,
    pub time_slot: Option<String>,
    pub note: String,
}

/// One exam in a student's export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentExportRow {
    pub course_code: String,
    pub course_name: String,
    pub date: NaiveDate,
    pub time_slot: Option<String>,
    /// `None` for the student's first exam.
    pub days_since_last_exam: Option<i64>,
}

/// Schedule rows sorted by (date, time slot order, course code), followed
/// by unscheduled courses with their reason as note.
pub fn schedule_rows(schedule: &Schedule, slots: &SlotSpace) -> Vec<ScheduleExportRow> {
    let mut assigned: Vec<&ScheduleAssignment> = schedule.assignments.iter().collect();
    assigned.sort_by(|a, b| {
        slot_key(slots, &a.slot)
            .cmp(&slot_key(slots, &b.slot))
            .then_with(|| a.course_code.cmp(&b.course_code))
    });

    let mut rows: Vec<ScheduleExportRow> = assigned
        .into_iter()
        .map(|a| ScheduleExportRow {
            date: Some(a.date()),
            course_code: a.course_code.clone(),
            time_slot: a.slot.time_slot.clone(),
            note: String::new(),
        })
        .collect();
    rows.extend(schedule.unscheduled.iter().map(|u| ScheduleExportRow {
        date: None,
        course_code: u.course_code.clone(),
        time_slot: None,
        note: u.reason.clone(),
    }));
    rows
}

/// Per-student rows, keyed by student id. Students without exams are absent.
pub fn student_rows(
    schedule: &Schedule,
    index: &EnrollmentIndex,
    slots: &SlotSpace,
) -> BTreeMap<String, Vec<StudentExportRow>> {
    build_student_calendars(schedule, index)
        .into_iter()
        .map(|(student_id, mut exams)| {
            exams.sort_by(|a, b| {
                slot_key(slots, &a.slot)
                    .cmp(&slot_key(slots, &b.slot))
                    .then_with(|| a.course_code.cmp(&b.course_code))
            });
            let mut last: Option<NaiveDate> = None;
            let rows = exams
                .into_iter()
                .map(|exam| {
                    let date = exam.slot.date;
                    let row = StudentExportRow {
                        course_name: index.course_name(&exam.course_code).to_string(),
                        course_code: exam.course_code,
                        date,
                        time_slot: exam.slot.time_slot,
                        days_since_last_exam: last.map(|prev| (date - prev).num_days()),
                    };
                    last = Some(date);
                    row
                })
                .collect();
            (student_id, rows)
        })
        .collect()
}

/// Writes schedule rows as CSV.
pub fn write_schedule_csv<W: io::Write>(
    writer: W,
    rows: &[ScheduleExportRow],
    with_time_slots: bool,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    if with_time_slots {
        csv.write_record(["date", "course_code", "time_slot", "note"])?;
    } else {
        csv.write_record(["date", "course_code", "note"])?;
    }
    for row in rows {
        let date = row.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        if with_time_slots {
            let slot = row.time_slot.as_deref().unwrap_or("");
            csv.write_record([date.as_str(), row.course_code.as_str(), slot, row.note.as_str()])?;
        } else {
            csv.write_record([date.as_str(), row.course_code.as_str(), row.note.as_str()])?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// Writes one student's rows as CSV. The first exam's gap is `N/A`.
pub fn write_student_csv<W: io::Write>(
    writer: W,
    rows: &[StudentExportRow],
    with_time_slots: bool,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    if with_time_slots {
        csv.write_record(["Course Code", "Course Name", "Date", "Time Slot", "Days Since Last Exam"])?;
    } else {
        csv.write_record(["Course Code", "Course Name", "Date", "Days Since Last Exam"])?;
    }
    for row in rows {
        let date = row.date.format("%Y-%m-%d").to_string();
        let gap = row
            .days_since_last_exam
            .map(|g| g.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        if with_time_slots {
            let slot = row.time_slot.as_deref().unwrap_or("");
            csv.write_record([
                row.course_code.as_str(),
                row.course_name.as_str(),
                date.as_str(),
                slot,
                gap.as_str(),
            ])?;
        } else {
            csv.write_record([
                row.course_code.as_str(),
                row.course_name.as_str(),
                date.as_str(),
                gap.as_str(),
            ])?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// Writes the schedule CSV to `path`.
pub fn save_schedule_csv(
    path: impl AsRef<Path>,
    schedule: &Schedule,
    slots: &SlotSpace,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let rows = schedule_rows(schedule, slots);
    write_schedule_csv(File::create(path)?, &rows, slots.uses_time_slots())?;
    info!(path = %path.display(), rows = rows.len(), "schedule exported");
    Ok(())
}

/// Writes one `<name>_<id>_schedule.csv` per student into `dir`
/// (`<id>_schedule.csv` when the student has no name).
///
/// Returns the number of files written.
pub fn save_student_csvs(
    dir: impl AsRef<Path>,
    schedule: &Schedule,
    index: &EnrollmentIndex,
    slots: &SlotSpace,
) -> Result<usize, ExportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let per_student = student_rows(schedule, index, slots);
    for (student_id, rows) in &per_student {
        let path = student_file(dir, index, student_id);
        write_student_csv(File::create(&path)?, rows, slots.uses_time_slots())?;
        debug!(student_id, path = %path.display(), "student schedule exported");
    }
    info!(dir = %dir.display(), files = per_student.len(), "student schedules exported");
    Ok(per_student.len())
}

fn student_file(dir: &Path, index: &EnrollmentIndex, student_id: &str) -> PathBuf {
    let id = file_safe(student_id);
    let label = match index.student(student_id).map(|s| s.name.trim()) {
        Some(name) if !name.is_empty() => format!("{}_{id}", file_safe(name)),
        _ => id,
    };
    dir.join(format!("{label}_schedule.csv"))
}

fn file_safe(part: &str) -> String {
    part.chars()
        .map(|c| if c == ' ' || c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

fn slot_key(slots: &SlotSpace, slot: &SlotUnit) -> (NaiveDate, usize) {
    (
        slot.date,
        slots.rank(slot.time_slot.as_deref()).unwrap_or(usize::MAX),
    )
}
