//! Remote suggestion service.
//!
//! An optional external source of complete candidate schedules, reached
//! over an OpenAI-compatible chat-completions endpoint. A suggestion is
//! never trusted as-is: [`accept_suggestion`] checks it against the slot
//! space, the day capacity, and the conflict verifier before it may
//! replace the greedy schedule.
//!
//! # Contract
//!
//! Request:
//! ```json
//! {"courses": ["A"], "students": [{"id": "S1", "courses": ["A"]}],
//!  "conflict_pairs": [{"course1": "A", "course2": "B", "common_students": 2}],
//!  "constraints": {"min_gap_days": 1, "max_exams_per_day": 5, "skip_weekends": true,
//!                  "window_start": "2025-05-26", "window_end": "2025-06-13"}}
//! ```
//! Response:
//! ```json
//! {"schedule": [{"course_code": "A", "date": "2025-05-26"}],
//!  "statistics": {}, "issues": []}
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{RemoteServiceConfig, SchedulingConfig};
use crate::conflict::{ConflictAnalysis, ConflictPair};
use crate::enrollment::EnrollmentIndex;
use crate::error::RemoteServiceError;
use crate::models::{Schedule, ScheduleAssignment, SlotSpace, SlotUnit};
use crate::validation::verify_schedule;

/// Number of ranked conflict pairs sent with a request.
pub const TOP_CONFLICT_PAIRS: usize = 50;

const SYSTEM_PROMPT: &str = "You are an expert in exam scheduling. Your task is to create \
    an optimal exam schedule assigning courses to specific dates, avoiding conflicts within \
    a specific date range, allowing multiple exams per day if student schedules permit.";

/// A source of candidate schedules.
pub trait SuggestionService {
    /// Requests one candidate schedule. Single attempt, no retry.
    fn suggest(&self, request: &SuggestionRequest) -> Result<SuggestionResponse, RemoteServiceError>;
}

/// Problem instance sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub courses: Vec<String>,
    pub students: Vec<StudentCourses>,
    pub conflict_pairs: Vec<ConflictPair>,
    pub constraints: SuggestionConstraints,
}

/// One student's enrollment set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCourses {
    pub id: String,
    pub courses: Vec<String>,
}

/// Scheduling rules the service must respect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionConstraints {
    pub min_gap_days: u32,
    pub max_exams_per_day: u32,
    pub skip_weekends: bool,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holidays: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slots: Option<Vec<String>>,
}

/// Candidate schedule returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub schedule: Vec<SuggestedExam>,
    #[serde(default)]
    pub statistics: serde_json::Value,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// One suggested exam placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedExam {
    pub course_code: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
}

impl SuggestionRequest {
    /// Builds a request from the indexed roster.
    ///
    /// Only the [`TOP_CONFLICT_PAIRS`] highest-ranked pairs are included.
    pub fn from_index(
        index: &EnrollmentIndex,
        analysis: &ConflictAnalysis,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            courses: index.course_codes().map(str::to_string).collect(),
            students: index
                .enrolled_students()
                .map(|(id, courses)| StudentCourses {
                    id: id.to_string(),
                    courses: courses.iter().cloned().collect(),
                })
                .collect(),
            conflict_pairs: analysis.top(TOP_CONFLICT_PAIRS).to_vec(),
            constraints: SuggestionConstraints {
                min_gap_days: config.min_gap_days,
                max_exams_per_day: config.max_exams_per_day,
                skip_weekends: config.skip_weekends,
                window_start: config.window_start,
                window_end: config.window_end,
                holidays: config.holidays.clone(),
                time_slots: config.time_slots.clone(),
            },
        }
    }

    /// Renders the instruction prompt for a chat model.
    pub fn prompt(&self) -> Result<String, RemoteServiceError> {
        let data = serde_json::to_string(self)?;
        let c = &self.constraints;
        let slot_rule = match &c.time_slots {
            Some(slots) => format!(
                "Every entry MUST carry a \"time_slot\" field, one of: {}.",
                slots.join(", ")
            ),
            None => "Do not include a time_slot field.".to_string(),
        };
        Ok(format!(
            "I need you to create an exam schedule assigning each course to a single date \
             for the following data:\n{data}\n\n\
             The schedule MUST follow these rules:\n\
             1. All exams MUST be scheduled between {start} and {end} (inclusive).\n\
             2. No student should have two exams scheduled on the same day.\n\
             3. There should be at least {gap} day(s) between exams for any student.\n\
             4. A maximum of {max} different course exams can be scheduled on any single day.\n\
             5. Try to schedule exams so that courses with many students in common are not \
             scheduled close to each other (lower priority than other rules).\n\
             6. If skipping weekends (configured as {weekends}), do not schedule exams on \
             Saturdays or Sundays. Never use the listed holidays.\n\n\
             Respond with ONLY a JSON object containing:\n\
             1. A \"schedule\" array: [{{\"course_code\": \"...\", \"date\": \"YYYY-MM-DD\"}}, ...]. \
             {slot_rule}\n\
             2. A \"statistics\" object with scheduling metrics.\n\
             3. An \"issues\" array listing any problems or constraints that couldn't be fully met.\n\n\
             Do not include any introductory text, markdown formatting, or explanations \
             outside the JSON structure itself.",
            start = c.window_start.format("%Y-%m-%d"),
            end = c.window_end.format("%Y-%m-%d"),
            gap = c.min_gap_days,
            max = c.max_exams_per_day,
            weekends = c.skip_weekends,
        ))
    }
}

/// Chat-completions client for the suggestion service.
#[derive(Debug, Clone)]
pub struct HttpSuggestionService {
    client: reqwest::blocking::Client,
    config: RemoteServiceConfig,
}

/// A chat message with role and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request body for the chat-completions endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl HttpSuggestionService {
    /// Creates a client with the configured timeout.
    ///
    /// # Errors
    /// [`RemoteServiceError::NotConfigured`] when the URL or API key is blank.
    pub fn new(config: RemoteServiceConfig) -> Result<Self, RemoteServiceError> {
        if config.url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(RemoteServiceError::NotConfigured);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

impl SuggestionService for HttpSuggestionService {
    fn suggest(&self, request: &SuggestionRequest) -> Result<SuggestionResponse, RemoteServiceError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt()?,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        info!(
            url = %self.config.url,
            model = %self.config.model,
            courses = request.courses.len(),
            "requesting remote schedule suggestion"
        );
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteServiceError::Status(status.as_u16()));
        }

        let chat: ChatResponse = response.json()?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(RemoteServiceError::EmptyResponse)?;

        let parsed: SuggestionResponse = serde_json::from_str(strip_code_fences(&content))?;
        debug!(
            entries = parsed.schedule.len(),
            issues = parsed.issues.len(),
            "remote suggestion parsed"
        );
        Ok(parsed)
    }
}

/// Removes a surrounding Markdown code fence (with optional language tag).
pub fn strip_code_fences(content: &str) -> &str {
    let mut body = content.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Turns a suggestion into a schedule if it passes every check.
///
/// Rejects a suggestion that assigns an unknown course, assigns a course
/// twice, leaves a catalog course out, uses a unit outside `slots`, exceeds
/// the day capacity, or leaves any student conflict.
pub fn accept_suggestion(
    response: &SuggestionResponse,
    index: &EnrollmentIndex,
    slots: &SlotSpace,
    config: &SchedulingConfig,
) -> Result<Schedule, RemoteServiceError> {
    let mut schedule = Schedule::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for entry in &response.schedule {
        let code = entry.course_code.trim();
        if index.course(code).is_none() {
            return Err(rejected(format!("unknown course {code}")));
        }
        if !seen.insert(code) {
            return Err(rejected(format!("course {code} assigned more than once")));
        }
        let unit = SlotUnit {
            date: entry.date,
            time_slot: entry.time_slot.clone(),
        };
        if !slots.contains(&unit) {
            return Err(rejected(format!(
                "course {code} assigned to {unit}, outside the slot space"
            )));
        }
        schedule.add_assignment(ScheduleAssignment::new(code, unit));
    }

    if let Some(missing) = index.course_codes().find(|c| !seen.contains(c)) {
        warn!(course_code = missing, "course missing from remote suggestion");
        return Err(rejected(format!("course {missing} missing from suggestion")));
    }

    let capacity = config.max_exams_per_day as usize;
    if let Some((date, load)) = schedule.day_loads().into_iter().find(|(_, n)| *n > capacity) {
        return Err(rejected(format!(
            "{load} exams on {date}, capacity is {capacity}"
        )));
    }

    let conflicts = verify_schedule(&schedule, index, config);
    if let Some(first) = conflicts.first() {
        return Err(rejected(format!(
            "{} student conflict(s), first: {first}",
            conflicts.len()
        )));
    }

    Ok(schedule)
}

fn rejected(reason: String) -> RemoteServiceError {
    RemoteServiceError::Rejected { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Roster, Student};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn sample_index() -> EnrollmentIndex {
        EnrollmentIndex::from_roster(&Roster::new(
            vec![
                Course::new("A", "Alpha"),
                Course::new("B", "Beta"),
                Course::new("C", "Gamma"),
            ],
            vec![
                Student::new("S1").with_courses(["A", "B"]),
                Student::new("S2").with_courses(["B", "C"]),
            ],
        ))
    }

    // 2025-06-02 (Mon) .. 2025-06-13 (Fri)
    fn config() -> SchedulingConfig {
        SchedulingConfig::new(d(2), d(13)).with_max_exams_per_day(2)
    }

    fn exam(code: &str, date: NaiveDate) -> SuggestedExam {
        SuggestedExam {
            course_code: code.to_string(),
            date,
            time_slot: None,
        }
    }

    fn response(entries: Vec<SuggestedExam>) -> SuggestionResponse {
        SuggestionResponse {
            schedule: entries,
            statistics: serde_json::Value::Null,
            issues: Vec::new(),
        }
    }

    fn accept(entries: Vec<SuggestedExam>) -> Result<Schedule, RemoteServiceError> {
        let cfg = config();
        let slots = SlotSpace::generate(&cfg).unwrap();
        accept_suggestion(&response(entries), &sample_index(), &slots, &cfg)
    }

    fn reason(err: RemoteServiceError) -> String {
        match err {
            RemoteServiceError::Rejected { reason } => reason,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_request_from_index() {
        let index = sample_index();
        let analysis = ConflictAnalysis::analyze(&index);
        let req = SuggestionRequest::from_index(&index, &analysis, &config());
        assert_eq!(req.courses, vec!["A", "B", "C"]);
        assert_eq!(req.students.len(), 2);
        assert_eq!(req.students[0].courses, vec!["A", "B"]);
        assert_eq!(req.conflict_pairs.len(), 2);
        assert_eq!(req.constraints.max_exams_per_day, 2);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["constraints"]["window_start"], "2025-06-02");
        assert!(json["constraints"].get("time_slots").is_none());
    }

    #[test]
    fn test_request_truncates_pairs() {
        let codes: Vec<String> = (0..12).map(|i| format!("C{i:02}")).collect();
        let roster = Roster::new(
            codes.iter().map(|c| Course::new(c, c)).collect(),
            vec![Student::new("S1").with_courses(codes.clone())],
        );
        let index = EnrollmentIndex::from_roster(&roster);
        let analysis = ConflictAnalysis::analyze(&index);
        // 12 courses → 66 pairs
        assert_eq!(analysis.pairs().len(), 66);
        let req = SuggestionRequest::from_index(&index, &analysis, &config());
        assert_eq!(req.conflict_pairs.len(), TOP_CONFLICT_PAIRS);
    }

    #[test]
    fn test_prompt_states_rules() {
        let index = sample_index();
        let analysis = ConflictAnalysis::analyze(&index);
        let prompt = SuggestionRequest::from_index(&index, &analysis, &config())
            .prompt()
            .unwrap();
        assert!(prompt.contains("between 2025-06-02 and 2025-06-13"));
        assert!(prompt.contains("A maximum of 2 different course exams"));
        assert!(prompt.contains("Do not include a time_slot field."));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_response_defaults() {
        let parsed: SuggestionResponse = serde_json::from_str(
            r#"{"schedule": [{"course_code": "A", "date": "2025-06-02"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.schedule[0], exam("A", d(2)));
        assert!(parsed.statistics.is_null());
        assert!(parsed.issues.is_empty());

        let missing: Result<SuggestionResponse, _> = serde_json::from_str(r#"{"issues": []}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_accept_valid() {
        let schedule = accept(vec![exam("A", d(2)), exam("B", d(4)), exam("C", d(6))]).unwrap();
        assert_eq!(schedule.assignment_count(), 3);
        assert_eq!(schedule.unscheduled_count(), 0);
    }

    #[test]
    fn test_reject_partial_suggestion() {
        let err = accept(vec![exam("A", d(2)), exam("B", d(4))]).unwrap_err();
        assert_eq!(reason(err), "course C missing from suggestion");

        let err = accept(Vec::new()).unwrap_err();
        assert_eq!(reason(err), "course A missing from suggestion");
    }

    #[test]
    fn test_reject_same_day_conflict() {
        let err = accept(vec![exam("A", d(3)), exam("B", d(3)), exam("C", d(9))]).unwrap_err();
        assert!(reason(err).contains("Same Day Conflict"));
    }

    #[test]
    fn test_reject_unknown_and_duplicate() {
        let err = accept(vec![exam("Z", d(2))]).unwrap_err();
        assert_eq!(reason(err), "unknown course Z");

        let err = accept(vec![exam("A", d(2)), exam("A", d(6))]).unwrap_err();
        assert_eq!(reason(err), "course A assigned more than once");
    }

    #[test]
    fn test_reject_outside_slot_space() {
        // 2025-06-07 is a Saturday
        let err = accept(vec![exam("A", d(7))]).unwrap_err();
        assert!(reason(err).contains("outside the slot space"));

        let err = accept(vec![exam("A", d(20))]).unwrap_err();
        assert!(reason(err).contains("outside the slot space"));
    }

    #[test]
    fn test_reject_over_capacity() {
        // A and C share no student but three exams exceed capacity 2
        let roster = Roster::new(
            vec![Course::new("A", "Alpha"), Course::new("B", "Beta"), Course::new("C", "Gamma")],
            vec![
                Student::new("S1").with_course("A"),
                Student::new("S2").with_course("B"),
                Student::new("S3").with_course("C"),
            ],
        );
        let index = EnrollmentIndex::from_roster(&roster);
        let cfg = config();
        let slots = SlotSpace::generate(&cfg).unwrap();
        let err = accept_suggestion(
            &response(vec![exam("A", d(2)), exam("B", d(2)), exam("C", d(2))]),
            &index,
            &slots,
            &cfg,
        )
        .unwrap_err();
        assert_eq!(reason(err), "3 exams on 2025-06-02, capacity is 2");
    }

    #[test]
    fn test_http_service_requires_key() {
        let err = HttpSuggestionService::new(RemoteServiceConfig::new(
            "http://localhost:8000/v1/chat/completions",
            "",
        ))
        .unwrap_err();
        assert!(matches!(err, RemoteServiceError::NotConfigured));

        let svc = HttpSuggestionService::new(
            RemoteServiceConfig::new("http://localhost:8000/v1/chat/completions", "key")
                .with_timeout_secs(5),
        )
        .unwrap();
        assert_eq!(svc.url(), "http://localhost:8000/v1/chat/completions");
    }
}
