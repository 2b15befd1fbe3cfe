//! Exam schedule CLI.
//!
//! Loads a JSON roster, builds a timetable, and writes the schedule CSV,
//! optional per-student CSVs, and the summary report.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use u_exam_schedule::config::{RemoteServiceConfig, SchedulingConfig};
use u_exam_schedule::enrollment::EnrollmentIndex;
use u_exam_schedule::export::{save_schedule_csv, save_student_csvs};
use u_exam_schedule::models::Roster;
use u_exam_schedule::pipeline::ExamTimetabler;
use u_exam_schedule::remote::HttpSuggestionService;

#[derive(Parser)]
#[command(name = "exam-schedule")]
#[command(about = "Conflict-aware exam timetabling")]
struct Cli {
    /// Roster JSON: {"courses": [...], "students": [...]}
    #[arg(long)]
    roster: PathBuf,

    /// Scheduling config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// First exam date (overrides config)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last exam date (overrides config)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Random seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV for the schedule
    #[arg(short, long, default_value = "exam_schedule_output.csv")]
    output: PathBuf,

    /// Directory for per-student CSVs
    #[arg(long)]
    student_dir: Option<PathBuf>,

    /// Write the text report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Never call the remote suggestion service
    #[arg(long)]
    local_only: bool,

    /// Chat-completions endpoint for schedule suggestions
    #[arg(long, env = "EXAM_SCHEDULE_API_URL")]
    api_url: Option<String>,

    /// API key for the suggestion service
    #[arg(long, env = "EXAM_SCHEDULE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<SchedulingConfig> {
    let mut config = match &cli.config {
        Some(path) => SchedulingConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => match (cli.start, cli.end) {
            (Some(start), Some(end)) => SchedulingConfig::new(start, end),
            _ => bail!("either --config or both --start and --end are required"),
        },
    };
    if let Some(start) = cli.start {
        config.window_start = start;
    }
    if let Some(end) = cli.end {
        config.window_end = end;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    if cli.local_only {
        config.remote = None;
    } else {
        match (config.remote.take(), &cli.api_url) {
            (Some(mut remote), url) => {
                if let Some(url) = url {
                    remote.url = url.clone();
                }
                if let Some(key) = &cli.api_key {
                    remote.api_key = key.clone();
                }
                config.remote = Some(remote);
            }
            (None, Some(url)) => {
                let key = cli.api_key.clone().unwrap_or_default();
                config.remote = Some(RemoteServiceConfig::new(url.clone(), key));
            }
            (None, None) => {}
        }
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&cli)?;
    let raw = fs::read_to_string(&cli.roster)
        .with_context(|| format!("reading roster {}", cli.roster.display()))?;
    let roster: Roster = serde_json::from_str(&raw).context("parsing roster JSON")?;
    let index = EnrollmentIndex::from_roster(&roster);

    let service = match &config.remote {
        Some(remote) => match HttpSuggestionService::new(remote.clone()) {
            Ok(service) => Some(service),
            Err(e) => {
                warn!(error = %e, "remote suggestion service unavailable, using local scheduler");
                None
            }
        },
        None => None,
    };

    let mut timetabler = ExamTimetabler::new(config);
    if let Some(service) = &service {
        timetabler = timetabler.with_remote(service);
    }
    let outcome = timetabler.run(&index)?;

    info!(source = %outcome.source, "schedule committed");
    println!("\n--- Scheduling Statistics ---");
    println!("Schedule source: {}", outcome.source);
    println!("Total Courses Requested: {}", index.course_count());
    println!("Total Courses Scheduled: {}", outcome.schedule.assignment_count());
    println!("Total Scheduling Days Used: {}", outcome.report.days_used);
    println!("Unresolved Student Conflicts (Post-Check): {}", outcome.conflicts.len());
    println!("Courses Not Scheduled: {}", outcome.schedule.unscheduled_count());

    if !outcome.conflicts.is_empty() {
        println!("\n--- Student Conflicts ---");
        for conflict in &outcome.conflicts {
            println!("{conflict}");
        }
    }

    save_schedule_csv(&cli.output, &outcome.schedule, &outcome.slots)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    println!("\nSchedule saved to {}", cli.output.display());

    if let Some(dir) = &cli.student_dir {
        let files = save_student_csvs(dir, &outcome.schedule, &index, &outcome.slots)
            .with_context(|| format!("writing student schedules to {}", dir.display()))?;
        println!("Saved {files} student schedules to {}", dir.display());
    }

    let report = outcome.report.to_string();
    println!("\n{report}");
    if let Some(path) = &cli.report {
        fs::write(path, &report).with_context(|| format!("writing report {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}
