//! The `grades` chat command: argument parsing, lookup and reply text

use std::path::PathBuf;
use tracing::{info, warn};

use crate::chart;
use crate::config::Config;
use crate::error::CommandError;
use crate::lookup::{candidates, distinct_terms, lookup, LookupResult};
use crate::snapshot;
use crate::types::{GradeRecord, Snapshot};

/// Parsed `grades` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradesQuery {
    pub course: String,
    /// Upper-cased for display; matching ignores case anyway
    pub surname: String,
    /// Everything after the surname, so "Fall 2024" stays one term
    pub term: Option<String>,
}

/// What goes back to the chat: text plus an optional chart attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub chart: Option<PathBuf>,
}

impl Reply {
    fn text(text: String) -> Self {
        Self { text, chart: None }
    }
}

/// Split `course surname [term...]`
pub fn parse_args(args: &str) -> Result<GradesQuery, CommandError> {
    let mut tokens = args.split_whitespace();
    let (Some(course), Some(surname)) = (tokens.next(), tokens.next()) else {
        return Err(CommandError::Usage);
    };

    let rest: Vec<&str> = tokens.collect();
    Ok(GradesQuery {
        course: course.to_string(),
        surname: surname.to_uppercase(),
        term: (!rest.is_empty()).then(|| rest.join(" ")),
    })
}

fn usage_text(config: &Config) -> String {
    format!(
        "Please provide at least a course number and professor's last name (e.g., {}grades 111 BOKLAN)",
        config.command_prefix
    )
}

fn found_text(record: &GradeRecord, department: &str) -> String {
    let breakdown = record
        .grade_counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(grade, count)| format!("{}: {}", grade, count))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "**Professor {} - {} {} ({})**\nAverage GPA: {:.2}\n\nGrade Breakdown:\n{}",
        record.professor_name,
        department,
        record.course_number,
        record.term,
        record.average_gpa,
        breakdown
    )
}

/// Turn a lookup outcome into a reply, rendering the chart for a hit
pub fn answer(snapshot: &Snapshot, query: &GradesQuery, config: &Config) -> Reply {
    let dept = &config.department;
    let course = &query.course;
    let prof = &query.surname;

    match lookup(snapshot, course, prof, query.term.as_deref()) {
        LookupResult::Found(record) => {
            info!(key = %record.key(), students = record.grade_counts.total(), "lookup found");
            let title = format!(
                "{} - {} {} Grade Distribution",
                record.professor_name, dept, record.course_number
            );
            let path = chart::chart_path(&config.chart_dir, &record.key());
            let chart = match chart::render_chart(&record.grade_counts, &title, &path) {
                Ok(()) => Some(path),
                Err(e) => {
                    warn!("chart not rendered: {:#}", e);
                    None
                }
            };
            Reply {
                text: found_text(record, dept),
                chart,
            }
        }
        LookupResult::NotFound => {
            info!(course = %course, surname = %prof, "lookup found nothing");
            Reply::text(format!(
                "No data found for {} {} with Professor {} in any term.",
                dept, course, prof
            ))
        }
        LookupResult::AmbiguousTerm { available_terms } => {
            info!(terms = available_terms.len(), "lookup needs a term");
            Reply::text(format!(
                "Data available for {} {} with Professor {} in the following terms: {}",
                dept,
                course,
                prof,
                available_terms.join(", ")
            ))
        }
        LookupResult::TermNotFound {
            requested,
            normalized,
            available_terms,
        } => {
            info!(requested = %requested, normalized = %normalized, "lookup term not on file");
            Reply::text(format!(
                "No data found for {} {} with Professor {} in {} (looked for {}). Data is available for the following terms: {}",
                dept,
                course,
                prof,
                requested,
                normalized,
                available_terms.join(", ")
            ))
        }
    }
}

/// Text for the `terms` subcommand: one term per line, or a not-found line
pub fn terms_text(snapshot: &Snapshot, course: &str, surname: &str, config: &Config) -> String {
    let matches = candidates(snapshot, course, surname);
    if matches.is_empty() {
        return format!(
            "No data found for {} {} with Professor {}.",
            config.department,
            course,
            surname.to_uppercase()
        );
    }
    distinct_terms(&matches).join("\n")
}

fn try_handle(args: &str, config: &Config) -> Result<Reply, CommandError> {
    let query = parse_args(args)?;
    let snapshot =
        snapshot::load(&config.snapshot_path).map_err(CommandError::DataUnavailable)?;
    Ok(answer(&snapshot, &query, config))
}

/// Handle one `grades` command end to end.
///
/// The snapshot is re-read per command so a fresh ingestion is picked up
/// without a restart. Every failure becomes a reply.
pub fn handle(args: &str, config: &Config) -> Reply {
    info!(args = %args, "received grades command");
    match try_handle(args, config) {
        Ok(reply) => reply,
        Err(CommandError::Usage) => Reply::text(usage_text(config)),
        Err(e @ CommandError::DataUnavailable(_)) => {
            warn!("{}", e);
            Reply::text("Error loading grade data. Please try again later.".to_string())
        }
    }
}
