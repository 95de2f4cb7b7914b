use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::num::IntErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::snapshot;
use crate::term::normalize_term;
use crate::types::{composite_key, GradeCounts, GradeRecord, Snapshot};

/// Header aliases seen across the department's exports
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("TERM", "term"),
    ("Term", "term"),
    ("SUBJECT", "subject"),
    ("NBR", "course_number"),
    ("Course Number", "course_number"),
    ("PROF", "professor"),
    ("Instructor", "instructor"),
    ("AVG GPA", "avg_gpa"),
    ("Average GPA", "avg_gpa"),
    ("INC/NA", "inc_na"),
    ("Inc/No Grade", "inc_na"),
    ("W", "W"),
    ("Withdrawal", "W"),
];

/// One header row and the data rows under it
#[derive(Debug, Clone, PartialEq)]
pub struct RawTableBlock {
    /// Normalized header names
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTableBlock {
    fn new(header_row: &[String]) -> Self {
        Self {
            headers: header_row.iter().map(|h| normalize_header(h)).collect(),
            rows: Vec::new(),
        }
    }
}

/// Counters reported at the end of an ingestion run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub blocks: usize,
    pub rows: usize,
    pub short_rows: usize,
    pub other_subject: usize,
    pub incomplete: usize,
    pub duplicates: usize,
    pub records: usize,
}

/// Why a data row did not become a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowSkip {
    Short,
    OtherSubject,
    Incomplete,
}

/// Map an export header to its canonical field name.
///
/// Grade labels are kept verbatim, unknown headers are lower-cased.
pub fn normalize_header(header: &str) -> String {
    let cleaned = header.replace(['\n', '\r'], "");
    let cleaned = cleaned.trim();

    if let Some((_, canonical)) = HEADER_ALIASES.iter().find(|(alias, _)| *alias == cleaned) {
        return canonical.to_string();
    }
    if GradeCounts::is_label(cleaned) {
        return cleaned.to_string();
    }
    cleaned.to_lowercase()
}

fn is_header_row(row: &[String]) -> bool {
    row.iter()
        .any(|cell| cell.replace(['\n', '\r'], "").trim().to_uppercase() == "TERM")
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Whether a quoted field is still open at the end of `line`.
///
/// A quote only opens a field when it is the field's first character, the
/// same rule the csv reader applies; stray quotes elsewhere are literal.
fn quoted_after(line: &str, mut in_quotes: bool) -> bool {
    let mut chars = line.chars().peekable();
    let mut field_start = true;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            field_start = false;
            continue;
        }
        match c {
            '"' if field_start => in_quotes = true,
            ',' | '\n' | '\r' => field_start = true,
            _ => field_start = false,
        }
    }
    in_quotes
}

/// Split text at empty lines that sit outside quoted fields.
///
/// The csv reader drops empty lines on its own, which would glue adjacent
/// tables together, so separators are found before parsing.
fn split_on_blank_lines(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    let mut in_quotes = false;

    for line in text.split_inclusive('\n') {
        if !in_quotes && line.trim().is_empty() {
            if pos > start {
                segments.push(&text[start..pos]);
            }
            start = pos + line.len();
        }
        in_quotes = quoted_after(line, in_quotes);
        pos += line.len();
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }
    segments
}

/// Parse CSV text into rows; an empty row stands in for each blank-line gap
pub fn read_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let text = text.trim_start_matches('\u{feff}');
    let mut rows = Vec::new();

    for (i, segment) in split_on_blank_lines(text).into_iter().enumerate() {
        if i > 0 {
            rows.push(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(segment.as_bytes());
        for record in reader.records() {
            let record = record.context("Failed to parse CSV record")?;
            rows.push(record.iter().map(str::to_string).collect());
        }
    }

    Ok(rows)
}

/// Group rows into header-led blocks
pub fn split_blocks<I>(rows: I) -> Vec<RawTableBlock>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut blocks = Vec::new();
    let mut current: Option<RawTableBlock> = None;

    for row in rows {
        if is_blank(&row) {
            blocks.extend(current.take());
        } else if is_header_row(&row) {
            blocks.extend(current.take());
            current = Some(RawTableBlock::new(&row));
        } else if let Some(block) = current.as_mut() {
            block.rows.push(row);
        }
        // Rows before any header are dropped
    }
    blocks.extend(current);

    blocks
}

/// Non-numeric cells count as zero; counts too large for u64 saturate
fn parse_count(value: &str) -> u64 {
    match value.trim().parse::<u64>() {
        Ok(n) => n,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => u64::MAX,
        Err(_) => 0,
    }
}

fn parse_gpa(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn parse_row(headers: &[String], row: &[String], department: &str) -> Result<GradeRecord, RowSkip> {
    if row.len() < headers.len() {
        return Err(RowSkip::Short);
    }

    let fields: HashMap<&str, &str> = headers
        .iter()
        .map(String::as_str)
        .zip(row.iter().map(String::as_str))
        .collect();
    let field = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or("");

    if !field("subject").eq_ignore_ascii_case(department) {
        return Err(RowSkip::OtherSubject);
    }

    let term = normalize_term(field("term"));
    let professor = match field("professor") {
        "" => field("instructor"),
        p => p,
    };
    let course = field("course_number");
    if term.is_empty() || professor.is_empty() || course.is_empty() {
        return Err(RowSkip::Incomplete);
    }

    let mut grade_counts = GradeCounts::default();
    for (header, value) in &fields {
        grade_counts.set(header, parse_count(value));
    }
    if let Some(value) = fields.get("inc_na") {
        grade_counts.set("INC/NA", parse_count(value));
    }

    Ok(GradeRecord {
        professor_name: professor.to_string(),
        term,
        course_number: course.to_string(),
        grade_counts,
        average_gpa: parse_gpa(field("avg_gpa")),
    })
}

/// Turn blocks into a snapshot. The first row seen for a key wins.
pub fn build_snapshot(blocks: &[RawTableBlock], department: &str) -> (Snapshot, IngestStats) {
    let mut snapshot = Snapshot::new();
    let mut stats = IngestStats {
        blocks: blocks.len(),
        ..Default::default()
    };

    for block in blocks {
        debug!(
            headers = block.headers.len(),
            rows = block.rows.len(),
            "processing block"
        );

        for row in &block.rows {
            stats.rows += 1;
            let record = match parse_row(&block.headers, row, department) {
                Ok(record) => record,
                Err(RowSkip::Short) => {
                    stats.short_rows += 1;
                    continue;
                }
                Err(RowSkip::OtherSubject) => {
                    stats.other_subject += 1;
                    continue;
                }
                Err(RowSkip::Incomplete) => {
                    stats.incomplete += 1;
                    continue;
                }
            };

            let key = composite_key(&record.professor_name, &record.course_number, &record.term);
            if snapshot.contains_key(&key) {
                stats.duplicates += 1;
                continue;
            }
            snapshot.insert(key, record);
        }
    }

    stats.records = snapshot.len();
    (snapshot, stats)
}

/// Parse a full CSV export into a snapshot
pub fn ingest_str(text: &str, department: &str) -> Result<(Snapshot, IngestStats)> {
    let rows = read_rows(text)?;
    let blocks = split_blocks(rows);
    Ok(build_snapshot(&blocks, department))
}

pub fn run_ingest(input: &Path, output: &Path, department: &str) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read CSV export: {}", input.display()))?;

    let (snapshot, stats) = ingest_str(&text, department)?;
    info!(
        blocks = stats.blocks,
        rows = stats.rows,
        short = stats.short_rows,
        other_subject = stats.other_subject,
        incomplete = stats.incomplete,
        duplicates = stats.duplicates,
        records = stats.records,
        "ingestion finished"
    );

    snapshot::save(output, &snapshot)?;

    println!("Successfully processed {} course sections", stats.records);
    println!("Data written to {}", output.display());
    Ok(())
}
