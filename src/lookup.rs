//! Course/professor/term lookup over a loaded snapshot

use std::collections::BTreeSet;

use crate::term::normalize_term;
use crate::types::{GradeRecord, Snapshot};

/// Outcome of a lookup. Misses are ordinary results, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult<'a> {
    Found(&'a GradeRecord),
    /// No record for this course and surname in any term
    NotFound,
    /// No term given and several are on file
    AmbiguousTerm { available_terms: Vec<String> },
    TermNotFound {
        requested: String,
        normalized: String,
        available_terms: Vec<String>,
    },
}

/// All records for a course taught by `surname`, in key order
pub fn candidates<'a>(snapshot: &'a Snapshot, course: &str, surname: &str) -> Vec<&'a GradeRecord> {
    let course = course.trim();
    let surname = surname.trim();
    snapshot
        .values()
        .filter(|r| r.course_number == course && r.surname().to_uppercase() == surname.to_uppercase())
        .collect()
}

/// Sorted, de-duplicated terms across records
pub fn distinct_terms(records: &[&GradeRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.term.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Find the offering for a course, professor surname and optional term.
///
/// Without a term, a single term on file is returned directly; several terms
/// yield `AmbiguousTerm` so the caller can ask which one.
pub fn lookup<'a>(
    snapshot: &'a Snapshot,
    course: &str,
    surname: &str,
    term: Option<&str>,
) -> LookupResult<'a> {
    let matches = candidates(snapshot, course, surname);
    if matches.is_empty() {
        return LookupResult::NotFound;
    }

    let available_terms = distinct_terms(&matches);

    let Some(requested) = term else {
        return if available_terms.len() == 1 {
            LookupResult::Found(matches[0])
        } else {
            LookupResult::AmbiguousTerm { available_terms }
        };
    };

    let normalized = normalize_term(requested);
    match matches.into_iter().find(|r| r.term == normalized) {
        Some(record) => LookupResult::Found(record),
        None => LookupResult::TermNotFound {
            requested: requested.trim().to_string(),
            normalized,
            available_terms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GradeCounts;

    fn record(name: &str, course: &str, term: &str) -> GradeRecord {
        GradeRecord {
            professor_name: name.to_string(),
            term: term.to_string(),
            course_number: course.to_string(),
            grade_counts: GradeCounts::default(),
            average_gpa: 3.0,
        }
    }

    fn snapshot(records: Vec<GradeRecord>) -> Snapshot {
        records.into_iter().map(|r| (r.key(), r)).collect()
    }

    #[test]
    fn test_single_record_lookups() {
        let snap = snapshot(vec![record("BOKLAN", "111", "FA24")]);

        assert!(matches!(lookup(&snap, "111", "BOKLAN", Some("FA24")), LookupResult::Found(r) if r.term == "FA24"));
        assert!(matches!(lookup(&snap, "111", "BOKLAN", Some("Fall 2024")), LookupResult::Found(_)));
        assert_eq!(
            lookup(&snap, "111", "BOKLAN", Some("SP24")),
            LookupResult::TermNotFound {
                requested: "SP24".to_string(),
                normalized: "SP24".to_string(),
                available_terms: vec!["FA24".to_string()],
            }
        );
        assert_eq!(lookup(&snap, "999", "BOKLAN", None), LookupResult::NotFound);
    }

    #[test]
    fn test_no_term_with_one_term_on_file_is_found() {
        let snap = snapshot(vec![record("BOKLAN", "111", "FA24")]);
        assert!(matches!(lookup(&snap, "111", "BOKLAN", None), LookupResult::Found(_)));
    }

    #[test]
    fn test_no_term_with_several_terms_lists_them() {
        let snap = snapshot(vec![
            record("BOKLAN", "111", "SP24"),
            record("BOKLAN", "111", "FA23"),
            record("BOKLAN", "111", "FA24"),
            record("BOKLAN", "112", "SP22"),
        ]);
        assert_eq!(
            lookup(&snap, "111", "BOKLAN", None),
            LookupResult::AmbiguousTerm {
                available_terms: vec!["FA23".to_string(), "FA24".to_string(), "SP24".to_string()],
            }
        );
    }

    #[test]
    fn test_surname_matches_before_first_comma_only() {
        let snap = snapshot(vec![record("Boklan, Kenneth", "111", "FA24")]);

        assert!(matches!(lookup(&snap, "111", "boklan", Some("FA24")), LookupResult::Found(_)));
        assert_eq!(lookup(&snap, "111", "Kenneth", Some("FA24")), LookupResult::NotFound);
        assert_eq!(lookup(&snap, "111", "Boklan, Kenneth", Some("FA24")), LookupResult::NotFound);
    }

    #[test]
    fn test_course_is_compared_as_text() {
        let snap = snapshot(vec![record("BOKLAN", "111", "FA24")]);
        assert_eq!(lookup(&snap, "0111", "BOKLAN", None), LookupResult::NotFound);
        assert_eq!(lookup(&snap, "111.0", "BOKLAN", None), LookupResult::NotFound);
    }

    #[test]
    fn test_term_not_found_keeps_raw_text() {
        let snap = snapshot(vec![
            record("BOKLAN", "111", "FA24"),
            record("BOKLAN", "111", "FA24X"),
        ]);
        match lookup(&snap, "111", "BOKLAN", Some("Winter 2024")) {
            LookupResult::TermNotFound {
                requested,
                normalized,
                available_terms,
            } => {
                assert_eq!(requested, "Winter 2024");
                assert_eq!(normalized, "WINTER 2024");
                assert_eq!(available_terms, vec!["FA24", "FA24X"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
