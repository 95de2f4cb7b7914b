//! Grade record types and their snapshot serialization

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Grade labels in display order. Charts and summaries follow this order.
pub const GRADE_LABELS: [&str; 15] = [
    "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "F", "W", "P", "INC/NA",
];

/// Snapshot: composite key -> record
pub type Snapshot = BTreeMap<String, GradeRecord>;

/// Per-label student counts, always holding all fifteen labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeCounts([u64; 15]);

impl GradeCounts {
    fn index_of(label: &str) -> Option<usize> {
        GRADE_LABELS.iter().position(|l| *l == label)
    }

    pub fn is_label(label: &str) -> bool {
        Self::index_of(label).is_some()
    }

    /// Count for a label; unknown labels read as zero
    #[cfg(test)]
    pub fn get(&self, label: &str) -> u64 {
        Self::index_of(label).map(|i| self.0[i]).unwrap_or(0)
    }

    /// Returns false if `label` is not a grade label
    pub fn set(&mut self, label: &str, count: u64) -> bool {
        match Self::index_of(label) {
            Some(i) => {
                self.0[i] = count;
                true
            }
            None => false,
        }
    }

    /// (label, count) pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        GRADE_LABELS.iter().copied().zip(self.0.iter().copied())
    }

    pub fn total(&self) -> u64 {
        self.0.iter().fold(0, |sum, n| sum.saturating_add(*n))
    }
}

impl Serialize for GradeCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(GRADE_LABELS.len()))?;
        for (label, count) in self.iter() {
            map.serialize_entry(label, &count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GradeCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountsVisitor;

        impl<'de> Visitor<'de> for CountsVisitor {
            type Value = GradeCounts;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of grade label to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut counts = GradeCounts::default();
                while let Some((label, count)) = access.next_entry::<String, u64>()? {
                    // Labels outside the fixed set are dropped
                    counts.set(&label, count);
                }
                Ok(counts)
            }
        }

        deserializer.deserialize_map(CountsVisitor)
    }
}

/// One professor/course/term offering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    /// Surname-first, as it appeared in the export ("BOKLAN, KENNETH")
    #[serde(rename = "name")]
    pub professor_name: String,
    pub term: String,
    #[serde(rename = "course")]
    pub course_number: String,
    #[serde(rename = "grades")]
    pub grade_counts: GradeCounts,
    #[serde(rename = "avg_gpa")]
    pub average_gpa: f64,
}

impl GradeRecord {
    pub fn key(&self) -> String {
        composite_key(&self.professor_name, &self.course_number, &self.term)
    }

    /// Text before the first comma of the stored name
    pub fn surname(&self) -> &str {
        self.professor_name
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

/// Build the `"PROFESSOR, COURSE, TERM"` snapshot key
pub fn composite_key(professor: &str, course: &str, term: &str) -> String {
    format!("{}, {}, {}", professor, course, term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GradeRecord {
        let mut counts = GradeCounts::default();
        counts.set("A", 12);
        counts.set("INC/NA", 1);
        GradeRecord {
            professor_name: "BOKLAN, KENNETH".to_string(),
            term: "FA24".to_string(),
            course_number: "111".to_string(),
            grade_counts: counts,
            average_gpa: 3.1416,
        }
    }

    #[test]
    fn test_key_and_surname() {
        let record = sample();
        assert_eq!(record.key(), "BOKLAN, KENNETH, 111, FA24");
        assert_eq!(record.surname(), "BOKLAN");
    }

    #[test]
    fn test_unknown_label_is_ignored() {
        let mut counts = GradeCounts::default();
        assert!(!counts.set("E", 4));
        assert_eq!(counts.get("E"), 0);
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_total_saturates() {
        let mut counts = GradeCounts::default();
        counts.set("A", u64::MAX);
        counts.set("B", 7);
        assert_eq!(counts.total(), u64::MAX);
    }

    #[test]
    fn test_json_shape_keeps_label_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.starts_with(r#"{"name":"BOKLAN, KENNETH","term":"FA24","course":"111","grades":{"A+":0,"A":12,"A-":0"#));
        assert!(json.contains(r#""INC/NA":1},"avg_gpa":3.1416"#));

        let back: GradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_partial_grades_default_to_zero() {
        let json = r#"{"name":"X","term":"SP23","course":"240","grades":{"B":3},"avg_gpa":2.5}"#;
        let record: GradeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.grade_counts.get("B"), 3);
        assert_eq!(record.grade_counts.get("A"), 0);
        assert_eq!(record.grade_counts.iter().count(), 15);
    }
}
