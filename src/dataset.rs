//! Profiler file ingestion.

use serde::Serialize;
use serde_json::Value;

use std::collections::HashSet;
use std::path::Path;

use crate::{ProfviewError, ProfviewResult, Record};

/// Top-level key holding the record array.
pub const PROFILER_KEY: &str = "profiler";

/// Immutable set of records from one profiler file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Distinct section names in first-occurrence order.
    pub sections: Vec<String>,
    /// blake3 hex digest of the raw text this dataset was parsed from.
    pub fingerprint: String,
}

impl Dataset {
    pub fn parse(text: &str) -> ProfviewResult<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| ProfviewError::Parse(format!("invalid JSON: {e}")))?;
        let Value::Object(mut root) = root else {
            return Err(ProfviewError::Parse(
                "expected a JSON object at the top level".to_string(),
            ));
        };
        let items = match root.remove(PROFILER_KEY) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ProfviewError::Parse(format!(
                    "`{PROFILER_KEY}` must be an array of records"
                )));
            }
            None => {
                return Err(ProfviewError::Parse(format!(
                    "missing top-level `{PROFILER_KEY}` array"
                )));
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                return Err(ProfviewError::Parse(format!(
                    "`{PROFILER_KEY}[{idx}]` is not an object"
                )));
            }
            let record: Record = serde_json::from_value(item).map_err(|e| {
                ProfviewError::Parse(format!("`{PROFILER_KEY}[{idx}]`: {e}"))
            })?;
            records.push(record);
        }

        let sections = distinct_sections(&records);
        let fingerprint = blake3::hash(text.as_bytes()).to_hex().to_string();
        tracing::debug!(
            records = records.len(),
            sections = sections.len(),
            %fingerprint,
            "parsed profiler dataset"
        );
        Ok(Self {
            records,
            sections,
            fingerprint,
        })
    }

    pub fn load(path: &Path) -> ProfviewResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records per section, in section order.
    pub fn section_counts(&self) -> Vec<(String, usize)> {
        self.sections
            .iter()
            .map(|name| {
                let count = self
                    .records
                    .iter()
                    .filter(|r| &r.section_name == name)
                    .count();
                (name.clone(), count)
            })
            .collect()
    }
}

fn distinct_sections(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        if seen.insert(record.section_name.as_str()) {
            out.push(record.section_name.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metric;

    const SAMPLE: &str = r#"{
        "profiler": [
            {"Section Name": "Trig", "Avg Time": 1, "Max Time": 2, "Min Time": 0.5, "Total Time": 3, "Timeline": [0.5, 2, 0.5]},
            {"Section Name": "Rand", "Avg Time": "0.25", "Max Time": "0.25", "Min Time": "0.25", "Total Time": "0.25", "Timeline": [0.25]},
            {"Section Name": "Trig", "Avg Time": 4, "Max Time": 4, "Min Time": 4, "Total Time": 4, "Timeline": []}
        ]
    }"#;

    #[test]
    fn parse_collects_records_and_distinct_sections() {
        let ds = Dataset::parse(SAMPLE).expect("dataset");
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.sections, vec!["Trig".to_string(), "Rand".to_string()]);
        assert_eq!(ds.records[1].value(Metric::Avg), 0.25);
        assert_eq!(
            ds.section_counts(),
            vec![("Trig".to_string(), 2), ("Rand".to_string(), 1)]
        );
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Dataset::parse(SAMPLE).expect("a");
        let b = Dataset::parse(SAMPLE).expect("b");
        let c = Dataset::parse(r#"{"profiler": []}"#).expect("c");
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
        assert!(c.is_empty());
    }

    #[test]
    fn invalid_inputs_are_parse_errors() {
        for text in [
            "not json",
            "[1, 2]",
            r#"{"other": []}"#,
            r#"{"profiler": {"Section Name": "a"}}"#,
            r#"{"profiler": [1]}"#,
        ] {
            match Dataset::parse(text) {
                Err(ProfviewError::Parse(_)) => {}
                other => panic!("expected parse error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn load_reports_missing_file_as_io() {
        let err = Dataset::load(Path::new("definitely-missing-profiler.json"))
            .expect_err("must fail");
        assert!(matches!(err, ProfviewError::Io(_)), "got {err:?}");
    }
}
