use crate::error::Result;
use crate::writers::csv_writer::{write_csv_atomic, write_text_atomic};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Per-column summary of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column: String,
    pub kind: String,
    pub non_null: usize,
    pub null: usize,
    pub null_pct: f64,
    pub min: Option<String>,
    pub max: Option<String>,
    pub distinct: usize,
}

#[derive(Default)]
struct ColumnAccumulator {
    non_null: usize,
    null: usize,
    numeric: Option<(f64, f64)>,
    text: Option<(String, String)>,
    distinct: BTreeSet<String>,
}

impl ColumnAccumulator {
    fn push(&mut self, value: &Value) {
        match value {
            Value::Null => self.null += 1,
            Value::Number(n) => {
                self.non_null += 1;
                if let Some(v) = n.as_f64() {
                    self.numeric = Some(match self.numeric {
                        None => (v, v),
                        Some((lo, hi)) => (lo.min(v), hi.max(v)),
                    });
                }
                self.distinct.insert(n.to_string());
            }
            other => {
                self.non_null += 1;
                let text = match other {
                    Value::String(s) => s.clone(),
                    v => v.to_string(),
                };
                self.text = Some(match self.text.take() {
                    None => (text.clone(), text.clone()),
                    Some((lo, hi)) => (lo.min(text.clone()), hi.max(text.clone())),
                });
                self.distinct.insert(text);
            }
        }
    }

    fn finish(self, column: String) -> ColumnProfile {
        let total = self.non_null + self.null;
        let (kind, min, max) = match (self.numeric, self.text) {
            (Some((lo, hi)), None) => ("numeric", Some(lo.to_string()), Some(hi.to_string())),
            (_, Some((lo, hi))) => ("text", Some(lo), Some(hi)),
            (None, None) => ("empty", None, None),
        };

        ColumnProfile {
            column,
            kind: kind.to_string(),
            non_null: self.non_null,
            null: self.null,
            null_pct: if total == 0 {
                0.0
            } else {
                crate::utils::round_to(100.0 * self.null as f64 / total as f64, 2)
            },
            min,
            max,
            distinct: self.distinct.len(),
        }
    }
}

/// Profile every serialised field of `records`, sorted by column name
pub fn profile_columns<T: Serialize>(records: &[T]) -> Result<Vec<ColumnProfile>> {
    let mut columns: BTreeMap<String, ColumnAccumulator> = BTreeMap::new();

    for record in records {
        let Value::Object(fields) = serde_json::to_value(record)? else {
            continue;
        };
        for (name, value) in &fields {
            columns.entry(name.clone()).or_default().push(value);
        }
    }

    Ok(columns
        .into_iter()
        .map(|(name, acc)| acc.finish(name))
        .collect())
}

/// Descriptive metadata for a produced dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub dataset: String,
    pub source: String,
    pub province: String,
    pub stations: Vec<String>,
    pub coverage_start: Option<String>,
    pub coverage_end: Option<String>,
    pub frequency: String,
    pub rows: usize,
    pub processed_at: String,
}

pub fn write_column_profile(path: &Path, profile: &[ColumnProfile]) -> Result<usize> {
    write_csv_atomic(path, profile)
}

pub fn write_dataset_info(path: &Path, info: &DatasetInfo) -> Result<()> {
    let json = serde_json::to_string_pretty(info)?;
    write_text_atomic(path, &json)
}
