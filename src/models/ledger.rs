use serde::{Deserialize, Serialize};

/// Row of `filtered/processed-ledger.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFileEntry {
    #[serde(rename = "relative-path")]
    pub relative_path: String,
    pub timestamp: String,
}

/// Row of `enriched/processed-ledger.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRunEntry {
    pub timestamp: String,
    pub dataset: String,
    #[serde(rename = "coverage-start")]
    pub coverage_start: Option<String>,
    #[serde(rename = "coverage-end")]
    pub coverage_end: Option<String>,
    #[serde(rename = "row-count")]
    pub row_count: usize,
}
