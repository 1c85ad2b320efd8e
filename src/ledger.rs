//! Append-only processing ledgers.
//!
//! A ledger is a CSV file that only ever grows. Writers follow a
//! single-writer-per-process contract: each call to [`Ledger::append`]
//! serialises its whole batch up front and hands it to the OS in one
//! `write_all` on an append-mode handle. Appends from several processes
//! are not locked against each other.

use crate::error::Result;
use crate::models::{DatasetRunEntry, ProcessedFileEntry};
use crate::utils::constants::LEDGER_TIMESTAMP_FORMAT;
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

pub fn ledger_timestamp() -> String {
    Local::now().format(LEDGER_TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone)]
pub struct Ledger<E> {
    path: PathBuf,
    _entry: PhantomData<E>,
}

impl<E> Ledger<E>
where
    E: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in append order; an absent ledger is empty
    pub fn entries(&self) -> Result<Vec<E>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for entry in reader.deserialize() {
            entries.push(entry?);
        }
        Ok(entries)
    }

    pub fn append(&self, entries: &[E]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let write_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(Vec::new());
        for entry in entries {
            writer.serialize(entry)?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&buffer)?;
        file.flush()?;

        Ok(())
    }
}

/// Idempotency guard of the ingest stage, keyed by raw file path
pub type ProcessedFilesLedger = Ledger<ProcessedFileEntry>;

impl Ledger<ProcessedFileEntry> {
    pub fn contains(&self, relative_path: &str) -> Result<bool> {
        Ok(self
            .entries()?
            .iter()
            .any(|e| e.relative_path == relative_path))
    }

    pub fn record(&self, relative_path: &str) -> Result<()> {
        self.append(&[ProcessedFileEntry {
            relative_path: relative_path.to_string(),
            timestamp: ledger_timestamp(),
        }])
    }
}

/// Audit trail of enriched datasets written
pub type DatasetRunLedger = Ledger<DatasetRunEntry>;

impl Ledger<DatasetRunEntry> {
    pub fn latest(&self, dataset: &str) -> Result<Option<DatasetRunEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.dataset == dataset)
            .last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_processed_files_ledger() -> Result<()> {
        let dir = TempDir::new()?;
        let ledger = ProcessedFilesLedger::new(dir.path().join("filtered/processed-ledger.csv"));

        assert!(!ledger.contains("datohorario20240101.txt")?);
        ledger.record("datohorario20240101.txt")?;
        ledger.record("datohorario20240102.txt")?;

        assert!(ledger.contains("datohorario20240101.txt")?);
        assert_eq!(ledger.entries()?.len(), 2);

        let text = std::fs::read_to_string(ledger.path())?;
        assert!(text.starts_with("relative-path,timestamp\n"));
        assert_eq!(text.matches("relative-path").count(), 1);

        Ok(())
    }

    #[test]
    fn test_dataset_run_ledger_latest() -> Result<()> {
        let dir = TempDir::new()?;
        let ledger = DatasetRunLedger::new(dir.path().join("processed-ledger.csv"));

        let entry = |ts: &str, rows: usize| DatasetRunEntry {
            timestamp: ts.to_string(),
            dataset: "enriched_daily".to_string(),
            coverage_start: Some("2024-01-01".to_string()),
            coverage_end: None,
            row_count: rows,
        };

        ledger.append(&[entry("2024-01-02 10:00:00", 3)])?;
        ledger.append(&[entry("2024-01-03 10:00:00", 5)])?;

        let latest = ledger.latest("enriched_daily")?.unwrap();
        assert_eq!(latest.row_count, 5);
        assert_eq!(latest.coverage_end, None);
        assert!(ledger.latest("enriched_hourly")?.is_none());

        let text = std::fs::read_to_string(ledger.path())?;
        assert!(text.starts_with("timestamp,dataset,coverage-start,coverage-end,row-count\n"));

        Ok(())
    }
}
