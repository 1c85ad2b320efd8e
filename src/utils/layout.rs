use crate::error::Result;
use crate::utils::constants::*;
use std::path::{Path, PathBuf};

/// Filesystem layout of every tier under one data root.
///
/// ```text
/// <root>/
///   raw/<source-files>
///   filtered/<station>/<date>.csv
///   filtered/processed-ledger.csv
///   cleaned/{hourly,daily}-final.csv
///   enriched/{hourly,daily}.csv
///   enriched/processed-ledger.csv
///   missing-days/<station>.txt
///   missing-hours.csv
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    pub fn filtered_dir(&self) -> PathBuf {
        self.root.join(FILTERED_DIR)
    }

    pub fn cleaned_dir(&self) -> PathBuf {
        self.root.join(CLEANED_DIR)
    }

    pub fn enriched_dir(&self) -> PathBuf {
        self.root.join(ENRICHED_DIR)
    }

    pub fn missing_days_dir(&self) -> PathBuf {
        self.root.join(MISSING_DAYS_DIR)
    }

    pub fn filtered_ledger(&self) -> PathBuf {
        self.filtered_dir().join(PROCESSED_LEDGER_FILE)
    }

    pub fn enriched_ledger(&self) -> PathBuf {
        self.enriched_dir().join(PROCESSED_LEDGER_FILE)
    }

    pub fn cleaned_hourly(&self) -> PathBuf {
        self.cleaned_dir().join(HOURLY_FINAL_FILE)
    }

    pub fn cleaned_daily(&self) -> PathBuf {
        self.cleaned_dir().join(DAILY_FINAL_FILE)
    }

    pub fn atypical_hours(&self) -> PathBuf {
        self.cleaned_dir().join(ATYPICAL_HOURS_FILE)
    }

    pub fn column_profile(&self) -> PathBuf {
        self.cleaned_dir().join(COLUMN_PROFILE_FILE)
    }

    pub fn dataset_info(&self) -> PathBuf {
        self.cleaned_dir().join(DATASET_INFO_FILE)
    }

    pub fn enriched_hourly(&self) -> PathBuf {
        self.enriched_dir().join(ENRICHED_HOURLY_FILE)
    }

    pub fn enriched_daily(&self) -> PathBuf {
        self.enriched_dir().join(ENRICHED_DAILY_FILE)
    }

    pub fn missing_hours(&self) -> PathBuf {
        self.root.join(MISSING_HOURS_FILE)
    }

    pub fn shard_dir(&self, station_folder: &str) -> PathBuf {
        self.filtered_dir().join(station_folder)
    }

    pub fn missing_days_file(&self, station_folder: &str) -> PathBuf {
        self.missing_days_dir().join(format!("{}.txt", station_folder))
    }

    /// Create every tier directory that does not exist yet
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.raw_dir(),
            self.filtered_dir(),
            self.cleaned_dir(),
            self.enriched_dir(),
            self.missing_days_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Key under which a raw file is recorded in the processed-file ledger
    pub fn raw_ledger_key(&self, raw_file: &Path) -> String {
        let relative = raw_file.strip_prefix(self.raw_dir()).unwrap_or(raw_file);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
