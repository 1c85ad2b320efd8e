use crate::error::Result;
use crate::ledger::ProcessedFilesLedger;
use crate::models::RawObservation;
use crate::processors::StageOutcome;
use crate::readers::HourlyDumpReader;
use crate::utils::constants::{RAW_FILE_EXTENSION, SHARD_EXTENSION};
use crate::utils::names::{raw_date_stamp, station_folder_name};
use crate::utils::DataLayout;
use crate::writers::csv_writer::write_csv_atomic;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub source: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub shards_written: usize,
    pub write_errors: usize,
    /// Whether the source made it into the processed-file ledger
    pub recorded: bool,
}

/// Raw tier -> filtered tier: keep in-scope stations, shard per station
pub struct IngestFilter<'a> {
    layout: &'a DataLayout,
    stations: &'a BTreeSet<String>,
    ledger: ProcessedFilesLedger,
    reader: HourlyDumpReader,
}

impl<'a> IngestFilter<'a> {
    pub fn new(layout: &'a DataLayout, stations: &'a BTreeSet<String>) -> Self {
        Self {
            layout,
            stations,
            ledger: ProcessedFilesLedger::new(layout.filtered_ledger()),
            reader: HourlyDumpReader::new(),
        }
    }

    /// Raw dumps that the ledger has not seen yet, oldest name first
    pub fn pending_files(&self) -> Result<Vec<PathBuf>> {
        let raw_dir = self.layout.raw_dir();
        if !raw_dir.exists() {
            return Ok(Vec::new());
        }

        let processed: BTreeSet<String> = self
            .ledger
            .entries()?
            .into_iter()
            .map(|e| e.relative_path)
            .collect();

        let mut pending = Vec::new();
        for entry in std::fs::read_dir(&raw_dir)? {
            let path = entry?.path();
            let is_raw = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(RAW_FILE_EXTENSION);

            if is_raw && !processed.contains(&self.layout.raw_ledger_key(&path)) {
                pending.push(path);
            }
        }

        pending.sort();
        Ok(pending)
    }

    /// Filter one raw dump into per-station shards.
    ///
    /// A source already in the ledger is skipped. The source is recorded
    /// only when every shard was written.
    pub fn ingest(&self, raw_file: &Path) -> Result<StageOutcome<IngestSummary>> {
        let key = self.layout.raw_ledger_key(raw_file);
        if self.ledger.contains(&key)? {
            info!(source = %key, "Raw file already processed, skipping");
            return Ok(StageOutcome::skipped(format!("{} already in ledger", key)));
        }

        let dump = self.reader.read_dump(raw_file)?;
        let rows_read = dump.rows.len();

        let by_station = self.group_in_scope(dump.rows);
        let rows_kept = by_station.values().map(Vec::len).sum();
        let date_stamp = raw_date_stamp(raw_file);

        let mut shards_written = 0;
        let mut write_errors = 0;

        for (station, rows) in &by_station {
            let shard = self
                .layout
                .shard_dir(&station_folder_name(station))
                .join(format!("{}.{}", date_stamp, SHARD_EXTENSION));

            match write_csv_atomic(&shard, rows) {
                Ok(_) => shards_written += 1,
                Err(e) => {
                    write_errors += 1;
                    error!("Failed to write shard {}: {}", shard.display(), e);
                }
            }
        }

        let recorded = write_errors == 0;
        if recorded {
            self.ledger.record(&key)?;
        }

        info!(
            source = %key,
            rows = rows_kept,
            shards = shards_written,
            errors = write_errors,
            "Ingested raw file"
        );

        Ok(StageOutcome::Completed(IngestSummary {
            source: key,
            rows_read,
            rows_kept,
            shards_written,
            write_errors,
            recorded,
        }))
    }

    /// Rows of in-scope stations grouped by exact trimmed station name
    fn group_in_scope(&self, rows: Vec<RawObservation>) -> BTreeMap<String, Vec<RawObservation>> {
        let mut grouped: BTreeMap<String, Vec<RawObservation>> = BTreeMap::new();

        for mut row in rows {
            let name = row.station_name.trim().to_string();
            if self.stations.contains(&name) {
                row.station_name = name.clone();
                grouped.entry(name).or_default().push(row);
            }
        }

        grouped
    }
}
