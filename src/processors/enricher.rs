use crate::error::Result;
use crate::ledger::{ledger_timestamp, DatasetRunLedger};
use crate::models::{DatasetRunEntry, EnrichedRecord};
use crate::processors::cleaning_aggregator::{read_cleaned_daily, read_cleaned_hourly};
use crate::processors::StageOutcome;
use crate::utils::constants::{DATASET_ENRICHED_DAILY, DATASET_ENRICHED_HOURLY};
use crate::utils::DataLayout;
use crate::writers::csv_writer::write_csv_atomic;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichSummary {
    pub daily_rows: usize,
    pub hourly_rows: usize,
    pub coverage_start: Option<String>,
    pub coverage_end: Option<String>,
}

/// Cleaned tier -> enriched tier, plus one ledger row per dataset written
pub struct DerivedMetricsEnricher<'a> {
    layout: &'a DataLayout,
    ledger: DatasetRunLedger,
}

impl<'a> DerivedMetricsEnricher<'a> {
    pub fn new(layout: &'a DataLayout) -> Self {
        Self {
            layout,
            ledger: DatasetRunLedger::new(layout.enriched_ledger()),
        }
    }

    pub fn ledger(&self) -> &DatasetRunLedger {
        &self.ledger
    }

    pub fn run(&self) -> Result<StageOutcome<EnrichSummary>> {
        let daily_path = self.layout.cleaned_daily();
        let hourly_path = self.layout.cleaned_hourly();

        for path in [&daily_path, &hourly_path] {
            let size = std::fs::metadata(path).map(|m| m.len()).ok();
            match size {
                None => {
                    warn!("Cleaned dataset {} not found, skipping enrichment", path.display());
                    return Ok(StageOutcome::skipped(format!("{} missing", path.display())));
                }
                Some(0) => {
                    warn!("Cleaned dataset {} is empty, skipping enrichment", path.display());
                    return Ok(StageOutcome::skipped(format!("{} empty", path.display())));
                }
                Some(_) => {}
            }
        }

        let enriched: Vec<EnrichedRecord> = read_cleaned_daily(self.layout)?
            .into_iter()
            .map(EnrichedRecord::from)
            .collect();
        let hourly = read_cleaned_hourly(self.layout)?;
        if enriched.is_empty() || hourly.is_empty() {
            warn!("Cleaned datasets hold no rows, skipping enrichment");
            return Ok(StageOutcome::skipped("cleaned datasets hold no rows"));
        }

        let daily_rows = write_csv_atomic(&self.layout.enriched_daily(), &enriched)?;
        let hourly_rows = write_csv_atomic(&self.layout.enriched_hourly(), &hourly)?;

        let daily_start = enriched.iter().map(|r| r.date).min().map(|d| d.to_string());
        let daily_end = enriched.iter().map(|r| r.date).max().map(|d| d.to_string());
        let hourly_start = hourly.iter().map(|r| r.timestamp).min().map(|t| t.to_string());
        let hourly_end = hourly.iter().map(|r| r.timestamp).max().map(|t| t.to_string());

        let timestamp = ledger_timestamp();
        self.ledger.append(&[
            DatasetRunEntry {
                timestamp: timestamp.clone(),
                dataset: DATASET_ENRICHED_DAILY.to_string(),
                coverage_start: daily_start.clone(),
                coverage_end: daily_end.clone(),
                row_count: daily_rows,
            },
            DatasetRunEntry {
                timestamp,
                dataset: DATASET_ENRICHED_HOURLY.to_string(),
                coverage_start: hourly_start,
                coverage_end: hourly_end,
                row_count: hourly_rows,
            },
        ])?;

        info!(
            daily = daily_rows,
            hourly = hourly_rows,
            "Enriched datasets written"
        );

        Ok(StageOutcome::Completed(EnrichSummary {
            daily_rows,
            hourly_rows,
            coverage_start: daily_start,
            coverage_end: daily_end,
        }))
    }
}

/// Read back the enriched daily dataset
pub fn read_enriched_daily(layout: &DataLayout) -> Result<Vec<EnrichedRecord>> {
    crate::writers::read_csv(&layout.enriched_daily())
}
