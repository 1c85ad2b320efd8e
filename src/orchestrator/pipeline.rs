use crate::config::PipelineConfig;
use crate::error::Result;
use crate::processors::{
    CleanSummary, CleaningAggregator, DerivedMetricsEnricher, EnrichSummary, IngestFilter,
    IngestSummary, StageOutcome,
};
use crate::readers::StationCatalog;
use crate::utils::{DataLayout, ProgressReporter};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Outcome of ingesting every pending raw file
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    pub summaries: Vec<IngestSummary>,
    /// Raw files that could not be ingested; they stay out of the ledger
    pub failed: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ingested: Vec<IngestSummary>,
    pub ingest_failures: usize,
    pub clean: StageOutcome<CleanSummary>,
    pub enrich: StageOutcome<EnrichSummary>,
}

/// Entry points of every stage, bound to one configuration and catalog
pub struct Pipeline {
    config: PipelineConfig,
    layout: DataLayout,
    catalog: StationCatalog,
    stations: BTreeSet<String>,
}

impl Pipeline {
    /// Load the station catalog and resolve the configured province.
    ///
    /// A missing catalog is fatal; a province with no stations only warns,
    /// since every later stage then degrades to a no-op.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let layout = config.layout();
        layout.ensure_dirs()?;

        let catalog = StationCatalog::load(&config.stations_path())?;
        let stations = catalog.resolve(&config.province);

        if stations.is_empty() {
            warn!(province = %config.province, "No catalog stations match the province");
        } else {
            info!(
                province = %config.province,
                stations = stations.len(),
                "Resolved stations in scope"
            );
        }

        Ok(Self {
            config,
            layout,
            catalog,
            stations,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    pub fn stations(&self) -> &BTreeSet<String> {
        &self.stations
    }

    pub fn ingest_filter(&self) -> IngestFilter<'_> {
        IngestFilter::new(&self.layout, &self.stations)
    }

    pub fn ingest_file(&self, raw_file: &Path) -> Result<StageOutcome<IngestSummary>> {
        self.ingest_filter().ingest(raw_file)
    }

    /// Ingest every raw file the ledger has not seen yet.
    ///
    /// A file that fails is logged and counted; the rest of the batch still runs.
    pub fn ingest_pending(&self, silent: bool) -> Result<IngestBatch> {
        let filter = self.ingest_filter();
        let pending = filter.pending_files()?;
        if pending.is_empty() {
            info!("No pending raw files");
            return Ok(IngestBatch::default());
        }

        let progress = ProgressReporter::new(pending.len() as u64, "Ingesting raw files", silent);
        let mut batch = IngestBatch::default();
        for path in &pending {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                progress.set_message(name);
            }
            match filter.ingest(path) {
                Ok(StageOutcome::Completed(summary)) => batch.summaries.push(summary),
                Ok(StageOutcome::Skipped { .. }) => {}
                Err(e) => {
                    error!("Failed to ingest {}: {}", path.display(), e);
                    batch.failed.push(path.clone());
                }
            }
            progress.increment(1);
        }
        progress.finish_with_message(&format!("Ingested {} raw files", batch.summaries.len()));

        info!(
            ingested = batch.summaries.len(),
            failed = batch.failed.len(),
            "Raw file batch finished"
        );

        Ok(batch)
    }

    pub fn clean(&self) -> Result<StageOutcome<CleanSummary>> {
        CleaningAggregator::new(&self.layout, self.config.province.clone())
            .with_schedule_threshold(self.config.schedule_threshold)
            .with_max_workers(self.config.max_workers)
            .run()
    }

    pub fn enrich(&self) -> Result<StageOutcome<EnrichSummary>> {
        DerivedMetricsEnricher::new(&self.layout).run()
    }

    /// Ingest pending files, then clean, then enrich
    pub fn run_once(&self, silent: bool) -> Result<RunSummary> {
        let batch = self.ingest_pending(silent)?;
        let clean = self.clean()?;
        let enrich = self.enrich()?;

        Ok(RunSummary {
            ingested: batch.summaries,
            ingest_failures: batch.failed.len(),
            clean,
            enrich,
        })
    }
}
