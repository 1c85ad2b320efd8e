use crate::error::{PipelineError, Result};
use crate::orchestrator::change_detector::ChangeDetector;
use crate::orchestrator::clock::{Clock, SizeProbe};
use crate::orchestrator::pipeline::Pipeline;
use crate::orchestrator::watcher::{
    EventFilter, Readiness, StabilityPolicy, StageRunner, StageWatcher,
};
use crate::processors::StageOutcome;
use crate::utils::constants::RAW_FILE_EXTENSION;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info};

/// Where a stage watcher looks and what it waits for
#[derive(Debug, Clone)]
pub struct WatchPlan {
    pub root: PathBuf,
    pub filter: EventFilter,
    pub readiness: Readiness,
}

/// raw/*.txt -> IngestFilter
pub struct IngestStage {
    pipeline: Arc<Pipeline>,
}

impl IngestStage {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn plan(&self) -> WatchPlan {
        WatchPlan {
            root: self.pipeline.layout().raw_dir(),
            filter: EventFilter::Extension(RAW_FILE_EXTENSION.to_string()),
            readiness: Readiness::Triggers,
        }
    }
}

impl StageRunner for IngestStage {
    fn name(&self) -> &str {
        "ingest"
    }

    fn run(&mut self, triggers: &[PathBuf]) -> Result<()> {
        let mut failures = 0;
        for path in triggers.iter().filter(|p| p.exists()) {
            if let Err(e) = self.pipeline.ingest_file(path) {
                failures += 1;
                error!("Failed to ingest {}: {}", path.display(), e);
            }
        }

        if failures > 0 {
            return Err(PipelineError::Watcher(format!(
                "{} of {} raw files failed to ingest",
                failures,
                triggers.len()
            )));
        }
        Ok(())
    }
}

/// filtered/processed-ledger.csv -> CleaningAggregator
pub struct CleanStage {
    pipeline: Arc<Pipeline>,
}

impl CleanStage {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn plan(&self) -> WatchPlan {
        let ledger = self.pipeline.layout().filtered_ledger();
        WatchPlan {
            root: self.pipeline.layout().filtered_dir(),
            filter: EventFilter::Files(vec![ledger.clone()]),
            readiness: Readiness::Artifacts(vec![ledger]),
        }
    }
}

impl StageRunner for CleanStage {
    fn name(&self) -> &str {
        "clean"
    }

    fn run(&mut self, _triggers: &[PathBuf]) -> Result<()> {
        if let StageOutcome::Skipped { reason } = self.pipeline.clean()? {
            info!("Cleaning skipped: {}", reason);
        }
        Ok(())
    }
}

/// cleaned/{hourly,daily}-final.csv -> DerivedMetricsEnricher
pub struct EnrichStage {
    pipeline: Arc<Pipeline>,
}

impl EnrichStage {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn plan(&self) -> WatchPlan {
        let layout = self.pipeline.layout();
        let artifacts = vec![layout.cleaned_daily(), layout.cleaned_hourly()];
        WatchPlan {
            root: layout.cleaned_dir(),
            filter: EventFilter::Files(artifacts.clone()),
            readiness: Readiness::Artifacts(artifacts),
        }
    }
}

impl StageRunner for EnrichStage {
    fn name(&self) -> &str {
        "enrich"
    }

    fn run(&mut self, _triggers: &[PathBuf]) -> Result<()> {
        if let StageOutcome::Skipped { reason } = self.pipeline.enrich()? {
            info!("Enrichment skipped: {}", reason);
        }
        Ok(())
    }
}

/// Run one stage watcher on the current thread until `shutdown` is set
pub fn watch_stage<C: Clock, P: SizeProbe>(
    plan: WatchPlan,
    runner: &mut dyn StageRunner,
    policy: StabilityPolicy,
    scan_interval: std::time::Duration,
    clock: C,
    probe: P,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut detector = ChangeDetector::new(&plan.root, 1)?;
    let mut watcher = StageWatcher::new(plan.filter, plan.readiness, policy, clock, probe);
    watcher.run_until(&mut detector, runner, scan_interval, shutdown);
    Ok(())
}
