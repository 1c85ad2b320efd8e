pub mod cleaning_aggregator;
pub mod daily_aggregator;
pub mod enricher;
pub mod gap_filler;
pub mod grid;
pub mod ingest_filter;
pub mod quality_checker;

pub use cleaning_aggregator::{CleanSummary, CleaningAggregator};
pub use daily_aggregator::{aggregate_daily, normalize_means, DailyAggregator};
pub use enricher::{DerivedMetricsEnricher, EnrichSummary};
pub use gap_filler::{GapEntry, GapFiller, GapReport};
pub use grid::{CompleteGrid, DateSpan, GridCell, HourShare, StationGrid, StationSchedule};
pub use ingest_filter::{IngestFilter, IngestSummary};
pub use quality_checker::{QualityChecker, QualityReport, QualityViolation, ViolationType};

/// Result of one stage invocation.
///
/// `Skipped` is the no-op outcome for missing upstream input or an already
/// processed source; it leaves no ledger trace and is safe to retry.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Completed(T),
    Skipped { reason: String },
}

impl<T> StageOutcome<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StageOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StageOutcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            StageOutcome::Completed(summary) => Some(summary),
            StageOutcome::Skipped { .. } => None,
        }
    }
}
