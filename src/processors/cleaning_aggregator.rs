use crate::error::Result;
use crate::ledger::ledger_timestamp;
use crate::models::{DailyAggregate, HourlyRecord};
use crate::processors::daily_aggregator::DailyAggregator;
use crate::processors::gap_filler::GapFiller;
use crate::processors::grid::CompleteGrid;
use crate::processors::quality_checker::QualityChecker;
use crate::processors::StageOutcome;
use crate::readers::ShardReader;
use crate::utils::constants::DEFAULT_SCHEDULE_THRESHOLD;
use crate::utils::DataLayout;
use crate::writers::csv_writer::write_csv_atomic;
use crate::writers::profile::{
    profile_columns, write_column_profile, write_dataset_info, DatasetInfo,
};
use crate::writers::reports::{write_atypical_hours, write_gap_report, write_missing_days};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub stations: usize,
    pub observations: usize,
    pub shards_read: usize,
    pub unreadable_shards: usize,
    pub invalid_rows: usize,
    pub duplicates: usize,
    pub atypical_hours: usize,
    pub hourly_rows: usize,
    pub daily_rows: usize,
    pub gap_cells: usize,
    pub values_filled: usize,
    pub values_unfilled: usize,
    pub report_errors: usize,
    pub quality_violations: usize,
}

/// Filtered tier -> cleaned tier, rebuilt from every shard on each run
pub struct CleaningAggregator<'a> {
    layout: &'a DataLayout,
    province: String,
    schedule_threshold: f64,
    reader: ShardReader,
}

impl<'a> CleaningAggregator<'a> {
    pub fn new(layout: &'a DataLayout, province: impl Into<String>) -> Self {
        Self {
            layout,
            province: province.into(),
            schedule_threshold: DEFAULT_SCHEDULE_THRESHOLD,
            reader: ShardReader::default(),
        }
    }

    pub fn with_schedule_threshold(mut self, threshold: f64) -> Self {
        self.schedule_threshold = threshold;
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.reader = ShardReader::new(workers);
        self
    }

    pub fn run(&self) -> Result<StageOutcome<CleanSummary>> {
        let batch = self.reader.read_all(&self.layout.filtered_dir())?;

        let Some(grid) = CompleteGrid::build(&batch.observations, self.schedule_threshold) else {
            warn!("No filtered observations found, skipping cleaning");
            return Ok(StageOutcome::skipped("no filtered observations"));
        };

        let mut summary = CleanSummary {
            stations: grid.stations.len(),
            observations: batch.observations.len(),
            shards_read: batch.files_read,
            unreadable_shards: batch.unreadable_files,
            invalid_rows: batch.invalid_rows,
            duplicates: grid.duplicates,
            atypical_hours: grid.stations.iter().map(|s| s.schedule.atypical.len()).sum(),
            ..Default::default()
        };

        info!(
            stations = summary.stations,
            days = grid.span.len(),
            "Cleaning {} observations from {} to {}",
            summary.observations,
            grid.span.start,
            grid.span.end
        );

        summary.report_errors += write_missing_days(self.layout, &grid.stations);
        write_atypical_hours(self.layout, &grid.stations)?;

        let (hourly, gaps) = GapFiller::new().fill(&grid);
        summary.gap_cells = gaps.cells_with_gaps();
        summary.values_filled = gaps.values_filled;
        summary.values_unfilled = gaps.values_unfilled;
        write_gap_report(self.layout, &gaps)?;

        let daily = DailyAggregator::new().aggregate(&hourly);

        let checker = QualityChecker::new();
        let quality = checker.check(&daily);
        summary.quality_violations = quality.violations.len();
        if !quality.violations.is_empty() {
            warn!(violations = summary.quality_violations, "Daily aggregates have quality issues");
            debug!("{}", checker.generate_summary(&quality));
        }

        self.write_documentation(&daily, &grid)?;

        summary.hourly_rows = write_csv_atomic(&self.layout.cleaned_hourly(), &hourly)?;
        summary.daily_rows = write_csv_atomic(&self.layout.cleaned_daily(), &daily)?;

        info!(
            hourly = summary.hourly_rows,
            daily = summary.daily_rows,
            filled = summary.values_filled,
            unfilled = summary.values_unfilled,
            errors = summary.report_errors,
            "Cleaned datasets written"
        );

        Ok(StageOutcome::Completed(summary))
    }

    fn write_documentation(&self, daily: &[DailyAggregate], grid: &CompleteGrid) -> Result<()> {
        let profile = profile_columns(daily)?;
        write_column_profile(&self.layout.column_profile(), &profile)?;

        let info = DatasetInfo {
            dataset: "daily-final".to_string(),
            source: "SMN hourly observations".to_string(),
            province: self.province.clone(),
            stations: grid.stations.iter().map(|s| s.station.clone()).collect(),
            coverage_start: Some(grid.span.start.to_string()),
            coverage_end: Some(grid.span.end.to_string()),
            frequency: "daily".to_string(),
            rows: daily.len(),
            processed_at: ledger_timestamp(),
        };
        write_dataset_info(&self.layout.dataset_info(), &info)
    }
}

/// Read back the cleaned hourly dataset
pub fn read_cleaned_hourly(layout: &DataLayout) -> Result<Vec<HourlyRecord>> {
    crate::writers::read_csv(&layout.cleaned_hourly())
}

/// Read back the cleaned daily dataset
pub fn read_cleaned_daily(layout: &DataLayout) -> Result<Vec<DailyAggregate>> {
    crate::writers::read_csv(&layout.cleaned_daily())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const SHARD_A: &str = "\
FECHA,HORA,TEMP,HUM,PNM,DD,FF,NOMBRE
01012024,12,20.0,50,1010.0,180,10,NEUQUEN AERO
03012024,12,25.0,40,1012.0,200,12,NEUQUEN AERO
";

    #[test]
    fn test_empty_filtered_tier_is_skipped() -> Result<()> {
        let dir = TempDir::new()?;
        let layout = DataLayout::new(dir.path());
        layout.ensure_dirs()?;

        let outcome = CleaningAggregator::new(&layout, "NEUQUEN").run()?;
        assert!(!outcome.is_completed());
        assert!(!layout.cleaned_daily().exists());
        Ok(())
    }

    #[test]
    fn test_clean_fills_missing_day() -> Result<()> {
        let dir = TempDir::new()?;
        let layout = DataLayout::new(dir.path());
        layout.ensure_dirs()?;
        let shard_dir = layout.shard_dir("neuquen_aero");
        fs::create_dir_all(&shard_dir)?;
        fs::write(shard_dir.join("20240103.csv"), SHARD_A)?;

        let summary = CleaningAggregator::new(&layout, "NEUQUEN")
            .with_max_workers(1)
            .run()?
            .completed()
            .unwrap();

        assert_eq!(summary.stations, 1);
        assert_eq!(summary.hourly_rows, 3);
        assert_eq!(summary.daily_rows, 3);
        assert_eq!(summary.gap_cells, 1);

        let hourly = read_cleaned_hourly(&layout)?;
        assert_eq!(hourly[1].temperature_c, Some(22.5));
        assert!(hourly[1].imputed);

        let daily = read_cleaned_daily(&layout)?;
        assert_eq!(daily[0].temperature_mean_norm, Some(0.0));
        assert_eq!(daily[2].temperature_mean_norm, Some(1.0));

        let missing = fs::read_to_string(layout.missing_days_file("neuquen_aero"))?;
        assert!(missing.contains("Total: 1\n2024-01-02"));
        assert!(layout.column_profile().exists());
        assert!(layout.dataset_info().exists());
        assert!(fs::read_to_string(layout.missing_hours())?.starts_with("station\ttimestamp"));

        Ok(())
    }
}
