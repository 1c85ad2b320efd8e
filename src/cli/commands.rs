use crate::cli::args::{Cli, Commands};
use crate::config::{ConfigOverrides, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::ledger::{DatasetRunLedger, ProcessedFilesLedger};
use crate::orchestrator::{
    watch_stage, CleanStage, EnrichStage, FsProbe, IngestStage, Pipeline, StabilityPolicy,
    StageRunner, SystemClock, WatchPlan,
};
use crate::processors::cleaning_aggregator::read_cleaned_daily;
use crate::processors::enricher::read_enriched_daily;
use crate::processors::{QualityChecker, StageOutcome};
use crate::utils::constants::{DATASET_ENRICHED_DAILY, DATASET_ENRICHED_HOURLY};
use crate::utils::ProgressReporter;
use crate::writers::ParquetWriter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(&cli)?;

    let overrides = ConfigOverrides {
        province: cli.province.clone(),
        data_dir: cli.data_dir.clone(),
    };
    let config = PipelineConfig::load(cli.config.as_deref(), &overrides)?;
    info!(
        province = %config.province,
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(config)?;

    match cli.command {
        Commands::Stations => {
            let stations = pipeline.catalog().stations_in(&pipeline.config().province);
            println!(
                "Stations in {} ({}):",
                pipeline.config().province,
                pipeline.stations().len()
            );
            for station in stations {
                println!(
                    "  {:<40} {:>8.3} {:>9.3} {:>5} m  {} {}",
                    station.name,
                    station.latitude,
                    station.longitude,
                    station.altitude_m,
                    station.station_number,
                    station.station_code
                );
            }
            for station in pipeline
                .catalog()
                .unlocated()
                .iter()
                .filter(|s| s.province == pipeline.config().province.trim().to_uppercase())
            {
                println!("  {:<40} (coordinates unavailable)", station.name);
            }
        }

        Commands::Ingest { file } => match file {
            Some(path) => match pipeline.ingest_file(&path)? {
                StageOutcome::Completed(summary) => println!(
                    "Ingested {}: {} rows kept, {} shards, {} errors",
                    summary.source, summary.rows_kept, summary.shards_written, summary.write_errors
                ),
                StageOutcome::Skipped { reason } => println!("Skipped: {}", reason),
            },
            None => {
                let batch = pipeline.ingest_pending(cli.quiet)?;
                let rows: usize = batch.summaries.iter().map(|s| s.rows_kept).sum();
                println!(
                    "Ingested {} raw files ({} rows kept)",
                    batch.summaries.len(),
                    rows
                );
                for path in &batch.failed {
                    println!("  failed: {}", path.display());
                }
            }
        },

        Commands::Clean => {
            let progress = ProgressReporter::new_spinner("Cleaning filtered shards...", cli.quiet);
            let outcome = pipeline.clean()?;
            progress.finish_with_message("Cleaning finished");

            match outcome {
                StageOutcome::Completed(summary) => {
                    println!("Stations: {}", summary.stations);
                    println!("Hourly rows: {}", summary.hourly_rows);
                    println!("Daily rows: {}", summary.daily_rows);
                    println!(
                        "Gap-filled values: {} ({} left missing)",
                        summary.values_filled, summary.values_unfilled
                    );
                    println!("Atypical hours: {}", summary.atypical_hours);
                    println!("Quality violations: {}", summary.quality_violations);
                }
                StageOutcome::Skipped { reason } => println!("Skipped: {}", reason),
            }
        }

        Commands::Enrich => match pipeline.enrich()? {
            StageOutcome::Completed(summary) => println!(
                "Enriched {} daily and {} hourly rows ({} to {})",
                summary.daily_rows,
                summary.hourly_rows,
                summary.coverage_start.unwrap_or_default(),
                summary.coverage_end.unwrap_or_default()
            ),
            StageOutcome::Skipped { reason } => println!("Skipped: {}", reason),
        },

        Commands::Run => {
            let summary = pipeline.run_once(cli.quiet)?;
            println!("Ingested raw files: {}", summary.ingested.len());
            if summary.ingest_failures > 0 {
                println!("Failed raw files: {}", summary.ingest_failures);
            }
            println!("Clean: {}", describe(&summary.clean));
            println!("Enrich: {}", describe(&summary.enrich));
        }

        Commands::Watch => watch(pipeline, cli.quiet).await?,

        Commands::Validate => {
            let layout = pipeline.layout();
            if !layout.cleaned_daily().exists() {
                return Err(PipelineError::MissingData(format!(
                    "{} not found; run `clean` first",
                    layout.cleaned_daily().display()
                )));
            }

            let daily = read_cleaned_daily(layout)?;
            let checker = QualityChecker::new();
            let report = checker.check(&daily);
            println!("\n{}", checker.generate_summary(&report));

            if report.violations.is_empty() {
                println!("✅ All daily aggregates passed quality checks");
            } else {
                println!("⚠️  Found {} quality issues", report.violations.len());
            }
        }

        Commands::Status => {
            let layout = pipeline.layout();
            let processed = ProcessedFilesLedger::new(layout.filtered_ledger()).entries()?;
            println!("Processed raw files: {}", processed.len());
            if let Some(last) = processed.last() {
                println!("  last: {} at {}", last.relative_path, last.timestamp);
            }

            let runs = DatasetRunLedger::new(layout.enriched_ledger());
            for dataset in [DATASET_ENRICHED_DAILY, DATASET_ENRICHED_HOURLY] {
                match runs.latest(dataset)? {
                    Some(run) => println!(
                        "{}: {} rows, {} to {} (written {})",
                        dataset,
                        run.row_count,
                        run.coverage_start.unwrap_or_default(),
                        run.coverage_end.unwrap_or_default(),
                        run.timestamp
                    ),
                    None => println!("{}: never written", dataset),
                }
            }
        }

        Commands::Export {
            output,
            compression,
        } => {
            let layout = pipeline.layout();
            if !layout.enriched_daily().exists() {
                return Err(PipelineError::MissingData(format!(
                    "{} not found; run `enrich` first",
                    layout.enriched_daily().display()
                )));
            }

            let records = read_enriched_daily(layout)?;
            println!("Writing {} records to Parquet file...", records.len());

            let writer = ParquetWriter::new().with_compression(&compression)?;
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            writer.write_records(&records, &output)?;

            if output.exists() {
                println!("\n{}", writer.get_file_info(&output)?.summary());
            } else {
                println!("No records to write");
            }
        }
    }

    Ok(())
}

fn describe<T: std::fmt::Debug>(outcome: &StageOutcome<T>) -> String {
    match outcome {
        StageOutcome::Completed(summary) => format!("completed {:?}", summary),
        StageOutcome::Skipped { reason } => format!("skipped ({})", reason),
    }
}

/// Catch up once, then run the three stage watchers until Ctrl-C
async fn watch(pipeline: Pipeline, quiet: bool) -> Result<()> {
    if let Err(e) = pipeline.run_once(quiet) {
        error!("Catch-up run failed, watchers will retry on the next change: {}", e);
    }

    let pipeline = Arc::new(pipeline);
    let shutdown = Arc::new(AtomicBool::new(false));
    let watcher_config = pipeline.config().watcher.clone();
    let policy = StabilityPolicy::from(&watcher_config);
    let scan_interval = watcher_config.scan_interval();

    let ingest = IngestStage::new(pipeline.clone());
    let clean = CleanStage::new(pipeline.clone());
    let enrich = EnrichStage::new(pipeline.clone());

    let handles = vec![
        spawn_watcher(ingest.plan(), ingest, policy, scan_interval, shutdown.clone()),
        spawn_watcher(clean.plan(), clean, policy, scan_interval, shutdown.clone()),
        spawn_watcher(enrich.plan(), enrich, policy, scan_interval, shutdown.clone()),
    ];

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, waiting for in-flight stages");
    shutdown.store(true, Ordering::SeqCst);

    for handle in handles {
        handle.await??;
    }

    Ok(())
}

fn spawn_watcher<R>(
    plan: WatchPlan,
    mut runner: R,
    policy: StabilityPolicy,
    scan_interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<Result<()>>
where
    R: StageRunner + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        watch_stage(
            plan,
            &mut runner,
            policy,
            scan_interval,
            SystemClock,
            FsProbe,
            &shutdown,
        )
    })
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smn_pipeline={}", cli.log_level())));

    let result = match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
        None => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init(),
    };

    result.map_err(|e| PipelineError::Config(format!("Failed to initialise logging: {}", e)))
}
