/// Tier directory names under the data root
pub const RAW_DIR: &str = "raw";
pub const FILTERED_DIR: &str = "filtered";
pub const CLEANED_DIR: &str = "cleaned";
pub const ENRICHED_DIR: &str = "enriched";
pub const MISSING_DAYS_DIR: &str = "missing-days";

/// File names
pub const PROCESSED_LEDGER_FILE: &str = "processed-ledger.csv";
pub const HOURLY_FINAL_FILE: &str = "hourly-final.csv";
pub const DAILY_FINAL_FILE: &str = "daily-final.csv";
pub const ENRICHED_HOURLY_FILE: &str = "hourly.csv";
pub const ENRICHED_DAILY_FILE: &str = "daily.csv";
pub const MISSING_HOURS_FILE: &str = "missing-hours.csv";
pub const ATYPICAL_HOURS_FILE: &str = "atypical-hours.csv";
pub const COLUMN_PROFILE_FILE: &str = "column-profile.csv";
pub const DATASET_INFO_FILE: &str = "dataset-info.json";
pub const DEFAULT_STATIONS_FILE: &str = "reference/stations.txt";

/// Raw dump naming
pub const RAW_FILE_EXTENSION: &str = "txt";
pub const RAW_FILE_PREFIX: &str = "datohorario";
pub const SHARD_EXTENSION: &str = "csv";

/// Ledger dataset names for the enriched tier
pub const DATASET_ENRICHED_DAILY: &str = "enriched_daily";
pub const DATASET_ENRICHED_HOURLY: &str = "enriched_hourly";

/// Share of observed days an hour must reach to be part of a station schedule
pub const DEFAULT_SCHEDULE_THRESHOLD: f64 = 0.05;

/// Wind direction above this is out of domain
pub const MAX_WIND_DIRECTION: f64 = 360.0;

/// Physical plausibility bounds used by the quality checker
pub const MIN_VALID_TEMP: f64 = -50.0;
pub const MAX_VALID_TEMP: f64 = 60.0;
pub const MIN_VALID_PRESSURE: f64 = 850.0;
pub const MAX_VALID_PRESSURE: f64 = 1100.0;
pub const TEMP_JUMP_THRESHOLD: f64 = 15.0;

/// Decimal places kept in normalized columns
pub const NORMALIZED_DECIMALS: i32 = 5;

/// Timestamp format used in ledgers
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
