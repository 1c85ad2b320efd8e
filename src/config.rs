//! Layered pipeline configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, `SMN_PIPELINE_*` environment variables (nested keys use `__`, e.g.
//! `SMN_PIPELINE_WATCHER__DEBOUNCE_MS`), then command-line overrides.

use crate::error::{PipelineError, Result};
use crate::utils::constants::{DEFAULT_SCHEDULE_THRESHOLD, DEFAULT_STATIONS_FILE};
use crate::utils::DataLayout;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

pub const ENV_PREFIX: &str = "SMN_PIPELINE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WatcherConfig {
    pub debounce_ms: u64,
    pub stability_wait_ms: u64,
    #[validate(range(min = 1))]
    pub stability_attempts: u32,
    pub retry_interval_ms: u64,
    pub min_stable_bytes: u64,
    #[validate(range(min = 1))]
    pub scan_interval_ms: u64,
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stability_wait(&self) -> Duration {
        Duration::from_millis(self.stability_wait_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 800,
            stability_wait_ms: 400,
            stability_attempts: 8,
            retry_interval_ms: 500,
            min_stable_bytes: 8,
            scan_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    #[serde(default)]
    #[validate(length(min = 1, message = "province must be set"))]
    pub province: String,
    /// Station registry; defaults to `<data_dir>/reference/stations.txt`
    #[serde(default)]
    pub stations_file: Option<PathBuf>,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub schedule_threshold: f64,
    #[validate(range(min = 1))]
    pub max_workers: usize,
    #[validate(nested)]
    pub watcher: WatcherConfig,
}

/// Values given on the command line; `None` leaves lower layers in place
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub province: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn load(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let watcher = WatcherConfig::default();

        let mut builder = Config::builder()
            .set_default("data_dir", "data")?
            .set_default("schedule_threshold", DEFAULT_SCHEDULE_THRESHOLD)?
            .set_default("max_workers", num_cpus::get() as u64)?
            .set_default("watcher.debounce_ms", watcher.debounce_ms)?
            .set_default("watcher.stability_wait_ms", watcher.stability_wait_ms)?
            .set_default("watcher.stability_attempts", u64::from(watcher.stability_attempts))?
            .set_default("watcher.retry_interval_ms", watcher.retry_interval_ms)?
            .set_default("watcher.min_stable_bytes", watcher.min_stable_bytes)?
            .set_default("watcher.scan_interval_ms", watcher.scan_interval_ms)?;

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(PipelineError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("province", overrides.province.clone())?
            .set_override_option(
                "data_dir",
                overrides
                    .data_dir
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .build()?;

        let mut parsed: PipelineConfig = config.try_deserialize()?;
        parsed.province = parsed.province.trim().to_string();
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }

    pub fn stations_path(&self) -> PathBuf {
        self.stations_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_STATIONS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    fn overrides(province: &str) -> ConfigOverrides {
        ConfigOverrides {
            province: Some(province.to_string()),
            data_dir: None,
        }
    }

    #[test]
    fn test_defaults_with_province() -> Result<()> {
        let config = PipelineConfig::load(None, &overrides("NEUQUEN"))?;

        assert_eq!(config.province, "NEUQUEN");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.watcher, WatcherConfig::default());
        assert_eq!(config.schedule_threshold, 0.05);
        assert_eq!(config.stations_path(), PathBuf::from("data/reference/stations.txt"));
        Ok(())
    }

    #[test]
    fn test_missing_province_is_rejected() {
        let result = PipelineConfig::load(None, &overrides("   "));
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_file_layer_and_cli_override() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            "province = \"CHUBUT\"\ndata_dir = \"/srv/smn\"\n\n[watcher]\ndebounce_ms = 2000"
        )?;

        let config = PipelineConfig::load(Some(file.path()), &ConfigOverrides::default())?;
        assert_eq!(config.province, "CHUBUT");
        assert_eq!(config.data_dir, PathBuf::from("/srv/smn"));
        assert_eq!(config.watcher.debounce(), Duration::from_millis(2000));
        assert_eq!(config.watcher.stability_attempts, 8);

        let config = PipelineConfig::load(Some(file.path()), &overrides("NEUQUEN"))?;
        assert_eq!(config.province, "NEUQUEN");
        Ok(())
    }

    #[test]
    fn test_missing_config_file() {
        let result = PipelineConfig::load(
            Some(Path::new("/nonexistent/smn.toml")),
            &overrides("NEUQUEN"),
        );
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
