use crate::error::Result;
use crate::models::{Observation, RawObservation};
use crate::utils::constants::{PROCESSED_LEDGER_FILE, SHARD_EXTENSION};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Everything read back from the filtered tier
#[derive(Debug, Default)]
pub struct ShardBatch {
    pub observations: Vec<Observation>,
    pub files_read: usize,
    pub unreadable_files: usize,
    /// Rows dropped because they had no valid station/timestamp
    pub invalid_rows: usize,
}

struct ShardContents {
    observations: Vec<Observation>,
    invalid_rows: usize,
}

pub struct ShardReader {
    max_workers: usize,
}

impl ShardReader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// All shard files below the filtered tier, in a stable order
    pub fn discover_shards(&self, filtered_dir: &Path) -> Result<Vec<PathBuf>> {
        if !filtered_dir.exists() {
            return Ok(Vec::new());
        }

        let mut shards = Vec::new();
        for entry in WalkDir::new(filtered_dir).min_depth(2) {
            let entry = entry?;
            let path = entry.path();

            let is_shard = entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(SHARD_EXTENSION)
                && path.file_name().and_then(|n| n.to_str()) != Some(PROCESSED_LEDGER_FILE);

            if is_shard {
                shards.push(path.to_path_buf());
            }
        }

        shards.sort();
        debug!("Found {} shard files in {}", shards.len(), filtered_dir.display());
        Ok(shards)
    }

    /// Read and type every shard, in parallel
    pub fn read_all(&self, filtered_dir: &Path) -> Result<ShardBatch> {
        let shards = self.discover_shards(filtered_dir)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| crate::error::PipelineError::Config(e.to_string()))?;

        let results: Vec<(PathBuf, Result<ShardContents>)> = pool.install(|| {
            shards
                .par_iter()
                .map(|path| (path.clone(), Self::read_shard(path)))
                .collect()
        });

        let mut batch = ShardBatch::default();
        for (path, result) in results {
            match result {
                Ok(contents) => {
                    batch.files_read += 1;
                    batch.invalid_rows += contents.invalid_rows;
                    batch.observations.extend(contents.observations);
                }
                Err(e) => {
                    warn!("Skipping unreadable shard {}: {}", path.display(), e);
                    batch.unreadable_files += 1;
                }
            }
        }

        Ok(batch)
    }

    fn read_shard(path: &Path) -> Result<ShardContents> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let mut contents = ShardContents {
            observations: Vec::new(),
            invalid_rows: 0,
        };

        for row in reader.deserialize::<RawObservation>() {
            match row.ok().and_then(|raw| raw.parse()) {
                Some(obs) => contents.observations.push(obs),
                None => contents.invalid_rows += 1,
            }
        }

        Ok(contents)
    }
}

impl Default for ShardReader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SHARD: &str = "\
FECHA,HORA,TEMP,HUM,PNM,DD,FF,NOMBRE
01012024,0,\"24,6\",58,1007.4,360,17,NEUQUEN AERO
01012024,1,23.9,60,1007.8,990,0,NEUQUEN AERO
99999999,1,23.9,60,1007.8,990,0,NEUQUEN AERO
";

    #[test]
    fn test_discover_and_read_shards() -> Result<()> {
        let dir = TempDir::new()?;
        let station_dir = dir.path().join("neuquen_aero");
        fs::create_dir_all(&station_dir)?;
        fs::write(station_dir.join("20240101.csv"), SHARD)?;
        fs::write(dir.path().join(PROCESSED_LEDGER_FILE), "relative-path,timestamp\n")?;
        fs::write(station_dir.join("notes.txt"), "ignored")?;

        let reader = ShardReader::new(2);
        let shards = reader.discover_shards(dir.path())?;
        assert_eq!(shards.len(), 1);

        let batch = reader.read_all(dir.path())?;
        assert_eq!(batch.files_read, 1);
        assert_eq!(batch.observations.len(), 2);
        assert_eq!(batch.invalid_rows, 1);
        assert_eq!(batch.observations[0].values.temperature_c, Some(24.6));

        Ok(())
    }

    #[test]
    fn test_missing_filtered_dir_is_empty() -> Result<()> {
        let reader = ShardReader::new(1);
        let batch = reader.read_all(Path::new("/nonexistent/filtered"))?;
        assert!(batch.observations.is_empty());
        Ok(())
    }
}
