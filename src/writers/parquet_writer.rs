use crate::error::{PipelineError, Result};
use crate::models::{EnrichedRecord, Variable};
use crate::utils::constants::DEFAULT_ROW_GROUP_SIZE;
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Datelike;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// `num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Variable column prefixes in the daily tables
const PREFIXES: [(Variable, &str); 5] = [
    (Variable::Temperature, "temperature"),
    (Variable::Pressure, "pressure"),
    (Variable::Humidity, "humidity"),
    (Variable::WindDirection, "wind_dir"),
    (Variable::WindSpeed, "wind_speed"),
];

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(PipelineError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write enriched daily records to a Parquet file
    pub fn write_records(&self, records: &[EnrichedRecord], path: &Path) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let schema = self.create_schema();
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in records.chunks(self.row_group_size.max(1)) {
            let batch = self.records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        let mut fields = vec![
            Field::new("station", DataType::Utf8, false),
            Field::new("date", DataType::Date32, false),
        ];

        for (_, prefix) in PREFIXES {
            fields.push(Field::new(format!("{}_mean", prefix), DataType::Float64, true));
            fields.push(Field::new(format!("{}_min", prefix), DataType::Int32, true));
            fields.push(Field::new(format!("{}_max", prefix), DataType::Int32, true));
        }
        for (_, prefix) in PREFIXES {
            fields.push(Field::new(
                format!("{}_mean_norm", prefix),
                DataType::Float64,
                true,
            ));
        }

        fields.push(Field::new("thermal_amplitude", DataType::Float64, true));
        fields.push(Field::new("pressure_range", DataType::Float64, true));
        fields.push(Field::new("humidity_range", DataType::Float64, true));

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(
        &self,
        records: &[EnrichedRecord],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let stations: Vec<&str> = records.iter().map(|r| r.station.as_str()).collect();
        let dates: Vec<i32> = records
            .iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(stations)),
            Arc::new(Date32Array::from(dates)),
        ];

        for (variable, _) in PREFIXES {
            let stats: Vec<_> = records.iter().map(|r| r.stats(variable)).collect();
            columns.push(Arc::new(Float64Array::from(
                stats.iter().map(|s| s.mean).collect::<Vec<_>>(),
            )));
            columns.push(Arc::new(Int32Array::from(
                stats.iter().map(|s| s.min).collect::<Vec<_>>(),
            )));
            columns.push(Arc::new(Int32Array::from(
                stats.iter().map(|s| s.max).collect::<Vec<_>>(),
            )));
        }
        for (variable, _) in PREFIXES {
            columns.push(Arc::new(Float64Array::from(
                records
                    .iter()
                    .map(|r| r.normalized(variable))
                    .collect::<Vec<_>>(),
            )));
        }

        columns.push(Arc::new(Float64Array::from(
            records.iter().map(|r| r.thermal_amplitude).collect::<Vec<_>>(),
        )));
        columns.push(Arc::new(Float64Array::from(
            records.iter().map(|r| r.pressure_range).collect::<Vec<_>>(),
        )));
        columns.push(Arc::new(Float64Array::from(
            records.iter().map(|r| r.humidity_range).collect::<Vec<_>>(),
        )));

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            self.total_rows as f64 / self.row_groups.max(1) as f64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyAggregate, VariableStats};
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    fn record(day: u32) -> EnrichedRecord {
        let mut daily = DailyAggregate::new(
            "NEUQUEN AERO".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        );
        daily.set_stats(
            Variable::Temperature,
            VariableStats {
                mean: Some(22.4),
                min: Some(15),
                max: Some(31),
            },
        );
        EnrichedRecord::from(daily)
    }

    #[test]
    fn test_write_empty_records() {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new().unwrap();

        let result = writer.write_records(&[], temp_file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_write_and_inspect() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(2);
        let temp_file = NamedTempFile::new().unwrap();

        let records: Vec<_> = (1..=5).map(record).collect();
        writer.write_records(&records, temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 5);
        assert_eq!(info.row_groups, 3);
        assert!(info.summary().contains("Total rows: 5"));

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new().unwrap();

            let result = writer.write_records(&[record(1)], temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli9").is_err());
        Ok(())
    }
}
