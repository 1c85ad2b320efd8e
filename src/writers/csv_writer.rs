//! Atomic CSV writes: serialise into a temp file beside the target, then
//! rename it into place so watchers never observe a half-written dataset.

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `records` as comma-separated CSV with a header row
pub fn write_csv_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<usize> {
    write_delimited_atomic(path, records, b',')
}

pub fn write_delimited_atomic<T: Serialize>(
    path: &Path,
    records: &[T],
    delimiter: u8,
) -> Result<usize> {
    let mut temp = temp_file_beside(path)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(temp.as_file_mut());
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }

    persist(temp, path)?;
    Ok(records.len())
}

/// Like [`write_delimited_atomic`], but the header row is written even when
/// `records` is empty. `header` must list the serialised field order.
pub fn write_with_header_atomic<T: Serialize>(
    path: &Path,
    header: &[&str],
    records: &[T],
    delimiter: u8,
) -> Result<usize> {
    let mut temp = temp_file_beside(path)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(temp.as_file_mut());
        writer.write_record(header)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }

    persist(temp, path)?;
    Ok(records.len())
}

/// Write an arbitrary text artifact with the same rename guarantee
pub fn write_text_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut temp = temp_file_beside(path)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    persist(temp, path)
}

fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = path.parent().ok_or_else(|| {
        PipelineError::InvalidFormat(format!("{} has no parent directory", path.display()))
    })?;
    std::fs::create_dir_all(dir)?;
    Ok(NamedTempFile::new_in(dir)?)
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.persist(path).map_err(|e| PipelineError::Io(e.error))?;
    Ok(())
}

/// Read a whole CSV dataset back into typed records
pub fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        station: String,
        value: Option<f64>,
    }

    #[test]
    fn test_write_creates_parents_and_replaces() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cleaned/daily-final.csv");

        let rows = vec![
            Row { station: "A".into(), value: Some(1.5) },
            Row { station: "B".into(), value: None },
        ];
        assert_eq!(write_csv_atomic(&path, &rows)?, 2);
        assert_eq!(read_csv::<Row>(&path)?, rows);

        write_csv_atomic(&path, &rows[..1])?;
        assert_eq!(read_csv::<Row>(&path)?.len(), 1);

        // Only the target is left behind
        let entries = std::fs::read_dir(dir.path().join("cleaned"))?.count();
        assert_eq!(entries, 1);

        Ok(())
    }

    #[test]
    fn test_tab_delimited() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("report.csv");
        write_delimited_atomic(&path, &[Row { station: "A".into(), value: Some(2.0) }], b'\t')?;

        let text = std::fs::read_to_string(&path)?;
        assert_eq!(text, "station\tvalue\nA\t2.0\n");
        Ok(())
    }

    #[test]
    fn test_explicit_header_survives_empty_input() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("report.csv");

        write_with_header_atomic::<Row>(&path, &["station", "value"], &[], b',')?;
        assert_eq!(std::fs::read_to_string(&path)?, "station,value\n");

        write_with_header_atomic(&path, &["station", "value"], &[Row { station: "A".into(), value: None }], b',')?;
        assert_eq!(std::fs::read_to_string(&path)?, "station,value\nA,\n");
        Ok(())
    }
}
