use crate::error::{PipelineError, Result};
use crate::models::{ColumnIndex, RawObservation};
use crate::readers::text::read_latin1;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Fields in the dump are separated by runs of two or more whitespace characters
static FIELD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("field separator pattern is valid"));

/// Split a dump line on whitespace runs, into at most `max_fields` fields.
///
/// The last field keeps any embedded double spaces so that station names
/// are never over-split.
pub fn split_fields(line: &str, max_fields: usize) -> Vec<&str> {
    FIELD_SEPARATOR
        .splitn(line.trim(), max_fields.max(1))
        .collect()
}

/// A parsed raw hourly dump
#[derive(Debug, Clone)]
pub struct RawDump {
    pub index: ColumnIndex,
    pub rows: Vec<RawObservation>,
    /// Body lines that could not be turned into a row
    pub skipped_lines: usize,
}

pub struct HourlyDumpReader;

impl HourlyDumpReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_dump(&self, path: &Path) -> Result<RawDump> {
        let text = read_latin1(path)?;
        self.parse_dump(&text).map_err(|e| match e {
            PipelineError::InvalidFormat(msg) => {
                PipelineError::InvalidFormat(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn parse_dump(&self, text: &str) -> Result<RawDump> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header_line = lines
            .next()
            .ok_or_else(|| PipelineError::InvalidFormat("Dump has no header line".to_string()))?;
        let header = split_fields(header_line, usize::MAX);
        let index = ColumnIndex::from_header(&header)?;

        let mut rows = Vec::new();
        let mut skipped_lines = 0;

        for line in lines {
            // Units row, e.g. "[HOR] [°C] [%] [hPa] [gr] [km/hr]"
            if line.trim_start().starts_with('[') {
                continue;
            }

            let fields = split_fields(line, index.width());
            match RawObservation::from_fields(&index, &fields) {
                Some(row) => rows.push(row),
                None => skipped_lines += 1,
            }
        }

        debug!(rows = rows.len(), skipped = skipped_lines, "Parsed raw dump");

        Ok(RawDump {
            index,
            rows,
            skipped_lines,
        })
    }
}

impl Default for HourlyDumpReader {
    fn default() -> Self {
        Self::new()
    }
}
