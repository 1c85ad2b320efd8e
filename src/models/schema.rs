//! Declared column schema of the raw hourly dump.
//!
//! Both the ingest stage (which locates columns in the dump header) and the
//! cleaning stage (which types the filtered shards) work from this one list,
//! so a header that drifts from it fails loudly instead of mis-splitting.

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawColumn {
    Date,
    Hour,
    Temperature,
    Humidity,
    Pressure,
    WindDirection,
    WindSpeed,
    StationName,
}

impl RawColumn {
    /// Declared order; matches the order shards are written in
    pub const ALL: [RawColumn; 8] = [
        RawColumn::Date,
        RawColumn::Hour,
        RawColumn::Temperature,
        RawColumn::Humidity,
        RawColumn::Pressure,
        RawColumn::WindDirection,
        RawColumn::WindSpeed,
        RawColumn::StationName,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            RawColumn::Date => "FECHA",
            RawColumn::Hour => "HORA",
            RawColumn::Temperature => "TEMP",
            RawColumn::Humidity => "HUM",
            RawColumn::Pressure => "PNM",
            RawColumn::WindDirection => "DD",
            RawColumn::WindSpeed => "FF",
            RawColumn::StationName => "NOMBRE",
        }
    }

    pub fn from_header(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|c| c.header().eq_ignore_ascii_case(name))
    }
}

/// Position of every declared column inside one dump header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    positions: [usize; 8],
    width: usize,
}

impl ColumnIndex {
    /// Resolve the declared columns against the header fields of a dump.
    ///
    /// Extra header columns are tolerated and ignored; a missing declared
    /// column is an error.
    pub fn from_header(fields: &[&str]) -> Result<Self> {
        let mut positions = [usize::MAX; 8];

        for (pos, field) in fields.iter().enumerate() {
            if let Some(column) = RawColumn::from_header(field) {
                let slot = Self::slot(column);
                if positions[slot] == usize::MAX {
                    positions[slot] = pos;
                }
            }
        }

        let missing: Vec<&str> = RawColumn::ALL
            .iter()
            .filter(|c| positions[Self::slot(**c)] == usize::MAX)
            .map(|c| c.header())
            .collect();

        if !missing.is_empty() {
            return Err(PipelineError::InvalidFormat(format!(
                "Header is missing declared columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            positions,
            width: fields.len(),
        })
    }

    /// Number of fields in the header; body rows are split to at most this many
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn position(&self, column: RawColumn) -> usize {
        self.positions[Self::slot(column)]
    }

    /// Field for a column in a split body row, `None` when the row is short
    pub fn get<'a>(&self, row: &[&'a str], column: RawColumn) -> Option<&'a str> {
        row.get(self.position(column)).map(|s| s.trim())
    }

    fn slot(column: RawColumn) -> usize {
        RawColumn::ALL
            .iter()
            .position(|c| *c == column)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_from_header() {
        let header = ["FECHA", "HORA", "TEMP", "HUM", "PNM", "DD", "FF", "NOMBRE"];
        let index = ColumnIndex::from_header(&header).unwrap();

        assert_eq!(index.width(), 8);
        assert_eq!(index.position(RawColumn::Date), 0);
        assert_eq!(index.position(RawColumn::StationName), 7);
    }

    #[test]
    fn test_column_index_tolerates_reordering_and_extras() {
        let header = ["NOMBRE", "FECHA", "HORA", "EXTRA", "TEMP", "HUM", "PNM", "DD", "FF"];
        let index = ColumnIndex::from_header(&header).unwrap();

        assert_eq!(index.width(), 9);
        assert_eq!(index.position(RawColumn::StationName), 0);
        assert_eq!(index.position(RawColumn::Temperature), 4);

        let row = ["NEUQUEN AERO", "01012024", "5", "x", "24.6", "58", "1007.4", "360", "17"];
        assert_eq!(index.get(&row, RawColumn::Pressure), Some("1007.4"));
    }

    #[test]
    fn test_column_index_missing_column() {
        let header = ["FECHA", "HORA", "TEMP", "NOMBRE"];
        let err = ColumnIndex::from_header(&header).unwrap_err();
        assert!(err.to_string().contains("HUM"));
    }

    #[test]
    fn test_short_row() {
        let header = ["FECHA", "HORA", "TEMP", "HUM", "PNM", "DD", "FF", "NOMBRE"];
        let index = ColumnIndex::from_header(&header).unwrap();
        let row = ["01012024", "0"];
        assert_eq!(index.get(&row, RawColumn::StationName), None);
    }
}
