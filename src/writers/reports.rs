use crate::error::Result;
use crate::processors::{GapReport, StationGrid};
use crate::utils::names::station_folder_name;
use crate::utils::DataLayout;
use crate::writers::csv_writer::{write_text_atomic, write_with_header_atomic};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::error;

const ATYPICAL_HOURS_HEADER: [&str; 4] = ["station", "hour", "days_observed", "share"];
const MISSING_HOURS_HEADER: [&str; 5] = ["station", "timestamp", "row_missing", "filled", "unfilled"];

#[derive(Debug, Serialize)]
struct AtypicalHourRow<'a> {
    station: &'a str,
    hour: u32,
    days_observed: usize,
    share: f64,
}

/// Plain-text list of the days a station never reported
pub fn missing_days_text(station: &str, missing: &[NaiveDate]) -> String {
    let mut text = format!("Missing days for {}\n", station);
    text.push_str(&format!("Total: {}\n", missing.len()));
    for day in missing {
        text.push_str(&format!("{}\n", day.format("%Y-%m-%d")));
    }
    text
}

/// One `missing-days/<station>.txt` per station; returns the write error count
pub fn write_missing_days(layout: &DataLayout, stations: &[StationGrid]) -> usize {
    let mut errors = 0;
    for station in stations {
        let path = layout.missing_days_file(&station_folder_name(&station.station));
        let text = missing_days_text(&station.station, &station.missing_days);
        if let Err(e) = write_text_atomic(&path, &text) {
            errors += 1;
            error!(station = %station.station, "Failed to write missing-day report: {}", e);
        }
    }
    errors
}

pub fn write_atypical_hours(layout: &DataLayout, stations: &[StationGrid]) -> Result<usize> {
    let rows: Vec<AtypicalHourRow> = stations
        .iter()
        .flat_map(|s| {
            s.schedule.atypical.iter().map(move |h| AtypicalHourRow {
                station: &s.station,
                hour: h.hour,
                days_observed: h.days_observed,
                share: h.share,
            })
        })
        .collect();

    write_with_header_atomic(&layout.atypical_hours(), &ATYPICAL_HOURS_HEADER, &rows, b',')
}

/// Tab-delimited list of grid cells that had missing values
pub fn write_gap_report(layout: &DataLayout, report: &GapReport) -> Result<usize> {
    write_with_header_atomic(
        &layout.missing_hours(),
        &MISSING_HOURS_HEADER,
        &report.entries,
        b'\t',
    )
}
