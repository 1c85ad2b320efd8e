//! Same-hour neighbour imputation over a complete grid.
//!
//! A missing value at (station, date, hour) takes the mean of the nearest
//! earlier and later values at the same hour, or the single one that exists.
//! Cells are filled in date order and each fill becomes the earlier
//! neighbour of the next gap, so a run of missing days steps towards the
//! later observation.

use crate::models::{HourlyRecord, Variable};
use crate::processors::grid::{CompleteGrid, StationGrid};
use crate::utils::constants::MAX_WIND_DIRECTION;
use crate::utils::numbers::round1;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// One grid cell that had at least one missing variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapEntry {
    pub station: String,
    pub timestamp: NaiveDateTime,
    /// The whole slot was absent from the dumps
    pub row_missing: bool,
    pub filled: String,
    pub unfilled: String,
}

#[derive(Debug, Clone, Default)]
pub struct GapReport {
    pub entries: Vec<GapEntry>,
    pub values_filled: usize,
    pub values_unfilled: usize,
}

impl GapReport {
    pub fn cells_with_gaps(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Default)]
pub struct GapFiller;

impl GapFiller {
    pub fn new() -> Self {
        Self
    }

    /// Fill every station grid, returning the hourly records and the gap report
    pub fn fill(&self, grid: &CompleteGrid) -> (Vec<HourlyRecord>, GapReport) {
        let mut records = Vec::with_capacity(grid.cell_count());
        let mut report = GapReport::default();

        for station in &grid.stations {
            self.fill_station(station, &mut records, &mut report);
        }

        (records, report)
    }

    fn fill_station(
        &self,
        station: &StationGrid,
        records: &mut Vec<HourlyRecord>,
        report: &mut GapReport,
    ) {
        let by_hour = hour_series(station);
        let mut filled_values = BTreeMap::new();

        for variable in Variable::ALL {
            for series in by_hour.values() {
                for (ts, value) in fill_series(station, series, variable) {
                    filled_values
                        .entry(ts)
                        .or_insert_with(Vec::new)
                        .push((variable, value));
                }
            }
        }

        for (ts, cell) in &station.cells {
            let mut values = cell.values;
            let missing_before = values.missing();
            let fills = filled_values.get(ts);

            if let Some(fills) = fills {
                for (variable, value) in fills {
                    values.set(*variable, Some(*value));
                }
            }

            for variable in Variable::ALL {
                values.set(variable, values.get(variable).map(round1));
            }

            if !missing_before.is_empty() {
                let unfilled = values.missing();
                report.values_filled += missing_before.len() - unfilled.len();
                report.values_unfilled += unfilled.len();
                report.entries.push(GapEntry {
                    station: station.station.clone(),
                    timestamp: *ts,
                    row_missing: !cell.observed,
                    filled: join_variables(
                        missing_before.iter().filter(|v| !unfilled.contains(*v)),
                    ),
                    unfilled: join_variables(unfilled.iter()),
                });
            }

            records.push(HourlyRecord::new(
                station.station.clone(),
                *ts,
                values,
                fills.is_some(),
            ));
        }
    }
}

/// Timestamps of one station grouped by hour-of-day, each in date order
fn hour_series(station: &StationGrid) -> BTreeMap<u32, Vec<NaiveDateTime>> {
    let mut series: BTreeMap<u32, Vec<NaiveDateTime>> = BTreeMap::new();
    for ts in station.cells.keys() {
        series.entry(ts.hour()).or_default().push(*ts);
    }
    series
}

/// A value that may stand in as a neighbour for imputation
fn neighbour_value(value: Option<f64>, variable: Variable) -> Option<f64> {
    value.filter(|v| !variable.is_direction() || *v <= MAX_WIND_DIRECTION)
}

/// Fills for the missing cells of one (hour, variable) series.
///
/// The later neighbour is the next observed value; the earlier neighbour is
/// the nearest earlier value, which may itself be a fill.
fn fill_series(
    station: &StationGrid,
    series: &[NaiveDateTime],
    variable: Variable,
) -> Vec<(NaiveDateTime, f64)> {
    let observed: Vec<Option<f64>> = series
        .iter()
        .map(|ts| station.cells.get(ts).and_then(|c| c.values.get(variable)))
        .collect();

    let mut next = vec![None; series.len()];
    let mut upcoming = None;
    for (i, value) in observed.iter().enumerate().rev() {
        next[i] = upcoming;
        if let Some(v) = neighbour_value(*value, variable) {
            upcoming = Some(v);
        }
    }

    let mut fills = Vec::new();
    let mut last = None;
    for (i, ts) in series.iter().enumerate() {
        if observed[i].is_some() {
            if let Some(v) = neighbour_value(observed[i], variable) {
                last = Some(v);
            }
            continue;
        }

        let fill = match (last, next[i]) {
            (Some(a), Some(b)) => Some(round1((a + b) / 2.0)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        if let Some(v) = fill {
            fills.push((*ts, v));
            last = Some(v);
        }
    }
    fills
}

fn join_variables<'a>(variables: impl Iterator<Item = &'a Variable>) -> String {
    variables
        .map(Variable::name)
        .collect::<Vec<_>>()
        .join(";")
}
