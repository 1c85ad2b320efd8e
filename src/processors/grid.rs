//! Complete station × date × hour grid over the global observed date span.

use crate::models::{Measurements, Observation};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Inclusive calendar span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    /// Span from the earliest to the latest observation date
    pub fn of(observations: &[Observation]) -> Option<Self> {
        let start = observations.iter().map(Observation::date).min()?;
        let end = observations.iter().map(Observation::date).max()?;
        Some(Self { start, end })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// An hour-of-day seen on fewer observed days than the threshold allows
#[derive(Debug, Clone, PartialEq)]
pub struct HourShare {
    pub hour: u32,
    pub days_observed: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationSchedule {
    pub observed_days: usize,
    pub hours: BTreeSet<u32>,
    pub atypical: Vec<HourShare>,
}

impl StationSchedule {
    /// Keep each hour whose share of observed days reaches `threshold`
    pub fn detect(observations: &BTreeMap<NaiveDateTime, Measurements>, threshold: f64) -> Self {
        let observed_dates: BTreeSet<NaiveDate> =
            observations.keys().map(NaiveDateTime::date).collect();
        let observed_days = observed_dates.len();

        let mut days_per_hour: BTreeMap<u32, BTreeSet<NaiveDate>> = BTreeMap::new();
        for ts in observations.keys() {
            days_per_hour
                .entry(chrono::Timelike::hour(ts))
                .or_default()
                .insert(ts.date());
        }

        let mut hours = BTreeSet::new();
        let mut atypical = Vec::new();
        for (hour, days) in days_per_hour {
            let share = days.len() as f64 / observed_days.max(1) as f64;
            if share >= threshold {
                hours.insert(hour);
            } else {
                atypical.push(HourShare {
                    hour,
                    days_observed: days.len(),
                    share,
                });
            }
        }

        Self {
            observed_days,
            hours,
            atypical,
        }
    }
}

/// One grid slot; `observed` is false for slots the dumps never covered
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridCell {
    pub values: Measurements,
    pub observed: bool,
}

#[derive(Debug, Clone)]
pub struct StationGrid {
    pub station: String,
    pub schedule: StationSchedule,
    pub missing_days: Vec<NaiveDate>,
    pub cells: BTreeMap<NaiveDateTime, GridCell>,
}

#[derive(Debug, Clone)]
pub struct CompleteGrid {
    pub span: DateSpan,
    pub stations: Vec<StationGrid>,
    /// Exact (station, timestamp) duplicates dropped while building
    pub duplicates: usize,
}

impl CompleteGrid {
    /// Build the grid; `None` when there are no observations at all.
    ///
    /// Duplicate (station, timestamp) rows keep the first occurrence.
    pub fn build(observations: &[Observation], threshold: f64) -> Option<Self> {
        let span = DateSpan::of(observations)?;

        let mut by_station: HashMap<&str, BTreeMap<NaiveDateTime, Measurements>> = HashMap::new();
        let mut duplicates = 0;
        for obs in observations {
            let series = by_station.entry(obs.station_name.as_str()).or_default();
            if series.contains_key(&obs.timestamp) {
                duplicates += 1;
            } else {
                series.insert(obs.timestamp, obs.values);
            }
        }

        let mut stations: Vec<StationGrid> = by_station
            .into_iter()
            .map(|(station, series)| Self::station_grid(station, &series, span, threshold))
            .collect();
        stations.sort_by(|a, b| a.station.cmp(&b.station));

        debug!(
            "Built grid for {} stations over {} days ({} duplicates dropped)",
            stations.len(),
            span.len(),
            duplicates
        );

        Some(Self {
            span,
            stations,
            duplicates,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.stations.iter().map(|s| s.cells.len()).sum()
    }

    fn station_grid(
        station: &str,
        series: &BTreeMap<NaiveDateTime, Measurements>,
        span: DateSpan,
        threshold: f64,
    ) -> StationGrid {
        let schedule = StationSchedule::detect(series, threshold);
        let observed_dates: BTreeSet<NaiveDate> = series.keys().map(NaiveDateTime::date).collect();

        let missing_days = span
            .days()
            .filter(|d| !observed_dates.contains(d))
            .collect();

        let mut cells = BTreeMap::new();
        for date in span.days() {
            for &hour in &schedule.hours {
                let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
                    continue;
                };
                let ts = date.and_time(time);
                let cell = match series.get(&ts) {
                    Some(values) => GridCell {
                        values: *values,
                        observed: true,
                    },
                    None => GridCell::default(),
                };
                cells.insert(ts, cell);
            }
        }

        StationGrid {
            station: station.to_string(),
            schedule,
            missing_days,
            cells,
        }
    }
}
