use crate::models::{DailyAggregate, HourlyRecord, Variable, VariableStats};
use crate::utils::constants::{MAX_WIND_DIRECTION, NORMALIZED_DECIMALS};
use crate::utils::numbers::{mean, min_max, round1, round_to};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Station-day statistics plus min-max normalized means
#[derive(Debug, Default)]
pub struct DailyAggregator;

impl DailyAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, records: &[HourlyRecord]) -> Vec<DailyAggregate> {
        let mut daily = aggregate_daily(records);
        normalize_means(&mut daily);
        daily
    }
}

/// Mean, min and max of every variable per (station, date).
///
/// Direction means ignore values above 360 degrees; min and max do not.
pub fn aggregate_daily(records: &[HourlyRecord]) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<(&str, NaiveDate), Vec<&HourlyRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.station.as_str(), record.date))
            .or_default()
            .push(record);
    }

    let groups: Vec<_> = groups.into_iter().collect();
    groups
        .par_iter()
        .map(|((station, date), day)| {
            let mut aggregate = DailyAggregate::new(station.to_string(), *date);
            for variable in Variable::ALL {
                aggregate.set_stats(variable, day_stats(day, variable));
            }
            aggregate
        })
        .collect()
}

fn day_stats(day: &[&HourlyRecord], variable: Variable) -> VariableStats {
    let values: Vec<f64> = day
        .iter()
        .filter_map(|r| r.values().get(variable))
        .collect();

    let mean_values = values
        .iter()
        .copied()
        .filter(|v| !variable.is_direction() || *v <= MAX_WIND_DIRECTION);

    let extremes = min_max(values.iter().copied());

    VariableStats {
        mean: mean(mean_values).map(round1),
        min: extremes.map(|(lo, _)| lo.round() as i32),
        max: extremes.map(|(_, hi)| hi.round() as i32),
    }
}

/// Min-max normalize each daily mean over the whole table.
///
/// A constant column normalizes to 0.0; a missing mean stays missing.
pub fn normalize_means(daily: &mut [DailyAggregate]) {
    for variable in Variable::ALL {
        let Some((lo, hi)) = min_max(daily.iter().filter_map(|d| d.mean(variable))) else {
            continue;
        };
        let range = hi - lo;

        for row in daily.iter_mut() {
            let normalized = row.mean(variable).map(|m| {
                if range > 0.0 {
                    round_to((m - lo) / range, NORMALIZED_DECIMALS)
                } else {
                    0.0
                }
            });
            row.set_normalized(variable, normalized);
        }
    }
}
