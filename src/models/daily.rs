use crate::models::observation::Variable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Mean/min/max of one variable over one station-day
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VariableStats {
    pub mean: Option<f64>,
    pub min: Option<i32>,
    pub max: Option<i32>,
}

/// Daily aggregate of the cleaned hourly grid for one station.
///
/// Means are rounded to one decimal, min/max to integers. The `*_norm`
/// columns hold min-max scaled means and never replace the raw ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub station: String,
    pub date: NaiveDate,

    pub temperature_mean: Option<f64>,
    pub temperature_min: Option<i32>,
    pub temperature_max: Option<i32>,

    pub pressure_mean: Option<f64>,
    pub pressure_min: Option<i32>,
    pub pressure_max: Option<i32>,

    pub humidity_mean: Option<f64>,
    pub humidity_min: Option<i32>,
    pub humidity_max: Option<i32>,

    pub wind_dir_mean: Option<f64>,
    pub wind_dir_min: Option<i32>,
    pub wind_dir_max: Option<i32>,

    pub wind_speed_mean: Option<f64>,
    pub wind_speed_min: Option<i32>,
    pub wind_speed_max: Option<i32>,

    pub temperature_mean_norm: Option<f64>,
    pub pressure_mean_norm: Option<f64>,
    pub humidity_mean_norm: Option<f64>,
    pub wind_dir_mean_norm: Option<f64>,
    pub wind_speed_mean_norm: Option<f64>,
}

impl DailyAggregate {
    pub fn new(station: String, date: NaiveDate) -> Self {
        Self {
            station,
            date,
            temperature_mean: None,
            temperature_min: None,
            temperature_max: None,
            pressure_mean: None,
            pressure_min: None,
            pressure_max: None,
            humidity_mean: None,
            humidity_min: None,
            humidity_max: None,
            wind_dir_mean: None,
            wind_dir_min: None,
            wind_dir_max: None,
            wind_speed_mean: None,
            wind_speed_min: None,
            wind_speed_max: None,
            temperature_mean_norm: None,
            pressure_mean_norm: None,
            humidity_mean_norm: None,
            wind_dir_mean_norm: None,
            wind_speed_mean_norm: None,
        }
    }

    pub fn stats(&self, variable: Variable) -> VariableStats {
        match variable {
            Variable::Temperature => VariableStats {
                mean: self.temperature_mean,
                min: self.temperature_min,
                max: self.temperature_max,
            },
            Variable::Humidity => VariableStats {
                mean: self.humidity_mean,
                min: self.humidity_min,
                max: self.humidity_max,
            },
            Variable::Pressure => VariableStats {
                mean: self.pressure_mean,
                min: self.pressure_min,
                max: self.pressure_max,
            },
            Variable::WindDirection => VariableStats {
                mean: self.wind_dir_mean,
                min: self.wind_dir_min,
                max: self.wind_dir_max,
            },
            Variable::WindSpeed => VariableStats {
                mean: self.wind_speed_mean,
                min: self.wind_speed_min,
                max: self.wind_speed_max,
            },
        }
    }

    pub fn set_stats(&mut self, variable: Variable, stats: VariableStats) {
        let (mean, min, max) = match variable {
            Variable::Temperature => (
                &mut self.temperature_mean,
                &mut self.temperature_min,
                &mut self.temperature_max,
            ),
            Variable::Humidity => (
                &mut self.humidity_mean,
                &mut self.humidity_min,
                &mut self.humidity_max,
            ),
            Variable::Pressure => (
                &mut self.pressure_mean,
                &mut self.pressure_min,
                &mut self.pressure_max,
            ),
            Variable::WindDirection => (
                &mut self.wind_dir_mean,
                &mut self.wind_dir_min,
                &mut self.wind_dir_max,
            ),
            Variable::WindSpeed => (
                &mut self.wind_speed_mean,
                &mut self.wind_speed_min,
                &mut self.wind_speed_max,
            ),
        };
        *mean = stats.mean;
        *min = stats.min;
        *max = stats.max;
    }

    pub fn mean(&self, variable: Variable) -> Option<f64> {
        self.stats(variable).mean
    }

    pub fn normalized(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Temperature => self.temperature_mean_norm,
            Variable::Humidity => self.humidity_mean_norm,
            Variable::Pressure => self.pressure_mean_norm,
            Variable::WindDirection => self.wind_dir_mean_norm,
            Variable::WindSpeed => self.wind_speed_mean_norm,
        }
    }

    pub fn set_normalized(&mut self, variable: Variable, value: Option<f64>) {
        let slot = match variable {
            Variable::Temperature => &mut self.temperature_mean_norm,
            Variable::Humidity => &mut self.humidity_mean_norm,
            Variable::Pressure => &mut self.pressure_mean_norm,
            Variable::WindDirection => &mut self.wind_dir_mean_norm,
            Variable::WindSpeed => &mut self.wind_speed_mean_norm,
        };
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_round_trip_per_variable() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut daily = DailyAggregate::new("NEUQUEN AERO".to_string(), date);

        let stats = VariableStats {
            mean: Some(21.4),
            min: Some(14),
            max: Some(29),
        };
        daily.set_stats(Variable::Temperature, stats);
        daily.set_normalized(Variable::Temperature, Some(0.5));

        assert_eq!(daily.stats(Variable::Temperature), stats);
        assert_eq!(daily.temperature_max, Some(29));
        assert_eq!(daily.normalized(Variable::Temperature), Some(0.5));
        assert_eq!(daily.stats(Variable::Pressure), VariableStats::default());
    }
}
