use crate::models::daily::{DailyAggregate, VariableStats};
use crate::models::observation::Variable;
use crate::utils::numbers::round1;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily aggregate plus derived range metrics; the terminal artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
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

    pub thermal_amplitude: Option<f64>,
    pub pressure_range: Option<f64>,
    pub humidity_range: Option<f64>,
}

fn range(min: Option<i32>, max: Option<i32>) -> Option<f64> {
    match (min, max) {
        (Some(lo), Some(hi)) => Some(round1(f64::from(hi) - f64::from(lo))),
        _ => None,
    }
}

impl EnrichedRecord {
    pub fn stats(&self, variable: Variable) -> VariableStats {
        let (mean, min, max) = match variable {
            Variable::Temperature => (self.temperature_mean, self.temperature_min, self.temperature_max),
            Variable::Humidity => (self.humidity_mean, self.humidity_min, self.humidity_max),
            Variable::Pressure => (self.pressure_mean, self.pressure_min, self.pressure_max),
            Variable::WindDirection => (self.wind_dir_mean, self.wind_dir_min, self.wind_dir_max),
            Variable::WindSpeed => (self.wind_speed_mean, self.wind_speed_min, self.wind_speed_max),
        };
        VariableStats { mean, min, max }
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
}

impl From<DailyAggregate> for EnrichedRecord {
    fn from(daily: DailyAggregate) -> Self {
        let thermal_amplitude = range(daily.temperature_min, daily.temperature_max);
        let pressure_range = range(daily.pressure_min, daily.pressure_max);
        let humidity_range = range(daily.humidity_min, daily.humidity_max);

        Self {
            station: daily.station,
            date: daily.date,
            temperature_mean: daily.temperature_mean,
            temperature_min: daily.temperature_min,
            temperature_max: daily.temperature_max,
            pressure_mean: daily.pressure_mean,
            pressure_min: daily.pressure_min,
            pressure_max: daily.pressure_max,
            humidity_mean: daily.humidity_mean,
            humidity_min: daily.humidity_min,
            humidity_max: daily.humidity_max,
            wind_dir_mean: daily.wind_dir_mean,
            wind_dir_min: daily.wind_dir_min,
            wind_dir_max: daily.wind_dir_max,
            wind_speed_mean: daily.wind_speed_mean,
            wind_speed_min: daily.wind_speed_min,
            wind_speed_max: daily.wind_speed_max,
            temperature_mean_norm: daily.temperature_mean_norm,
            pressure_mean_norm: daily.pressure_mean_norm,
            humidity_mean_norm: daily.humidity_mean_norm,
            wind_dir_mean_norm: daily.wind_dir_mean_norm,
            wind_speed_mean_norm: daily.wind_speed_mean_norm,
            thermal_amplitude,
            pressure_range,
            humidity_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_ranges() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut daily = DailyAggregate::new("NEUQUEN AERO".to_string(), date);
        daily.temperature_min = Some(-3);
        daily.temperature_max = Some(12);
        daily.pressure_min = Some(1004);
        daily.pressure_max = Some(1011);
        daily.humidity_max = Some(80);

        let enriched = EnrichedRecord::from(daily);

        assert_eq!(enriched.thermal_amplitude, Some(15.0));
        assert_eq!(enriched.pressure_range, Some(7.0));
        assert_eq!(enriched.humidity_range, None);
        assert_eq!(enriched.temperature_min, Some(-3));
    }
}
