use crate::models::observation::Measurements;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// One cell of the cleaned hourly grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    pub station: String,
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub hour: u32,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_dir_deg: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    /// At least one value in this cell was gap-filled
    pub imputed: bool,
}

impl HourlyRecord {
    pub fn new(station: String, timestamp: NaiveDateTime, values: Measurements, imputed: bool) -> Self {
        Self {
            station,
            date: timestamp.date(),
            hour: timestamp.hour(),
            timestamp,
            temperature_c: values.temperature_c,
            humidity_pct: values.humidity_pct,
            pressure_hpa: values.pressure_hpa,
            wind_dir_deg: values.wind_dir_deg,
            wind_speed_kmh: values.wind_speed_kmh,
            imputed,
        }
    }

    pub fn values(&self) -> Measurements {
        Measurements {
            temperature_c: self.temperature_c,
            humidity_pct: self.humidity_pct,
            pressure_hpa: self.pressure_hpa,
            wind_dir_deg: self.wind_dir_deg,
            wind_speed_kmh: self.wind_speed_kmh,
        }
    }
}
