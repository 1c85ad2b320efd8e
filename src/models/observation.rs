use crate::models::schema::{ColumnIndex, RawColumn};
use crate::utils::numbers::parse_decimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Continuous variables carried by every hourly observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    Temperature,
    Humidity,
    Pressure,
    WindDirection,
    WindSpeed,
}

impl Variable {
    pub const ALL: [Variable; 5] = [
        Variable::Temperature,
        Variable::Humidity,
        Variable::Pressure,
        Variable::WindDirection,
        Variable::WindSpeed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variable::Temperature => "temperature_c",
            Variable::Humidity => "humidity_pct",
            Variable::Pressure => "pressure_hpa",
            Variable::WindDirection => "wind_dir_deg",
            Variable::WindSpeed => "wind_speed_kmh",
        }
    }

    /// Direction-type variables average only over in-domain values
    pub fn is_direction(&self) -> bool {
        matches!(self, Variable::WindDirection)
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_dir_deg: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

impl Measurements {
    pub fn get(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Temperature => self.temperature_c,
            Variable::Humidity => self.humidity_pct,
            Variable::Pressure => self.pressure_hpa,
            Variable::WindDirection => self.wind_dir_deg,
            Variable::WindSpeed => self.wind_speed_kmh,
        }
    }

    pub fn set(&mut self, variable: Variable, value: Option<f64>) {
        let slot = match variable {
            Variable::Temperature => &mut self.temperature_c,
            Variable::Humidity => &mut self.humidity_pct,
            Variable::Pressure => &mut self.pressure_hpa,
            Variable::WindDirection => &mut self.wind_dir_deg,
            Variable::WindSpeed => &mut self.wind_speed_kmh,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        Variable::ALL.iter().all(|v| self.get(*v).is_none())
    }

    pub fn missing(&self) -> Vec<Variable> {
        Variable::ALL
            .into_iter()
            .filter(|v| self.get(*v).is_none())
            .collect()
    }
}

/// A raw dump row kept verbatim, as stored in the filtered tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObservation {
    #[serde(rename = "FECHA")]
    pub date: String,
    #[serde(rename = "HORA")]
    pub hour: String,
    #[serde(rename = "TEMP")]
    pub temperature: String,
    #[serde(rename = "HUM")]
    pub humidity: String,
    #[serde(rename = "PNM")]
    pub pressure: String,
    #[serde(rename = "DD")]
    pub wind_direction: String,
    #[serde(rename = "FF")]
    pub wind_speed: String,
    #[serde(rename = "NOMBRE")]
    pub station_name: String,
}

impl RawObservation {
    /// Pick the declared columns out of a split body row.
    ///
    /// Returns `None` for rows too short to carry a station name.
    pub fn from_fields(index: &ColumnIndex, fields: &[&str]) -> Option<Self> {
        let field = |column: RawColumn| index.get(fields, column).unwrap_or("").to_string();
        let station_name = index.get(fields, RawColumn::StationName)?.to_string();

        Some(Self {
            date: field(RawColumn::Date),
            hour: field(RawColumn::Hour),
            temperature: field(RawColumn::Temperature),
            humidity: field(RawColumn::Humidity),
            pressure: field(RawColumn::Pressure),
            wind_direction: field(RawColumn::WindDirection),
            wind_speed: field(RawColumn::WindSpeed),
            station_name,
        })
    }

    /// Type the row. Rows without a valid timestamp yield `None`; numeric
    /// fields that fail to parse become missing values.
    pub fn parse(&self) -> Option<Observation> {
        let timestamp = parse_timestamp(&self.date, &self.hour)?;
        let station_name = self.station_name.trim();
        if station_name.is_empty() {
            return None;
        }

        Some(Observation {
            station_name: station_name.to_string(),
            timestamp,
            values: Measurements {
                temperature_c: parse_decimal(&self.temperature),
                humidity_pct: parse_decimal(&self.humidity),
                pressure_hpa: parse_decimal(&self.pressure),
                wind_dir_deg: parse_decimal(&self.wind_direction),
                wind_speed_kmh: parse_decimal(&self.wind_speed),
            },
        })
    }
}

/// One typed hourly observation for one station
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station_name: String,
    pub timestamp: NaiveDateTime,
    pub values: Measurements,
}

impl Observation {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> u32 {
        use chrono::Timelike;
        self.timestamp.hour()
    }
}

/// Combine a `ddmmyyyy` date and an hour field into one timestamp
pub fn parse_timestamp(date: &str, hour: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if date.is_empty() || date.len() > 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0>8}", date);
    let day = NaiveDate::parse_from_str(&padded, "%d%m%Y").ok()?;

    let hour = hour.trim().parse::<u32>().ok()?;
    let time = NaiveTime::from_hms_opt(hour, 0, 0)?;

    Some(day.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, hour: &str, temp: &str) -> RawObservation {
        RawObservation {
            date: date.to_string(),
            hour: hour.to_string(),
            temperature: temp.to_string(),
            humidity: "58".to_string(),
            pressure: "1007,4".to_string(),
            wind_direction: "990".to_string(),
            wind_speed: "".to_string(),
            station_name: " NEUQUEN AERO ".to_string(),
        }
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("01012024", "05").unwrap();
        assert_eq!(ts.to_string(), "2024-01-01 05:00:00");

        // Leading zero lost by a numeric round trip
        let ts = parse_timestamp("1012024", "0").unwrap();
        assert_eq!(ts.to_string(), "2024-01-01 00:00:00");

        assert!(parse_timestamp("32012024", "0").is_none());
        assert!(parse_timestamp("01012024", "24").is_none());
        assert!(parse_timestamp("[HOR]", "0").is_none());
    }

    #[test]
    fn test_parse_raw_observation() {
        let obs = raw("15032024", "12", "24,6").parse().unwrap();

        assert_eq!(obs.station_name, "NEUQUEN AERO");
        assert_eq!(obs.hour(), 12);
        assert_eq!(obs.values.temperature_c, Some(24.6));
        assert_eq!(obs.values.pressure_hpa, Some(1007.4));
        // Out of domain direction is kept as observed
        assert_eq!(obs.values.wind_dir_deg, Some(990.0));
        assert_eq!(obs.values.wind_speed_kmh, None);
    }

    #[test]
    fn test_invalid_numeric_becomes_missing() {
        let obs = raw("15032024", "12", "--").parse().unwrap();
        assert_eq!(obs.values.temperature_c, None);
        assert_eq!(
            obs.values.missing(),
            vec![Variable::Temperature, Variable::WindSpeed]
        );
    }

    #[test]
    fn test_invalid_timestamp_drops_row() {
        assert!(raw("", "12", "20").parse().is_none());
    }

    #[test]
    fn test_measurements_get_set() {
        let mut m = Measurements::default();
        assert!(m.is_empty());
        m.set(Variable::WindSpeed, Some(12.0));
        assert_eq!(m.get(Variable::WindSpeed), Some(12.0));
        assert!(!m.is_empty());
    }
}
