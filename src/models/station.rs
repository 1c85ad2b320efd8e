use serde::{Deserialize, Serialize};
use validator::Validate;

/// One row of the national station registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationCatalogEntry {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub province: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub altitude_m: i32,

    pub station_number: u32,

    pub station_code: String,
}

impl StationCatalogEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        province: String,
        latitude: f64,
        longitude: f64,
        altitude_m: i32,
        station_number: u32,
        station_code: String,
    ) -> Self {
        Self {
            name,
            province,
            latitude,
            longitude,
            altitude_m,
            station_number,
            station_code,
        }
    }

    /// Province comparison is trimmed and case-insensitive
    pub fn is_in_province(&self, province: &str) -> bool {
        self.province.trim().to_uppercase() == province.trim().to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        let station = StationCatalogEntry::new(
            "NEUQUEN AERO".to_string(),
            "NEUQUEN".to_string(),
            -38.95,
            -68.133333,
            271,
            87715,
            "SAZN".to_string(),
        );

        assert!(station.validate().is_ok());
        assert!(station.is_in_province("neuquen"));
        assert!(station.is_in_province(" Neuquen "));
        assert!(!station.is_in_province("TIERRA DEL FUEGO"));
    }

    #[test]
    fn test_invalid_coordinates() {
        let station = StationCatalogEntry::new(
            "BROKEN".to_string(),
            "NEUQUEN".to_string(),
            -95.0,
            -68.0,
            0,
            1,
            "XXXX".to_string(),
        );

        assert!(station.validate().is_err());
    }
}
