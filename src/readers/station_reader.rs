use crate::error::{PipelineError, Result};
use crate::models::StationCatalogEntry;
use crate::readers::text::read_latin1;
use crate::utils::coordinates::parse_degrees_minutes;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};
use validator::Validate;

/// name, province, lat deg/min, lon deg/min, altitude, number, code
static STATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>.+?)\s{2,}(?P<province>.+?)\s{2,}(?P<lat_deg>-?\d+)\s+(?P<lat_min>\d+)\s+(?P<lon_deg>-?\d+)\s+(?P<lon_min>\d+)\s+(?P<altitude>-?\d+)\s+(?P<number>\d+)\s+(?P<code>\S+)\s*$",
    )
    .expect("station line pattern is valid")
});

/// A registry line that matched the line pattern but whose coordinates or
/// numbers could not be used. Its name still belongs to its province.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlocatedStation {
    pub name: String,
    pub province: String,
}

impl UnlocatedStation {
    fn is_in_province(&self, province: &str) -> bool {
        self.province.trim().to_uppercase() == province.trim().to_uppercase()
    }
}

/// Everything the registry yields for province resolution
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub stations: Vec<StationCatalogEntry>,
    pub unlocated: Vec<UnlocatedStation>,
}

enum RegistryLine {
    Located(StationCatalogEntry),
    Unlocated(UnlocatedStation),
}

pub struct StationReader {
    header_lines: usize,
}

impl StationReader {
    pub fn new() -> Self {
        Self { header_lines: 2 }
    }

    pub fn with_header_lines(header_lines: usize) -> Self {
        Self { header_lines }
    }

    /// Read the registry file.
    ///
    /// A missing registry is a hard configuration error; unmatched rows are
    /// skipped.
    pub fn read_registry(&self, path: &Path) -> Result<Registry> {
        if !path.exists() {
            return Err(PipelineError::CatalogMissing {
                path: path.to_path_buf(),
            });
        }

        let text = read_latin1(path)?;
        Ok(self.parse_registry(&text))
    }

    pub fn parse_registry(&self, text: &str) -> Registry {
        let mut registry = Registry::default();

        for (line_number, line) in text.lines().enumerate().skip(self.header_lines) {
            if line.trim().is_empty() {
                continue;
            }

            match self.parse_station_line(line) {
                Some(RegistryLine::Located(station)) => registry.stations.push(station),
                Some(RegistryLine::Unlocated(station)) => {
                    warn!(
                        line = line_number + 1,
                        station = %station.name,
                        "Registry line has unusable coordinates; keeping the name only"
                    );
                    registry.unlocated.push(station);
                }
                None => debug!(line = line_number + 1, "Skipping unmatched registry line"),
            }
        }

        registry
    }

    /// Parse a single line from the registry
    fn parse_station_line(&self, line: &str) -> Option<RegistryLine> {
        let caps = STATION_LINE.captures(line)?;
        let name = caps["name"].trim().to_string();
        let province = caps["province"].trim().to_uppercase();

        Some(match locate(&caps, &name, &province) {
            Some(station) => RegistryLine::Located(station),
            None => RegistryLine::Unlocated(UnlocatedStation { name, province }),
        })
    }
}

fn locate(caps: &Captures, name: &str, province: &str) -> Option<StationCatalogEntry> {
    let station = StationCatalogEntry::new(
        name.to_string(),
        province.to_string(),
        parse_degrees_minutes(&caps["lat_deg"], &caps["lat_min"]).ok()?,
        parse_degrees_minutes(&caps["lon_deg"], &caps["lon_min"]).ok()?,
        caps["altitude"].parse().ok()?,
        caps["number"].parse().ok()?,
        caps["code"].to_string(),
    );
    station.validate().ok()?;
    Some(station)
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// The parsed registry; resolves a province to its station names
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    entries: Vec<StationCatalogEntry>,
    unlocated: Vec<UnlocatedStation>,
}

impl StationCatalog {
    pub fn new(entries: Vec<StationCatalogEntry>) -> Self {
        Self {
            entries,
            unlocated: Vec::new(),
        }
    }

    pub fn from_registry(registry: Registry) -> Self {
        Self {
            entries: registry.stations,
            unlocated: registry.unlocated,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = StationReader::new();
        Ok(Self::from_registry(reader.read_registry(path)?))
    }

    pub fn entries(&self) -> &[StationCatalogEntry] {
        &self.entries
    }

    pub fn unlocated(&self) -> &[UnlocatedStation] {
        &self.unlocated
    }

    pub fn stations_in(&self, province: &str) -> Vec<&StationCatalogEntry> {
        self.entries
            .iter()
            .filter(|s| s.is_in_province(province))
            .collect()
    }

    /// Deduplicated station names of a province; empty when none match.
    ///
    /// Stations with unusable coordinates are still in scope.
    pub fn resolve(&self, province: &str) -> BTreeSet<String> {
        let located = self.stations_in(province).into_iter().map(|s| s.name.trim());
        let unlocated = self
            .unlocated
            .iter()
            .filter(|s| s.is_in_province(province))
            .map(|s| s.name.trim());

        located.chain(unlocated).map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const REGISTRY: &str = "\
NOMBRE                                            PROVINCIA                 LATITUD    LONGITUD   ALTURA   NUMERO  NroOACI
                                                                            GR  MIN    GR  MIN
NEUQUEN AERO                                      NEUQUEN                   -38    57   -68     8     271    87715   SAZN
CHAPELCO AERO                                     NEUQUEN                   -40     4   -71     8     779    87761   SAZY
USHUAIA AERO                                      TIERRA DEL FUEGO          -54    48   -68    19      57    87938   SAWH
this line is not a station
NEUQUEN AERO                                      neuquen                   -38    57   -68     8     271    87715   SAZN
";

    #[test]
    fn test_parse_station_line() {
        let reader = StationReader::new();
        let line = "NEUQUEN AERO                                      NEUQUEN                   -38    57   -68     8     271    87715   SAZN";
        let Some(RegistryLine::Located(station)) = reader.parse_station_line(line) else {
            panic!("line should parse with coordinates");
        };

        assert_eq!(station.name, "NEUQUEN AERO");
        assert_eq!(station.province, "NEUQUEN");
        assert!((station.latitude - -38.95).abs() < 0.00001);
        assert!((station.longitude - -68.133333).abs() < 0.0001);
        assert_eq!(station.altitude_m, 271);
        assert_eq!(station.station_number, 87715);
        assert_eq!(station.station_code, "SAZN");
    }

    #[test]
    fn test_unmatched_lines_are_skipped() {
        let reader = StationReader::new();
        let registry = reader.parse_registry(REGISTRY);
        assert_eq!(registry.stations.len(), 4);
        assert!(registry.unlocated.is_empty());
    }

    #[test]
    fn test_resolve_province() {
        let catalog = StationCatalog::from_registry(StationReader::new().parse_registry(REGISTRY));

        let neuquen = catalog.resolve("neuquen");
        assert_eq!(neuquen.len(), 2);
        assert!(neuquen.contains("NEUQUEN AERO"));
        assert!(neuquen.contains("CHAPELCO AERO"));
        assert!(!neuquen.contains("USHUAIA AERO"));

        assert!(catalog.resolve("MISIONES").is_empty());
    }

    #[test]
    fn test_unusable_coordinates_keep_the_name() {
        let registry = "\
NOMBRE  PROVINCIA
--
ZAPALA                                            NEUQUEN                   -38    75   -70     4    1010    87715   SAZZ
";
        let parsed = StationReader::new().parse_registry(registry);
        assert!(parsed.stations.is_empty());
        assert_eq!(
            parsed.unlocated,
            vec![UnlocatedStation {
                name: "ZAPALA".to_string(),
                province: "NEUQUEN".to_string(),
            }]
        );

        let catalog = StationCatalog::from_registry(parsed);
        assert!(catalog.stations_in("NEUQUEN").is_empty());
        assert!(catalog.resolve("neuquen").contains("ZAPALA"));
    }

    #[test]
    fn test_read_stations_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(REGISTRY.as_bytes())?;

        let catalog = StationCatalog::load(temp_file.path())?;
        assert_eq!(catalog.resolve("TIERRA DEL FUEGO").len(), 1);

        Ok(())
    }

    #[test]
    fn test_missing_registry_is_fatal() {
        let err = StationCatalog::load(Path::new("/nonexistent/stations.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::CatalogMissing { .. }));
    }
}
