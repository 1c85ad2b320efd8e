use crate::utils::constants::RAW_FILE_PREFIX;
use std::path::Path;

/// Folder name for a station: lower-cased, spaces replaced by underscores.
///
/// # Examples
/// ```
/// use smn_pipeline::utils::station_folder_name;
///
/// assert_eq!(station_folder_name("NEUQUEN AERO"), "neuquen_aero");
/// ```
pub fn station_folder_name(station: &str) -> String {
    station.trim().to_lowercase().replace(' ', "_")
}

/// Date stamp of a raw dump, e.g. `datohorario20240101.txt` -> `20240101`
pub fn raw_date_stamp(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.replace(RAW_FILE_PREFIX, "")
}
