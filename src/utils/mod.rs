pub mod constants;
pub mod coordinates;
pub mod layout;
pub mod names;
pub mod numbers;
pub mod progress;

pub use constants::*;
pub use coordinates::{degrees_minutes_to_decimal, parse_degrees_minutes};
pub use layout::DataLayout;
pub use names::{raw_date_stamp, station_folder_name};
pub use numbers::{parse_decimal, round1, round_to};
pub use progress::ProgressReporter;
