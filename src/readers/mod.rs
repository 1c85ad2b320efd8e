pub mod hourly_reader;
pub mod shard_reader;
pub mod station_reader;
pub mod text;

pub use hourly_reader::{split_fields, HourlyDumpReader, RawDump};
pub use shard_reader::{ShardBatch, ShardReader};
pub use station_reader::{Registry, StationCatalog, StationReader, UnlocatedStation};
pub use text::read_latin1;
