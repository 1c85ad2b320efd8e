pub mod daily;
pub mod enriched;
pub mod hourly;
pub mod ledger;
pub mod observation;
pub mod schema;
pub mod station;

pub use daily::{DailyAggregate, VariableStats};
pub use enriched::EnrichedRecord;
pub use hourly::HourlyRecord;
pub use ledger::{DatasetRunEntry, ProcessedFileEntry};
pub use observation::{parse_timestamp, Measurements, Observation, RawObservation, Variable};
pub use schema::{ColumnIndex, RawColumn};
pub use station::StationCatalogEntry;
