pub mod csv_writer;
pub mod parquet_writer;
pub mod profile;
pub mod reports;

pub use csv_writer::{
    read_csv, write_csv_atomic, write_delimited_atomic, write_text_atomic, write_with_header_atomic,
};
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use profile::{profile_columns, ColumnProfile, DatasetInfo};
