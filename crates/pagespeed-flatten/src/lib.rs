//! Reshapes raw `PageSpeed` reports into flat, fixed-schema tables.

pub mod error;
pub mod extract;
pub mod flatten;
pub mod schema;
pub mod table;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use error::{ExtractError, FlattenError};
pub use flatten::{extract_row, flatten, ErrorPolicy};
pub use schema::TableSchema;
pub use table::{Cell, FetchStamp, FlatRow, FlatTable, ERROR_SENTINEL};
pub use types::{Distribution, FieldMetric, FieldRecord, LabRecord};
