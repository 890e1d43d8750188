//! Field-history rows: normalization, client-side sorting, and CSV export.

pub mod export;
pub mod sort;
pub mod transform;
pub mod types;

pub use export::{CsvExport, export_file_name, to_csv};
pub use sort::{SortDirection, SortSpec};
pub use transform::transform;
pub use types::{HistoryRow, PicklistOption, RawHistoryRecord, TimeValue};
