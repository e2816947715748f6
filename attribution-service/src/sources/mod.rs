pub mod csv_table;
pub mod eia;
pub mod gridemissions;

pub use csv_table::{CsvRow, CsvTableSource, FromCsvRow};
pub use eia::load_grid_inputs;
pub use gridemissions::{column_timezone, intensity_column, load_bulk, BulkHistory, HistoryRow};
