pub mod csv_report;
pub mod fingerprint;

pub use csv_report::{create_file, write_footprint_csv, write_histogram_csv};
pub use fingerprint::{fingerprint, TableHash};
