//! Wire contract of the EIA hourly grid monitor (`electricity/rto/*`).
//!
//! Transport is left to the caller through [`PageFetcher`]; this module only
//! builds requests, parses response pages and walks pagination.

pub mod page;
pub mod paginate;
pub mod query;

pub use page::{parse_page, to_fuel_generation, to_interchange, to_region_series, EiaPage, EiaRow};
pub use paginate::{fetch_all, PageFetcher, Paginator};
pub use query::{EiaQuery, EiaRoute, EiaSettings, MAX_PAGE_LENGTH};

#[derive(thiserror::Error, Debug)]
pub enum EiaError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("row {index}: {reason}")]
    Row { index: usize, reason: String },
    #[error("pagination stopped after {0} pages without reaching the reported total")]
    PageLimit(usize),
}
