pub mod attribution;
pub mod config;
pub mod http_api;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use attribution::{run_pipeline, AttributionInputs, FootprintReport};
