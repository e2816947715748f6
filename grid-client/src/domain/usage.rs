use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Metered consumption supplied by the caller, one row per hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalUsageRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub usage_kwh: f64,
}
