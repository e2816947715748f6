use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Region-level hourly series as published by the grid monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSeriesKind {
    Demand,
    NetGeneration,
    TotalInterchange,
}

impl RegionSeriesKind {
    /// Parses the grid monitor `type` facet (`D`, `NG`, `TI`) or the snake_case name.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "D" | "demand" => Some(Self::Demand),
            "NG" | "net_generation" => Some(Self::NetGeneration),
            "TI" | "total_interchange" => Some(Self::TotalInterchange),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Demand => "D",
            Self::NetGeneration => "NG",
            Self::TotalInterchange => "TI",
        }
    }
}

impl fmt::Display for RegionSeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSeriesRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub region: String,
    pub kind: RegionSeriesKind,
    pub value_mwh: f64,
}

/// Metered energy traded between two regions in one hour.
///
/// `value_mwh` is positive when energy flows from `from_region` into `to_region`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterchangeRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub from_region: String,
    pub to_region: String,
    pub value_mwh: f64,
}
