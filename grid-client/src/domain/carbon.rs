use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Energy consumed in the local region, attributed to the region that generated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionBySource {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub source_region: String,
    pub consumed_mwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonIntensityRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub intensity_g_per_kwh: f64,
}

/// Usage joined with attributed intensity. `None` marks an hour with no
/// attributable intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetFootprintRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub usage_kwh: f64,
    pub intensity_g_per_kwh: Option<f64>,
    pub net_gco2: Option<f64>,
}

/// One point of any hourly intensity-shaped series (observed, historical or forecast).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub value: Option<f64>,
}

impl From<&CarbonIntensityRecord> for IntensityPoint {
    fn from(r: &CarbonIntensityRecord) -> Self {
        IntensityPoint {
            ts: r.ts,
            value: Some(r.intensity_g_per_kwh),
        }
    }
}
