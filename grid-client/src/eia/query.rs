use std::{collections::BTreeMap, fmt};

use serde::Deserialize;
use serde_json::{json, Value};
use time::Date;

/// Maximum rows the API returns per call.
pub const MAX_PAGE_LENGTH: usize = 5000;

fn default_base_url() -> String {
    "https://api.eia.gov/v2".to_string()
}

fn default_page_size() -> usize {
    MAX_PAGE_LENGTH
}

/// Connection settings, built once from configuration and passed by reference.
#[derive(Clone, Deserialize)]
pub struct EiaSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl fmt::Debug for EiaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EiaSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl EiaSettings {
    /// Page size clamped to what the API accepts.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_LENGTH)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EiaRoute {
    RegionData,
    Interchange,
    FuelType,
}

impl EiaRoute {
    pub fn segment(self) -> &'static str {
        match self {
            Self::RegionData => "region-data",
            Self::Interchange => "interchange-data",
            Self::FuelType => "fuel-type-data",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EiaQuery {
    pub route: EiaRoute,
    pub facets: BTreeMap<String, Vec<String>>,
    pub start: Date,
    pub end: Date,
    pub frequency: String,
}

impl EiaQuery {
    fn hourly(route: EiaRoute, start: Date, end: Date) -> Self {
        Self {
            route,
            facets: BTreeMap::new(),
            start,
            end,
            frequency: "hourly".to_string(),
        }
    }

    /// Demand, net generation and total interchange; the demand forecast is excluded.
    pub fn region_data(regions: &[String], start: Date, end: Date) -> Self {
        let mut q = Self::hourly(EiaRoute::RegionData, start, end);
        q.facets.insert("respondent".to_string(), regions.to_vec());
        q.facets.insert(
            "type".to_string(),
            vec!["D".to_string(), "NG".to_string(), "TI".to_string()],
        );
        q
    }

    /// Interchange flowing to any of `regions`.
    pub fn interchange(regions: &[String], start: Date, end: Date) -> Self {
        let mut q = Self::hourly(EiaRoute::Interchange, start, end);
        q.facets.insert("toba".to_string(), regions.to_vec());
        q
    }

    pub fn fuel_mix(regions: &[String], start: Date, end: Date) -> Self {
        let mut q = Self::hourly(EiaRoute::FuelType, start, end);
        q.facets.insert("respondent".to_string(), regions.to_vec());
        q
    }

    pub fn url(&self, settings: &EiaSettings) -> String {
        format!(
            "{}/electricity/rto/{}/data/?api_key={}",
            settings.base_url.trim_end_matches('/'),
            self.route.segment(),
            settings.api_key
        )
    }

    /// Body of the `X-Params` header for one page.
    pub fn params(&self, offset: usize, length: usize) -> Value {
        json!({
            "frequency": self.frequency,
            "data": ["value"],
            "facets": self.facets,
            "start": self.start.to_string(),
            "end": self.end.to_string(),
            "sort": [{ "column": "period", "direction": "desc" }],
            "offset": offset,
            "length": length,
        })
    }
}
