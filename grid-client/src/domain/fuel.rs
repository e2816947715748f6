use std::{collections::HashMap, fmt};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Fuel category of a slice of a region's generation.
///
/// Codes outside the known set are kept verbatim as `Unrecognized` and carry
/// a zero emission factor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FuelType {
    Oil,
    Coal,
    NaturalGas,
    Solar,
    Hydro,
    Nuclear,
    Wind,
    Other,
    Unknown,
    Biomass,
    Geothermal,
    Unrecognized(String),
}

// Descriptive codes and the grid monitor's short `fueltype` codes both resolve here.
static FUEL_CODES: Lazy<HashMap<&'static str, FuelType>> = Lazy::new(|| {
    HashMap::from([
        ("OIL", FuelType::Oil),
        ("COAL", FuelType::Coal),
        ("COL", FuelType::Coal),
        ("NATURAL_GAS", FuelType::NaturalGas),
        ("NG", FuelType::NaturalGas),
        ("SOLAR", FuelType::Solar),
        ("SUN", FuelType::Solar),
        ("HYDRO", FuelType::Hydro),
        ("WAT", FuelType::Hydro),
        ("NUCLEAR", FuelType::Nuclear),
        ("NUC", FuelType::Nuclear),
        ("WIND", FuelType::Wind),
        ("WND", FuelType::Wind),
        ("OTHER", FuelType::Other),
        ("OTH", FuelType::Other),
        ("UNKNOWN", FuelType::Unknown),
        ("UNK", FuelType::Unknown),
        ("BIOMASS", FuelType::Biomass),
        ("BIO", FuelType::Biomass),
        ("GEOTHERMAL", FuelType::Geothermal),
        ("GEO", FuelType::Geothermal),
    ])
});

impl FuelType {
    /// Exact-match lookup; anything not in the table becomes `Unrecognized`.
    pub fn from_code(code: &str) -> Self {
        FUEL_CODES
            .get(code)
            .cloned()
            .unwrap_or_else(|| Self::Unrecognized(code.to_string()))
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Oil => "OIL",
            Self::Coal => "COAL",
            Self::NaturalGas => "NATURAL_GAS",
            Self::Solar => "SOLAR",
            Self::Hydro => "HYDRO",
            Self::Nuclear => "NUCLEAR",
            Self::Wind => "WIND",
            Self::Other => "OTHER",
            Self::Unknown => "UNKNOWN",
            Self::Biomass => "BIOMASS",
            Self::Geothermal => "GEOTHERMAL",
            Self::Unrecognized(code) => code,
        }
    }

    /// Average grams of CO2-equivalent per kWh generated.
    pub fn emission_factor(&self) -> f64 {
        match self {
            Self::Oil => 840.0,
            Self::Coal => 1000.0,
            Self::NaturalGas => 469.0,
            Self::Solar => 46.0,
            Self::Hydro => 4.0,
            Self::Nuclear => 16.0,
            Self::Wind => 12.0,
            Self::Other | Self::Unknown => 439.0,
            Self::Biomass => 230.0,
            Self::Geothermal => 42.0,
            Self::Unrecognized(_) => 0.0,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

/// Emission factor for a raw fuel code, in g/kWh. Unknown codes yield 0.
pub fn emission_factor(code: &str) -> f64 {
    FUEL_CODES.get(code).map_or(0.0, FuelType::emission_factor)
}

impl From<String> for FuelType {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<FuelType> for String {
    fn from(fuel: FuelType) -> Self {
        fuel.code().to_string()
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Absolute generation of one fuel type in one region and hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelGenerationRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub region: String,
    pub fuel_code: String,
    pub generation_mwh: f64,
}

/// A fuel's share of its region's total generation in one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelShareRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub region: String,
    pub fuel: FuelType,
    pub generation_mwh: f64,
    pub total_generation_mwh: f64,
    pub share: f64,
}
