use anyhow::{anyhow, bail, Context};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;

use crate::attribution::window::{DEFAULT_FORECAST_HORIZON, DEFAULT_WINDOW_HOURS};

/// Longest window or horizon accepted anywhere, one year of hours.
pub const MAX_WINDOW_HOURS: usize = 8760;

#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    /// Balancing authority code, e.g. `ISNE`.
    pub local_region: String,
    /// IANA zone used to partition days when mining daily windows, e.g.
    /// `America/New_York`. UTC when unset.
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_window_hours() -> usize {
    DEFAULT_WINDOW_HOURS
}

fn default_forecast_horizon() -> usize {
    DEFAULT_FORECAST_HORIZON
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_hours")]
    pub hours: usize,
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            hours: DEFAULT_WINDOW_HOURS,
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
        }
    }
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub region: RegionConfig,
    #[serde(default)]
    pub window: WindowConfig,
    pub http: HttpConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("ATTRIBUTION_CONFIG").unwrap_or_else(|_| "attribution-config.toml".to_string());
        let contents = fs::read_to_string(&path).with_context(|| format!("failed to read config {path}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.region.local_region.trim().is_empty() {
            bail!("region.local_region must not be empty");
        }
        self.timezone()?;
        if self.window.hours == 0 || self.window.hours > MAX_WINDOW_HOURS {
            bail!("window.hours must be within 1..={MAX_WINDOW_HOURS}");
        }
        if self.window.forecast_horizon < self.window.hours || self.window.forecast_horizon > MAX_WINDOW_HOURS {
            bail!("window.forecast_horizon must be at least window.hours and at most {MAX_WINDOW_HOURS}");
        }
        if self.http.max_body_bytes == 0 {
            bail!("http.max_body_bytes must be positive");
        }
        Ok(())
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        match &self.region.timezone {
            Some(name) => parse_timezone(name).map_err(|e| anyhow!("region.timezone: {e}")),
            None => Ok(Tz::UTC),
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| format!("unknown time zone '{name}': {e}"))
}
