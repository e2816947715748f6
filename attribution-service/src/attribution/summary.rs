use grid_client::domain::IntensityPoint;
use serde::Serialize;
use time::OffsetDateTime;

/// Latest intensity compared to the series average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntensitySummary {
    #[serde(with = "time::serde::rfc3339::option")]
    pub latest_ts: Option<OffsetDateTime>,
    pub latest: Option<f64>,
    pub mean: Option<f64>,
    /// Percent change of `latest` relative to `mean`.
    pub delta_pct: Option<f64>,
}

impl IntensitySummary {
    pub fn from_series(series: &[IntensityPoint]) -> Self {
        let defined: Vec<(OffsetDateTime, f64)> =
            series.iter().filter_map(|p| p.value.map(|v| (p.ts, v))).collect();

        let latest = defined.iter().copied().max_by_key(|(ts, _)| *ts);
        let mean = (!defined.is_empty())
            .then(|| defined.iter().map(|(_, v)| v).sum::<f64>() / defined.len() as f64);
        let delta_pct = match (latest, mean) {
            (Some((_, l)), Some(m)) if m != 0.0 => Some((l - m) / m * 100.0),
            _ => None,
        };

        Self {
            latest_ts: latest.map(|(ts, _)| ts),
            latest: latest.map(|(_, v)| v),
            mean,
            delta_pct,
        }
    }
}
