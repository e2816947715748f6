use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use grid_client::domain::{CarbonIntensityRecord, IntensityPoint, NetFootprintRecord};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    attribution::{
        find_low_carbon_window, hour_label, mine_daily_starts, predict_upcoming_window, run_pipeline,
        window::DailyStart, AttributionInputs, HourHistogram, IntensitySummary, WindowOutcome,
    },
    config::{parse_timezone, AppConfig, MAX_WINDOW_HOURS},
    sinks::fingerprint,
    transform::{validate_table, HourlyRecord, ValidationError},
};

/// Request defaults resolved from configuration.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub local_region: String,
    pub window_hours: usize,
    pub forecast_horizon: usize,
    pub timezone: Tz,
    pub max_body_bytes: usize,
}

impl ApiSettings {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            local_region: cfg.region.local_region.clone(),
            window_hours: cfg.window.hours,
            forecast_horizon: cfg.window.forecast_horizon,
            timezone: cfg.timezone()?,
            max_body_bytes: cfg.http.max_body_bytes,
        })
    }
}

#[derive(Clone)]
pub struct ApiState {
    settings: Arc<ApiSettings>,
}

impl ApiState {
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid {table} row {index}: {source}")]
    InvalidRow {
        table: &'static str,
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfBounds {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("local_region must not be empty")]
    MissingRegion,
    #[error("{0}")]
    UnknownTimezone(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        metrics::counter!("http_requests_rejected_total").increment(1);
        tracing::warn!(error = %self, "request rejected");
        let body = ErrorBody {
            error: self.to_string(),
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

fn check_table<T: HourlyRecord>(rows: &[T]) -> Result<(), ApiError> {
    validate_table(rows).map_err(|(index, source)| ApiError::InvalidRow {
        table: T::TABLE,
        index,
        source,
    })
}

fn check_hours(name: &'static str, value: Option<usize>, default: usize) -> Result<usize, ApiError> {
    let hours = value.unwrap_or(default);
    if hours == 0 || hours > MAX_WINDOW_HOURS {
        return Err(ApiError::OutOfBounds {
            name,
            value: i64::try_from(hours).unwrap_or(i64::MAX),
            min: 1,
            max: MAX_WINDOW_HOURS as i64,
        });
    }
    Ok(hours)
}

fn check_timezone(value: Option<&str>, default: Tz) -> Result<Tz, ApiError> {
    value.map_or(Ok(default), |name| parse_timezone(name).map_err(ApiError::UnknownTimezone))
}

#[derive(Debug, Deserialize)]
pub struct FootprintRequest {
    #[serde(default)]
    pub local_region: Option<String>,
    #[serde(flatten)]
    pub inputs: AttributionInputs,
}

#[derive(Debug, Serialize)]
pub struct FootprintResponse {
    pub local_region: String,
    pub intensity: Vec<CarbonIntensityRecord>,
    pub footprint: Vec<NetFootprintRecord>,
    pub summary: IntensitySummary,
    pub fingerprint: String,
}

pub async fn footprint(
    State(state): State<ApiState>,
    Json(req): Json<FootprintRequest>,
) -> Result<Json<FootprintResponse>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "footprint").increment(1);

    let local_region = req
        .local_region
        .unwrap_or_else(|| state.settings.local_region.clone());
    if local_region.trim().is_empty() {
        return Err(ApiError::MissingRegion);
    }

    let inputs = &req.inputs;
    check_table(&inputs.region_series)?;
    check_table(&inputs.interchange)?;
    check_table(&inputs.fuel_mix)?;
    check_table(&inputs.usage)?;

    let report = run_pipeline(&local_region, inputs);
    let fingerprint = fingerprint(&report);
    let points: Vec<IntensityPoint> = report.intensity.iter().map(IntensityPoint::from).collect();

    Ok(Json(FootprintResponse {
        summary: IntensitySummary::from_series(&points),
        local_region,
        intensity: report.intensity,
        footprint: report.footprint,
        fingerprint,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub series: Vec<IntensityPoint>,
    #[serde(default)]
    pub window_hours: Option<usize>,
    #[serde(default)]
    pub horizon: Option<usize>,
}

pub async fn forecast_window(
    State(state): State<ApiState>,
    Json(req): Json<ForecastRequest>,
) -> Result<Json<WindowOutcome>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "forecast").increment(1);

    let window = check_hours("window_hours", req.window_hours, state.settings.window_hours)?;
    let horizon = check_hours("horizon", req.horizon, state.settings.forecast_horizon)?;
    check_table(&req.series)?;

    Ok(Json(predict_upcoming_window(&req.series, horizon, window)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryWindowRequest {
    pub series: Vec<IntensityPoint>,
    #[serde(default)]
    pub window_hours: Option<usize>,
}

/// Lowest window anywhere in a historical series.
pub async fn history_window(
    State(state): State<ApiState>,
    Json(req): Json<HistoryWindowRequest>,
) -> Result<Json<WindowOutcome>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "history").increment(1);

    let window = check_hours("window_hours", req.window_hours, state.settings.window_hours)?;
    check_table(&req.series)?;

    Ok(Json(find_low_carbon_window(&req.series, window)))
}

#[derive(Debug, Deserialize)]
pub struct DailyRequest {
    pub series: Vec<IntensityPoint>,
    #[serde(default)]
    pub window_hours: Option<usize>,
    /// IANA zone name; the configured zone when absent.
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyResponse {
    pub days: Vec<DailyStart>,
    pub histogram: HourHistogram,
    pub mode_hour: Option<u8>,
    pub mode_label: Option<String>,
}

pub async fn daily_windows(
    State(state): State<ApiState>,
    Json(req): Json<DailyRequest>,
) -> Result<Json<DailyResponse>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "daily").increment(1);

    let window = check_hours("window_hours", req.window_hours, state.settings.window_hours)?;
    let tz = check_timezone(req.timezone.as_deref(), state.settings.timezone)?;
    check_table(&req.series)?;

    let pattern = mine_daily_starts(&req.series, window, tz);
    Ok(Json(DailyResponse {
        mode_label: pattern.mode_hour.map(hour_label),
        mode_hour: pattern.mode_hour,
        days: pattern.days,
        histogram: pattern.histogram,
    }))
}

async fn healthz() -> &'static str {
    "ok"
}

pub fn router(state: ApiState) -> Router {
    let body_limit = state.settings.max_body_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/footprint", post(footprint))
        .route("/v1/windows/forecast", post(forecast_window))
        .route("/v1/windows/history", post(history_window))
        .route("/v1/windows/daily", post(daily_windows))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serves the API until the listener fails.
pub async fn serve(bind_addr: &str, state: ApiState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "attribution API listening");
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}
