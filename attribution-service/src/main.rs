use anyhow::Result;
use attribution_service::{
    config::AppConfig,
    http_api::{self, ApiSettings, ApiState},
    metrics_server, observability,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let settings = ApiSettings::from_config(&cfg)?;
    tracing::info!(
        region = %settings.local_region,
        window_hours = settings.window_hours,
        forecast_horizon = settings.forecast_horizon,
        "starting attribution API"
    );

    http_api::serve(&cfg.http.bind_addr, ApiState::new(settings)).await
}
