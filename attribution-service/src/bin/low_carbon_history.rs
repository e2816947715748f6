use anyhow::{bail, Result};
use attribution_service::{
    attribution::{hour_label, mine_daily_starts},
    config::AppConfig,
    observability,
    sinks::{create_file, write_histogram_csv},
    sources::{column_timezone, intensity_column, load_bulk},
};
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: low_carbon_history <gridemissions_dir> <histogram.csv>");
    }
    let dir = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);

    let cfg = AppConfig::load()?;
    let column = intensity_column(&cfg.region.local_region);
    // An explicit zone wins; otherwise use the column's home zone, then UTC.
    let tz = match cfg.region.timezone {
        Some(_) => cfg.timezone()?,
        None => column_timezone(&column).unwrap_or(chrono_tz::Tz::UTC),
    };

    let history = tokio::task::spawn_blocking(move || load_bulk(&dir, "co2i")).await??;
    let series = history.series(&column);
    if series.is_empty() {
        bail!("no '{column}' values in bulk history");
    }

    let pattern = mine_daily_starts(&series, cfg.window.hours, tz);
    write_histogram_csv(create_file(&output)?, &pattern.histogram)?;

    tracing::info!(
        column = %column,
        timezone = %tz,
        points = series.len(),
        days = pattern.days.len(),
        window_hours = cfg.window.hours,
        mode_hour = ?pattern.mode_hour,
        mode_label = %pattern.mode_hour.map(hour_label).unwrap_or_else(|| "none".to_string()),
        output = %output.display(),
        "daily low-carbon start pattern mined"
    );

    Ok(())
}
