use anyhow::{bail, Result};
use attribution_service::{
    attribution::{run_pipeline, AttributionInputs, IntensitySummary},
    config::AppConfig,
    observability,
    pipeline::load_table,
    sinks::{create_file, fingerprint, write_footprint_csv},
    sources::CsvTableSource,
};
use grid_client::domain::{
    FuelGenerationRecord, IntensityPoint, InterchangeRecord, PersonalUsageRecord, RegionSeriesRecord,
};
use std::{env, path::Path};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 6 {
        bail!(
            "usage: footprint_report <region_series.csv> <interchange.csv> <fuel_mix.csv> <usage.csv> <output.csv>"
        );
    }

    // Load configuration (ATTRIBUTION_CONFIG may point at a batch-specific file).
    let cfg = AppConfig::load()?;
    let region = &cfg.region.local_region;

    let region_series = load_table(&CsvTableSource::<RegionSeriesRecord>::new(&args[1])).await?;
    let interchange = load_table(&CsvTableSource::<InterchangeRecord>::new(&args[2])).await?;
    let fuel_mix = load_table(&CsvTableSource::<FuelGenerationRecord>::new(&args[3])).await?;
    let usage = load_table(&CsvTableSource::<PersonalUsageRecord>::new(&args[4])).await?;

    let rejected = region_series.rejected + interchange.rejected + fuel_mix.rejected + usage.rejected;
    let inputs = AttributionInputs {
        region_series: region_series.rows,
        interchange: interchange.rows,
        fuel_mix: fuel_mix.rows,
        usage: usage.rows,
    };

    let report = run_pipeline(region, &inputs);
    let output = Path::new(&args[5]);
    write_footprint_csv(create_file(output)?, &report.footprint)?;

    let points: Vec<IntensityPoint> = report.intensity.iter().map(IntensityPoint::from).collect();
    let summary = IntensitySummary::from_series(&points);
    let undefined = report.footprint.iter().filter(|r| r.net_gco2.is_none()).count();

    tracing::info!(
        region = %region,
        rows = report.footprint.len(),
        undefined_hours = undefined,
        rejected_input_rows = rejected,
        latest_intensity = ?summary.latest,
        mean_intensity = ?summary.mean,
        delta_pct = ?summary.delta_pct,
        fingerprint = %fingerprint(&report),
        output = %output.display(),
        "footprint report written"
    );

    Ok(())
}
