//! Carbon attribution engine.
//!
//! Every stage is a pure function over in-memory tables: it reads its inputs
//! and returns a new table. Degenerate data degrades the affected hour
//! instead of failing the computation.

pub mod carbon;
pub mod fuel_mix;
pub mod interchange;
pub mod local_consumption;
pub mod summary;
pub mod window;

use grid_client::domain::{
    CarbonIntensityRecord, ConsumptionBySource, FuelGenerationRecord, FuelShareRecord, InterchangeRecord,
    NetFootprintRecord, PersonalUsageRecord, RegionSeriesRecord,
};
use serde::{Deserialize, Serialize};

pub use carbon::{attribute_intensity, net_footprint};
pub use fuel_mix::normalize_fuel_mix;
pub use interchange::{attribute_imports, ConsumptionTable};
pub use local_consumption::resolve_local_consumption;
pub use summary::IntensitySummary;
pub use window::{
    find_low_carbon_window, hour_label, mine_daily_starts, predict_upcoming_window, DailyPattern, HourHistogram,
    LowCarbonWindow, WindowOutcome,
};

/// Already-fetched input tables for one local region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionInputs {
    pub region_series: Vec<RegionSeriesRecord>,
    pub interchange: Vec<InterchangeRecord>,
    pub fuel_mix: Vec<FuelGenerationRecord>,
    pub usage: Vec<PersonalUsageRecord>,
}

/// Every intermediate and final table of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootprintReport {
    pub consumption: Vec<ConsumptionBySource>,
    pub shares: Vec<FuelShareRecord>,
    pub intensity: Vec<CarbonIntensityRecord>,
    pub footprint: Vec<NetFootprintRecord>,
}

/// Runs local consumption → interchange → fuel mix → attribution → usage join.
pub fn run_pipeline(local_region: &str, inputs: &AttributionInputs) -> FootprintReport {
    let local = resolve_local_consumption(local_region, &inputs.region_series);
    let imports = attribute_imports(local_region, &inputs.interchange);
    let consumption = ConsumptionTable::unify(local, imports);

    let shares = normalize_fuel_mix(&inputs.fuel_mix);
    let intensity = attribute_intensity(&shares, consumption.rows());
    let footprint = net_footprint(&intensity, &inputs.usage);

    tracing::info!(
        region = local_region,
        source_regions = consumption.source_regions().len(),
        intensity_hours = intensity.len(),
        usage_hours = footprint.len(),
        "carbon attribution complete"
    );

    FootprintReport {
        consumption: consumption.into_rows(),
        shares,
        intensity,
        footprint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_client::domain::RegionSeriesKind;
    use time::{macros::datetime, OffsetDateTime};

    fn series(ts: OffsetDateTime, kind: RegionSeriesKind, value_mwh: f64) -> RegionSeriesRecord {
        RegionSeriesRecord {
            ts,
            region: "ISNE".to_string(),
            kind,
            value_mwh,
        }
    }

    fn fuel(ts: OffsetDateTime, region: &str, code: &str, mwh: f64) -> FuelGenerationRecord {
        FuelGenerationRecord {
            ts,
            region: region.to_string(),
            fuel_code: code.to_string(),
            generation_mwh: mwh,
        }
    }

    fn sample_inputs() -> AttributionInputs {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let t1 = datetime!(2024-01-01 01:00 UTC);
        let t2 = datetime!(2024-01-01 02:00 UTC);
        AttributionInputs {
            region_series: vec![
                series(t0, RegionSeriesKind::Demand, 1000.0),
                series(t0, RegionSeriesKind::NetGeneration, 900.0),
                series(t1, RegionSeriesKind::Demand, 1000.0),
                series(t1, RegionSeriesKind::NetGeneration, 1200.0),
            ],
            interchange: vec![
                InterchangeRecord {
                    ts: t0,
                    from_region: "NYIS".to_string(),
                    to_region: "ISNE".to_string(),
                    value_mwh: 100.0,
                },
                InterchangeRecord {
                    ts: t1,
                    from_region: "NYIS".to_string(),
                    to_region: "ISNE".to_string(),
                    value_mwh: -200.0,
                },
            ],
            fuel_mix: vec![
                fuel(t0, "ISNE", "NG", 450.0),
                fuel(t0, "ISNE", "NUC", 450.0),
                fuel(t0, "NYIS", "WAT", 400.0),
                fuel(t0, "NYIS", "NG", 100.0),
                fuel(t1, "ISNE", "NG", 1200.0),
                fuel(t1, "NYIS", "WAT", 400.0),
            ],
            usage: vec![
                PersonalUsageRecord { ts: t2, usage_kwh: 1.5 },
                PersonalUsageRecord { ts: t0, usage_kwh: 2.0 },
                PersonalUsageRecord { ts: t1, usage_kwh: 0.5 },
            ],
        }
    }

    #[test]
    fn end_to_end_attribution() {
        let report = run_pipeline("ISNE", &sample_inputs());

        // t0: ISNE keeps 900 of 900 generated, NYIS sends 100 of 500.
        // t1: ISNE consumes 1000 of 1200, NYIS is a net exporter.
        let expected_t0 = 469.0 * 0.5 * 1.0 + 16.0 * 0.5 * 1.0 + 4.0 * 0.8 * 0.2 + 469.0 * 0.2 * 0.2;
        let expected_t1 = 469.0 * 1.0 * (1000.0 / 1200.0);

        assert_eq!(report.intensity.len(), 2);
        assert!((report.intensity[0].intensity_g_per_kwh - expected_t0).abs() < 1e-9);
        assert!((report.intensity[1].intensity_g_per_kwh - expected_t1).abs() < 1e-9);

        assert_eq!(report.footprint.len(), 3);
        assert!((report.footprint[0].net_gco2.unwrap() - expected_t0 * 2.0 / 1000.0).abs() < 1e-12);
        assert!((report.footprint[1].net_gco2.unwrap() - expected_t1 * 0.5 / 1000.0).abs() < 1e-12);
        assert_eq!(report.footprint[2].net_gco2, None);

        assert!(report.consumption.iter().all(|c| c.consumed_mwh >= 0.0));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let inputs = sample_inputs();
        let first = run_pipeline("ISNE", &inputs);
        let second = run_pipeline("ISNE", &inputs);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn empty_inputs_produce_empty_tables() {
        let report = run_pipeline("ISNE", &AttributionInputs::default());
        assert!(report.consumption.is_empty());
        assert!(report.intensity.is_empty());
        assert!(report.footprint.is_empty());
    }
}
