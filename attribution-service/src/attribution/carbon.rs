use std::collections::{BTreeMap, HashMap};

use grid_client::domain::{
    CarbonIntensityRecord, ConsumptionBySource, FuelShareRecord, FuelType, NetFootprintRecord, PersonalUsageRecord,
};
use time::OffsetDateTime;

/// Grams CO2 per kWh consumed locally that one (source region, fuel) slice contributes.
///
/// `local_fraction` is the share of the source region's total generation
/// that ended up consumed in the local region.
pub fn contribution(fuel: &FuelType, share: f64, consumed_mwh: f64, total_generation_mwh: f64) -> f64 {
    let local_fraction = consumed_mwh / total_generation_mwh;
    fuel.emission_factor() * share * local_fraction
}

/// Inner-joins fuel shares with consumption on (hour, source region) and sums
/// every joined row's contribution per hour.
///
/// Hours without any joined row are absent from the result.
pub fn attribute_intensity(
    shares: &[FuelShareRecord],
    consumption: &[ConsumptionBySource],
) -> Vec<CarbonIntensityRecord> {
    let mut consumed: HashMap<(OffsetDateTime, &str), f64> = HashMap::with_capacity(consumption.len());
    for c in consumption {
        *consumed.entry((c.ts, c.source_region.as_str())).or_insert(0.0) += c.consumed_mwh;
    }

    let mut intensity: BTreeMap<OffsetDateTime, f64> = BTreeMap::new();
    for s in shares {
        let Some(&consumed_mwh) = consumed.get(&(s.ts, s.region.as_str())) else {
            continue;
        };
        if !s.fuel.is_recognized() {
            // Zero factor; counted so undercounting shows up in metrics.
            metrics::counter!("unrecognized_fuel_code_total").increment(1);
        }
        *intensity.entry(s.ts).or_insert(0.0) +=
            contribution(&s.fuel, s.share, consumed_mwh, s.total_generation_mwh);
    }

    intensity
        .into_iter()
        .map(|(ts, intensity_g_per_kwh)| CarbonIntensityRecord {
            ts,
            intensity_g_per_kwh,
        })
        .collect()
}

/// Left-joins usage with intensity: one row per usage hour, ascending.
///
/// `net_gco2 = intensity * usage_kwh / 1000`; `None` where the hour has no
/// attributed intensity.
pub fn net_footprint(intensity: &[CarbonIntensityRecord], usage: &[PersonalUsageRecord]) -> Vec<NetFootprintRecord> {
    let by_hour: HashMap<OffsetDateTime, f64> = intensity.iter().map(|r| (r.ts, r.intensity_g_per_kwh)).collect();

    let mut rows: Vec<NetFootprintRecord> = usage
        .iter()
        .map(|u| {
            let intensity_g_per_kwh = by_hour.get(&u.ts).copied();
            NetFootprintRecord {
                ts: u.ts,
                usage_kwh: u.usage_kwh,
                intensity_g_per_kwh,
                net_gco2: intensity_g_per_kwh.map(|i| i * u.usage_kwh / 1000.0),
            }
        })
        .collect();
    rows.sort_by_key(|r| r.ts);

    let missing = rows.iter().filter(|r| r.net_gco2.is_none()).count();
    if missing > 0 {
        tracing::info!(missing_hours = missing, total_hours = rows.len(), "usage hours without attributed intensity");
    }
    rows
}
