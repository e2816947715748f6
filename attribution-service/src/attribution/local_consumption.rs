use std::collections::BTreeMap;

use grid_client::domain::{ConsumptionBySource, RegionSeriesKind, RegionSeriesRecord};
use time::OffsetDateTime;

#[derive(Debug, Default, Clone, Copy)]
struct HourTotals {
    demand: Option<f64>,
    net_generation: Option<f64>,
}

fn accumulate(slot: &mut Option<f64>, value: f64) {
    *slot = Some(slot.unwrap_or(0.0) + value);
}

/// Energy generated in a region and consumed there in the same hour.
///
/// Local consumption of local generation cannot exceed either what was
/// demanded or what was net-generated. `None` when either side is missing.
pub fn generated_and_consumed_locally(demand_mwh: Option<f64>, net_generation_mwh: Option<f64>) -> Option<f64> {
    match (demand_mwh, net_generation_mwh) {
        (Some(d), Some(g)) => Some(d.min(g).max(0.0)),
        _ => None,
    }
}

/// One row per hour at which `local_region` reported anything, attributed to
/// the local region itself. Hours missing demand or net generation yield 0.
pub fn resolve_local_consumption(local_region: &str, series: &[RegionSeriesRecord]) -> Vec<ConsumptionBySource> {
    let mut hours: BTreeMap<OffsetDateTime, HourTotals> = BTreeMap::new();

    for r in series.iter().filter(|r| r.region == local_region) {
        let totals = hours.entry(r.ts).or_default();
        match r.kind {
            RegionSeriesKind::Demand => accumulate(&mut totals.demand, r.value_mwh),
            RegionSeriesKind::NetGeneration => accumulate(&mut totals.net_generation, r.value_mwh),
            RegionSeriesKind::TotalInterchange => {}
        }
    }

    hours
        .into_iter()
        .map(|(ts, totals)| {
            let consumed_mwh = generated_and_consumed_locally(totals.demand, totals.net_generation)
                .unwrap_or_else(|| {
                    metrics::counter!("local_consumption_missing_total").increment(1);
                    tracing::warn!(
                        ts = %ts,
                        region = local_region,
                        demand_present = totals.demand.is_some(),
                        net_generation_present = totals.net_generation.is_some(),
                        "demand or net generation missing; local consumption set to 0"
                    );
                    0.0
                });
            ConsumptionBySource {
                ts,
                source_region: local_region.to_string(),
                consumed_mwh,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn rec(ts: OffsetDateTime, region: &str, kind: RegionSeriesKind, value_mwh: f64) -> RegionSeriesRecord {
        RegionSeriesRecord {
            ts,
            region: region.to_string(),
            kind,
            value_mwh,
        }
    }

    #[test]
    fn minimum_of_demand_and_generation() {
        assert_eq!(generated_and_consumed_locally(Some(100.0), Some(80.0)), Some(80.0));
        assert_eq!(generated_and_consumed_locally(Some(60.0), Some(80.0)), Some(60.0));
        assert_eq!(generated_and_consumed_locally(None, Some(80.0)), None);
        assert_eq!(generated_and_consumed_locally(Some(100.0), None), None);
    }

    #[test]
    fn negative_generation_floors_at_zero() {
        assert_eq!(generated_and_consumed_locally(Some(100.0), Some(-5.0)), Some(0.0));
    }

    #[test]
    fn resolves_each_hour_and_zeroes_incomplete_ones() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let t1 = datetime!(2024-01-01 01:00 UTC);
        let t2 = datetime!(2024-01-01 02:00 UTC);
        let series = vec![
            rec(t0, "ISNE", RegionSeriesKind::Demand, 100.0),
            rec(t0, "ISNE", RegionSeriesKind::NetGeneration, 80.0),
            rec(t0, "ISNE", RegionSeriesKind::TotalInterchange, -20.0),
            rec(t1, "ISNE", RegionSeriesKind::NetGeneration, 80.0),
            rec(t2, "ISNE", RegionSeriesKind::TotalInterchange, 5.0),
            rec(t1, "NYIS", RegionSeriesKind::Demand, 500.0),
        ];

        let out = resolve_local_consumption("ISNE", &series);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].ts, t0);
        assert_eq!(out[0].consumed_mwh, 80.0);
        assert_eq!(out[1].consumed_mwh, 0.0);
        assert_eq!(out[2].consumed_mwh, 0.0);
        assert!(out.iter().all(|r| r.source_region == "ISNE"));
    }

    #[test]
    fn other_regions_do_not_leak_in() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let series = vec![rec(t0, "NYIS", RegionSeriesKind::Demand, 1.0)];
        assert!(resolve_local_consumption("ISNE", &series).is_empty());
    }
}
