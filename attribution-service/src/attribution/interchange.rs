use std::collections::{BTreeMap, BTreeSet};

use grid_client::domain::{ConsumptionBySource, InterchangeRecord};
use time::OffsetDateTime;

/// Only inbound net flow counts as imported consumption; a net exporter
/// contributes nothing for that hour.
pub fn imported_consumption(net_inflow_mwh: f64) -> f64 {
    net_inflow_mwh.max(0.0)
}

/// Net energy imported into `local_region` per (hour, source region).
pub fn attribute_imports(local_region: &str, interchange: &[InterchangeRecord]) -> Vec<ConsumptionBySource> {
    let mut net: BTreeMap<(OffsetDateTime, &str), f64> = BTreeMap::new();

    for r in interchange.iter().filter(|r| r.to_region == local_region) {
        if r.from_region == local_region {
            metrics::counter!("interchange_self_records_dropped_total").increment(1);
            tracing::warn!(ts = %r.ts, region = local_region, "interchange record from a region to itself dropped");
            continue;
        }
        *net.entry((r.ts, r.from_region.as_str())).or_insert(0.0) += r.value_mwh;
    }

    net.into_iter()
        .map(|((ts, source), inflow)| {
            if inflow < 0.0 {
                metrics::counter!("interchange_net_export_clipped_total").increment(1);
            }
            ConsumptionBySource {
                ts,
                source_region: source.to_string(),
                consumed_mwh: imported_consumption(inflow),
            }
        })
        .collect()
}

/// Consumption of the local region broken down by the region that generated it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumptionTable {
    rows: Vec<ConsumptionBySource>,
}

impl ConsumptionTable {
    /// Concatenates local and imported consumption, ordered by (hour, source region).
    pub fn unify(local: Vec<ConsumptionBySource>, imports: Vec<ConsumptionBySource>) -> Self {
        let mut rows = imports;
        rows.extend(local);
        rows.sort_by(|a, b| (a.ts, &a.source_region).cmp(&(b.ts, &b.source_region)));
        Self { rows }
    }

    pub fn rows(&self) -> &[ConsumptionBySource] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ConsumptionBySource> {
        self.rows
    }

    /// Every region whose fuel mix is needed: the local region plus each importer.
    pub fn source_regions(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.source_region.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn flow(ts: OffsetDateTime, from: &str, to: &str, value_mwh: f64) -> InterchangeRecord {
        InterchangeRecord {
            ts,
            from_region: from.to_string(),
            to_region: to.to_string(),
            value_mwh,
        }
    }

    #[test]
    fn net_inflow_is_clipped_at_zero() {
        assert_eq!(imported_consumption(-50.0), 0.0);
        assert_eq!(imported_consumption(30.0), 30.0);
    }

    #[test]
    fn sums_per_source_and_hour_before_clipping() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let t1 = datetime!(2024-01-01 01:00 UTC);
        let records = vec![
            flow(t0, "NYIS", "ISNE", 40.0),
            flow(t0, "NYIS", "ISNE", -10.0),
            flow(t0, "HQT", "ISNE", -50.0),
            flow(t1, "NYIS", "ISNE", 5.0),
            flow(t1, "NYIS", "PJM", 500.0),
        ];

        let out = attribute_imports("ISNE", &records);
        assert_eq!(out.len(), 3);
        assert_eq!((out[0].source_region.as_str(), out[0].consumed_mwh), ("HQT", 0.0));
        assert_eq!((out[1].source_region.as_str(), out[1].consumed_mwh), ("NYIS", 30.0));
        assert_eq!(out[2].ts, t1);
        assert_eq!(out[2].consumed_mwh, 5.0);
    }

    #[test]
    fn self_interchange_is_dropped() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let out = attribute_imports("ISNE", &[flow(t0, "ISNE", "ISNE", 10.0)]);
        assert!(out.is_empty());
    }

    #[test]
    fn unified_table_orders_rows_and_lists_sources() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let t1 = datetime!(2024-01-01 01:00 UTC);
        let local = vec![
            ConsumptionBySource { ts: t0, source_region: "ISNE".to_string(), consumed_mwh: 80.0 },
            ConsumptionBySource { ts: t1, source_region: "ISNE".to_string(), consumed_mwh: 70.0 },
        ];
        let imports = vec![
            ConsumptionBySource { ts: t1, source_region: "HQT".to_string(), consumed_mwh: 1.0 },
            ConsumptionBySource { ts: t0, source_region: "NYIS".to_string(), consumed_mwh: 2.0 },
        ];

        let table = ConsumptionTable::unify(local, imports);
        let order: Vec<_> = table.rows().iter().map(|r| (r.ts, r.source_region.as_str())).collect();
        assert_eq!(order, vec![(t0, "ISNE"), (t0, "NYIS"), (t1, "HQT"), (t1, "ISNE")]);
        assert_eq!(table.source_regions().into_iter().collect::<Vec<_>>(), vec!["HQT", "ISNE", "NYIS"]);
        assert!(table.rows().iter().all(|r| r.consumed_mwh >= 0.0));
    }
}
