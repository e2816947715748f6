use std::collections::BTreeMap;

use grid_client::domain::{FuelGenerationRecord, FuelShareRecord, FuelType};
use time::OffsetDateTime;

/// Converts absolute per-fuel generation into each fuel's share of its
/// region's total for that hour.
///
/// A (hour, region) whose total generation is not positive cannot be
/// attributed at all, so every row of that group is dropped.
pub fn normalize_fuel_mix(generation: &[FuelGenerationRecord]) -> Vec<FuelShareRecord> {
    let mut totals: BTreeMap<(OffsetDateTime, &str), f64> = BTreeMap::new();
    for r in generation {
        *totals.entry((r.ts, r.region.as_str())).or_insert(0.0) += r.generation_mwh;
    }

    for ((ts, region), total) in totals.iter().filter(|(_, total)| !(**total > 0.0)) {
        metrics::counter!("fuel_mix_groups_dropped_total").increment(1);
        tracing::debug!(
            ts = %ts,
            region = *region,
            total_generation_mwh = *total,
            "non-positive total generation; fuel mix dropped"
        );
    }

    let mut shares: Vec<FuelShareRecord> = generation
        .iter()
        .filter_map(|r| {
            let total = totals.get(&(r.ts, r.region.as_str())).copied().unwrap_or(0.0);
            (total > 0.0).then(|| FuelShareRecord {
                ts: r.ts,
                region: r.region.clone(),
                fuel: FuelType::from_code(&r.fuel_code),
                generation_mwh: r.generation_mwh,
                total_generation_mwh: total,
                share: r.generation_mwh / total,
            })
        })
        .collect();

    // Stable: fuels keep their input order within a group.
    shares.sort_by(|a, b| (a.ts, &a.region).cmp(&(b.ts, &b.region)));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn gen(ts: OffsetDateTime, region: &str, fuel: &str, mwh: f64) -> FuelGenerationRecord {
        FuelGenerationRecord {
            ts,
            region: region.to_string(),
            fuel_code: fuel.to_string(),
            generation_mwh: mwh,
        }
    }

    #[test]
    fn shares_sum_to_one_per_region_and_hour() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let t1 = datetime!(2024-01-01 01:00 UTC);
        let input = vec![
            gen(t0, "ISNE", "NG", 300.0),
            gen(t0, "ISNE", "NUC", 600.0),
            gen(t0, "ISNE", "WND", 100.0),
            gen(t0, "NYIS", "WAT", 1.0),
            gen(t1, "ISNE", "NG", 0.1),
            gen(t1, "ISNE", "SUN", 0.2),
            gen(t1, "ISNE", "COL", 0.3),
        ];

        let shares = normalize_fuel_mix(&input);
        assert_eq!(shares.len(), input.len());

        let mut sums: BTreeMap<(OffsetDateTime, String), f64> = BTreeMap::new();
        for s in &shares {
            assert!((0.0..=1.0).contains(&s.share));
            *sums.entry((s.ts, s.region.clone())).or_insert(0.0) += s.share;
        }
        for sum in sums.values() {
            assert!((sum - 1.0).abs() < 1e-12, "{sum}");
        }

        assert_eq!(shares[0].fuel, FuelType::NaturalGas);
        assert_eq!(shares[0].total_generation_mwh, 1000.0);
        assert_eq!(shares[0].share, 0.3);
    }

    #[test]
    fn non_positive_totals_drop_the_whole_group() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let input = vec![
            gen(t0, "ISNE", "NG", 0.0),
            gen(t0, "ISNE", "SUN", 0.0),
            gen(t0, "BPAT", "WAT", 10.0),
            gen(t0, "BPAT", "OTH", -15.0),
            gen(t0, "WACM", "COL", 5.0),
        ];

        let shares = normalize_fuel_mix(&input);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].region, "WACM");
        assert_eq!(shares[0].share, 1.0);
    }

    #[test]
    fn output_is_grouped_by_hour_then_region() {
        let t0 = datetime!(2024-01-01 00:00 UTC);
        let t1 = datetime!(2024-01-01 01:00 UTC);
        let input = vec![
            gen(t1, "ISNE", "NG", 1.0),
            gen(t0, "NYIS", "NG", 1.0),
            gen(t0, "ISNE", "WND", 1.0),
            gen(t0, "ISNE", "NG", 1.0),
        ];
        let order: Vec<_> = normalize_fuel_mix(&input)
            .into_iter()
            .map(|s| (s.ts, s.region, s.fuel.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                (t0, "ISNE".to_string(), "WIND".to_string()),
                (t0, "ISNE".to_string(), "NATURAL_GAS".to_string()),
                (t0, "NYIS".to_string(), "NATURAL_GAS".to_string()),
                (t1, "ISNE".to_string(), "NATURAL_GAS".to_string()),
            ]
        );
    }
}
