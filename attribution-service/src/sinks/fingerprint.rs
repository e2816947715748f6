use grid_client::domain::{CarbonIntensityRecord, NetFootprintRecord};
use time::OffsetDateTime;

use crate::attribution::FootprintReport;

fn hash_ts(hasher: &mut blake3::Hasher, ts: OffsetDateTime) {
    hasher.update(&ts.unix_timestamp_nanos().to_le_bytes());
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    let len = s.len() as u32;
    hasher.update(&len.to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_f64(hasher: &mut blake3::Hasher, v: f64) {
    hasher.update(&v.to_bits().to_le_bytes());
}

fn hash_opt_f64(hasher: &mut blake3::Hasher, v: Option<f64>) {
    match v {
        Some(x) => {
            hasher.update(&[1]);
            hash_f64(hasher, x);
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

/// Feeds a row's exact bit pattern into a table digest.
pub trait TableHash {
    fn hash_into(&self, hasher: &mut blake3::Hasher);
}

impl TableHash for CarbonIntensityRecord {
    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hash_ts(hasher, self.ts);
        hash_f64(hasher, self.intensity_g_per_kwh);
    }
}

impl TableHash for NetFootprintRecord {
    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hash_ts(hasher, self.ts);
        hash_f64(hasher, self.usage_kwh);
        hash_opt_f64(hasher, self.intensity_g_per_kwh);
        hash_opt_f64(hasher, self.net_gco2);
    }
}

fn hash_table<T: TableHash>(hasher: &mut blake3::Hasher, name: &str, rows: &[T]) {
    hash_str(hasher, name);
    hasher.update(&(rows.len() as u64).to_le_bytes());
    for row in rows {
        row.hash_into(hasher);
    }
}

/// Digest of the output tables; two runs over identical inputs produce the same value.
pub fn fingerprint(report: &FootprintReport) -> String {
    let mut h = blake3::Hasher::new();
    hash_table(&mut h, "intensity", &report.intensity);
    hash_table(&mut h, "footprint", &report.footprint);
    h.finalize().to_hex().to_string()
}
