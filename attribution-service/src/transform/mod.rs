use std::collections::HashSet;

use grid_client::domain::{
    FuelGenerationRecord, IntensityPoint, InterchangeRecord, PersonalUsageRecord, RegionSeriesRecord,
};
use time::{macros::datetime, OffsetDateTime, UtcOffset};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("timestamp {0} is not aligned to the hour")]
    NotHourAligned(OffsetDateTime),
    #[error("timestamp {0} out of allowed range")]
    OutOfRange(OffsetDateTime),
    #[error("{0} must be finite")]
    NotFinite(&'static str),
    #[error("{0} must be non-negative")]
    Negative(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("duplicate record for '{key}' at {ts}")]
    Duplicate { key: String, ts: OffsetDateTime },
}

/// A record of one of the hourly input tables.
pub trait HourlyRecord {
    /// Table name used in logs and metric labels.
    const TABLE: &'static str;

    fn ts(&self) -> OffsetDateTime;

    /// Identifies the series the record belongs to; (key, ts) must be unique.
    fn series_key(&self) -> String;

    /// Rules specific to the record type, on top of the timestamp checks.
    fn validate_fields(&self) -> Result<(), ValidationError>;
}

/// Timestamp rules shared by every table:
/// - aligned to the hour, in UTC;
/// - within a broad sanity window [2000-01-01, 2100-01-01).
pub fn validate_timestamp(ts: OffsetDateTime) -> Result<(), ValidationError> {
    let min_ts = datetime!(2000-01-01 00:00:00 UTC);
    let max_ts = datetime!(2100-01-01 00:00:00 UTC);

    if ts < min_ts || ts >= max_ts {
        return Err(ValidationError::OutOfRange(ts));
    }
    let utc = ts.to_offset(UtcOffset::UTC);
    if utc.minute() != 0 || utc.second() != 0 || utc.nanosecond() != 0 {
        return Err(ValidationError::NotHourAligned(ts));
    }
    Ok(())
}

fn finite(field: &'static str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite(field))
    }
}

fn non_empty(field: &'static str, s: &str) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

pub fn validate_record<T: HourlyRecord>(record: &T) -> Result<(), ValidationError> {
    validate_timestamp(record.ts())?;
    record.validate_fields()
}

impl HourlyRecord for RegionSeriesRecord {
    const TABLE: &'static str = "region_series";

    fn ts(&self) -> OffsetDateTime {
        self.ts
    }

    fn series_key(&self) -> String {
        format!("{}/{}", self.region, self.kind)
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        non_empty("region", &self.region)?;
        finite("value_mwh", self.value_mwh)
    }
}

impl HourlyRecord for InterchangeRecord {
    const TABLE: &'static str = "interchange";

    fn ts(&self) -> OffsetDateTime {
        self.ts
    }

    fn series_key(&self) -> String {
        format!("{}->{}", self.from_region, self.to_region)
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        non_empty("from_region", &self.from_region)?;
        non_empty("to_region", &self.to_region)?;
        finite("value_mwh", self.value_mwh)
    }
}

impl HourlyRecord for FuelGenerationRecord {
    const TABLE: &'static str = "fuel_mix";

    fn ts(&self) -> OffsetDateTime {
        self.ts
    }

    fn series_key(&self) -> String {
        format!("{}/{}", self.region, self.fuel_code)
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        non_empty("region", &self.region)?;
        non_empty("fuel_code", &self.fuel_code)?;
        finite("generation_mwh", self.generation_mwh)
    }
}

impl HourlyRecord for PersonalUsageRecord {
    const TABLE: &'static str = "usage";

    fn ts(&self) -> OffsetDateTime {
        self.ts
    }

    fn series_key(&self) -> String {
        Self::TABLE.to_string()
    }

    /// Usage must be a finite, non-negative kWh reading.
    fn validate_fields(&self) -> Result<(), ValidationError> {
        finite("usage_kwh", self.usage_kwh)?;
        if self.usage_kwh < 0.0 {
            return Err(ValidationError::Negative("usage_kwh"));
        }
        Ok(())
    }
}

impl HourlyRecord for IntensityPoint {
    const TABLE: &'static str = "intensity";

    fn ts(&self) -> OffsetDateTime {
        self.ts
    }

    fn series_key(&self) -> String {
        Self::TABLE.to_string()
    }

    /// Absent values are allowed; present ones must be finite.
    fn validate_fields(&self) -> Result<(), ValidationError> {
        match self.value {
            Some(v) => finite("value", v),
            None => Ok(()),
        }
    }
}

/// Checks a whole table; returns the index and cause of the first bad row.
pub fn validate_table<T: HourlyRecord>(rows: &[T]) -> Result<(), (usize, ValidationError)> {
    let mut seen = HashSet::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        validate_record(row).map_err(|e| (i, e))?;
        let key = row.series_key();
        if !seen.insert((key.clone(), row.ts())) {
            return Err((i, ValidationError::Duplicate { key, ts: row.ts() }));
        }
    }
    Ok(())
}

/// Keeps valid rows, first occurrence wins on duplicates. Returns the kept
/// rows and how many were rejected.
pub fn retain_valid<T: HourlyRecord>(rows: Vec<T>) -> (Vec<T>, usize) {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut rejected = 0usize;

    let kept = rows
        .into_iter()
        .filter(|row| {
            let result = validate_record(row).and_then(|()| {
                let key = row.series_key();
                if seen.insert((key.clone(), row.ts())) {
                    Ok(())
                } else {
                    Err(ValidationError::Duplicate { key, ts: row.ts() })
                }
            });
            match result {
                Ok(()) => true,
                Err(e) => {
                    rejected += 1;
                    metrics::counter!("input_rows_rejected_total", "table" => T::TABLE).increment(1);
                    tracing::warn!(table = T::TABLE, error = %e, "input row rejected");
                    false
                }
            }
        })
        .collect();

    (kept, rejected)
}
