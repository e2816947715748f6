use std::{fs::File, marker::PhantomData, path::PathBuf};

use csv::StringRecord;
use grid_client::domain::{
    FuelGenerationRecord, IntensityPoint, InterchangeRecord, PersonalUsageRecord, RegionSeriesKind,
    RegionSeriesRecord,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::pipeline::{PipelineError, RecordStream, Source};

/// Header-addressed view of one CSV record.
pub struct CsvRow<'a> {
    record: &'a StringRecord,
    headers: &'a StringRecord,
}

impl<'a> CsvRow<'a> {
    pub fn new(record: &'a StringRecord, headers: &'a StringRecord) -> Self {
        Self { record, headers }
    }

    pub fn text(&self, name: &str) -> Result<&'a str, PipelineError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| self.record.get(idx))
            .map(str::trim)
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    }

    pub fn ts(&self, name: &str) -> Result<OffsetDateTime, PipelineError> {
        let raw = self.text(name)?;
        OffsetDateTime::parse(raw, &Rfc3339)
            .map_err(|e| PipelineError::Source(format!("invalid {name} '{raw}': {e}")))
    }

    pub fn f64(&self, name: &str) -> Result<f64, PipelineError> {
        let raw = self.text(name)?;
        raw.parse()
            .map_err(|e| PipelineError::Source(format!("invalid {name} '{raw}': {e}")))
    }

    /// Empty cell → `None`.
    pub fn optional_f64(&self, name: &str) -> Result<Option<f64>, PipelineError> {
        let raw = self.text(name)?;
        if raw.is_empty() {
            Ok(None)
        } else {
            self.f64(name).map(Some)
        }
    }
}

/// A record type that can be read from a CSV table.
pub trait FromCsvRow: Sized {
    fn from_row(row: &CsvRow<'_>) -> Result<Self, PipelineError>;
}

/// Columns: ts, region, kind (`D`/`NG`/`TI`), value_mwh
impl FromCsvRow for RegionSeriesRecord {
    fn from_row(row: &CsvRow<'_>) -> Result<Self, PipelineError> {
        let kind_raw = row.text("kind")?;
        let kind = RegionSeriesKind::from_code(kind_raw)
            .ok_or_else(|| PipelineError::Source(format!("invalid kind '{kind_raw}'")))?;
        Ok(RegionSeriesRecord {
            ts: row.ts("ts")?,
            region: row.text("region")?.to_string(),
            kind,
            value_mwh: row.f64("value_mwh")?,
        })
    }
}

/// Columns: ts, from_region, to_region, value_mwh
impl FromCsvRow for InterchangeRecord {
    fn from_row(row: &CsvRow<'_>) -> Result<Self, PipelineError> {
        Ok(InterchangeRecord {
            ts: row.ts("ts")?,
            from_region: row.text("from_region")?.to_string(),
            to_region: row.text("to_region")?.to_string(),
            value_mwh: row.f64("value_mwh")?,
        })
    }
}

/// Columns: ts, region, fuel_code, generation_mwh
impl FromCsvRow for FuelGenerationRecord {
    fn from_row(row: &CsvRow<'_>) -> Result<Self, PipelineError> {
        Ok(FuelGenerationRecord {
            ts: row.ts("ts")?,
            region: row.text("region")?.to_string(),
            fuel_code: row.text("fuel_code")?.to_string(),
            generation_mwh: row.f64("generation_mwh")?,
        })
    }
}

/// Columns: ts, usage_kwh
impl FromCsvRow for PersonalUsageRecord {
    fn from_row(row: &CsvRow<'_>) -> Result<Self, PipelineError> {
        Ok(PersonalUsageRecord {
            ts: row.ts("ts")?,
            usage_kwh: row.f64("usage_kwh")?,
        })
    }
}

/// Columns: ts, value (may be empty)
impl FromCsvRow for IntensityPoint {
    fn from_row(row: &CsvRow<'_>) -> Result<Self, PipelineError> {
        Ok(IntensityPoint {
            ts: row.ts("ts")?,
            value: row.optional_f64("value")?,
        })
    }
}

/// CSV file source for any input table.
pub struct CsvTableSource<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> CsvTableSource<T> {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<T> Source<T> for CsvTableSource<T>
where
    T: FromCsvRow + Send + 'static,
{
    async fn stream(&self) -> RecordStream<T> {
        // Blocking CSV reader inside a single async task; input tables are
        // bounded by the request window.
        let path = self.path.clone();
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open {}: {e}", path.display())))?;
            let mut rdr = csv::Reader::from_reader(file);
            let headers = rdr
                .headers()
                .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
                .clone();

            for result in rdr.records() {
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read CSV record: {e}"
                )))?;

                let parsed = match T::from_row(&CsvRow::new(&record, &headers)) {
                    Ok(v) => v,
                    Err(e) => {
                        metrics::counter!("csv_parse_errors_total").increment(1);
                        Err(e)?
                    }
                };

                yield parsed;
            }
        };

        Box::pin(s)
    }
}
