use std::{
    collections::{BTreeMap, HashMap},
    fs::{self, File},
    path::{Path, PathBuf},
};

use chrono_tz::Tz;
use grid_client::domain::IntensityPoint;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Duration, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::pipeline::PipelineError;

/// File kinds published in the gridemissions bulk dataset.
pub const BULK_KINDS: [&str; 7] = ["elec", "co2", "co2i", "raw", "basic", "rolling", "opt"];

/// Column holding a region's consumption-based carbon intensity.
pub fn intensity_column(region: &str) -> String {
    format!("CO2i_{region}_D")
}

/// Home zone of the intensity columns whose region is known.
pub fn column_timezone(column: &str) -> Option<Tz> {
    match column {
        "CO2i_ISNE_D" => Some(chrono_tz::America::New_York),
        "CO2i_WACM_D" => Some(chrono_tz::America::Denver),
        _ => None,
    }
}

/// One non-empty cell of the bulk dataset, in long form.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    /// Start of the hour, UTC.
    pub period: OffsetDateTime,
    pub column: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkHistory {
    pub rows: Vec<HistoryRow>,
}

impl BulkHistory {
    /// One column as an intensity series, ascending.
    pub fn series(&self, column: &str) -> Vec<IntensityPoint> {
        self.rows
            .iter()
            .filter(|r| r.column == column)
            .map(|r| IntensityPoint {
                ts: r.period,
                value: Some(r.value),
            })
            .collect()
    }

    pub fn columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self.rows.iter().map(|r| r.column.as_str()).collect();
        cols.sort_unstable();
        cols.dedup();
        cols
    }
}

fn parse_period(raw: &str) -> Result<OffsetDateTime, PipelineError> {
    let naive = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, naive)
        .map(PrimitiveDateTime::assume_utc)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .map_err(|e| PipelineError::Source(format!("invalid period '{raw}': {e}")))
}

fn parse_cell(raw: &str) -> Result<Option<f64>, PipelineError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|e| PipelineError::Source(format!("invalid value '{raw}': {e}")))
}

fn bulk_files(dir: &Path, which: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let suffix = format!("{which}.csv");
    let entries =
        fs::read_dir(dir).map_err(|e| PipelineError::Source(format!("failed to list {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::Source(format!("failed to list {}: {e}", dir.display())))?;
        if entry.file_name().to_string_lossy().ends_with(&suffix) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every `*{which}.csv` in `dir`.
///
/// Files are wide tables (period index, one column per series). Rows from all
/// files are merged by period, a repeated period keeps its last row, and the
/// end-of-hour periods are shifted back to the start of the hour.
pub fn load_bulk(dir: &Path, which: &str) -> Result<BulkHistory, PipelineError> {
    if !BULK_KINDS.contains(&which) {
        return Err(PipelineError::Source(format!("unexpected bulk kind '{which}'")));
    }

    let mut by_period: BTreeMap<OffsetDateTime, HashMap<String, f64>> = BTreeMap::new();
    let files = bulk_files(dir, which)?;
    for path in &files {
        let file =
            File::open(path).map_err(|e| PipelineError::Source(format!("failed to open {}: {e}", path.display())))?;
        let mut rdr = csv::Reader::from_reader(file);
        let headers = rdr
            .headers()
            .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
            .clone();

        for result in rdr.records() {
            let record = result.map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))?;
            let Some(period_raw) = record.get(0) else { continue };
            let period = parse_period(period_raw.trim())?;

            let mut cells = HashMap::new();
            for (name, raw) in headers.iter().zip(record.iter()).skip(1) {
                if let Some(v) = parse_cell(raw)? {
                    cells.insert(name.trim().to_string(), v);
                }
            }
            by_period.insert(period, cells);
        }
    }

    let mut rows = Vec::new();
    for (period, cells) in by_period {
        let start = period - Duration::hours(1);
        let mut cells: Vec<(String, f64)> = cells.into_iter().collect();
        cells.sort_by(|a, b| a.0.cmp(&b.0));
        rows.extend(cells.into_iter().map(|(column, value)| HistoryRow {
            period: start,
            column,
            value,
        }));
    }

    tracing::info!(
        files = files.len(),
        records = rows.len(),
        earliest = ?rows.first().map(|r| r.period),
        latest = ?rows.last().map(|r| r.period),
        "gridemissions bulk history loaded"
    );
    Ok(BulkHistory { rows })
}
