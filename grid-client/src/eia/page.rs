use serde_json::{Map, Value};
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime};

use super::EiaError;
use crate::domain::{FuelGenerationRecord, InterchangeRecord, RegionSeriesKind, RegionSeriesRecord};

/// One `data` entry. `value` is `None` when the API reported no number.
#[derive(Debug, Clone, PartialEq)]
pub struct EiaRow {
    pub period: OffsetDateTime,
    pub value: Option<f64>,
    pub fields: Map<String, Value>,
}

impl EiaRow {
    fn text(&self, index: usize, name: &str) -> Result<&str, EiaError> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| EiaError::Row {
                index,
                reason: format!("missing field '{name}'"),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EiaPage {
    pub rows: Vec<EiaRow>,
    /// Entries in this page's `data` array, including ones without a value.
    pub returned: usize,
    /// Rows matching the query across all pages.
    pub total: usize,
}

fn parse_period(raw: &str) -> Result<OffsetDateTime, String> {
    let fmt = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    let padded = format!("{raw}:00");
    PrimitiveDateTime::parse(&padded, fmt)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| format!("invalid period '{raw}': {e}"))
}

fn parse_value(v: Option<&Value>) -> Result<Option<f64>, String> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        // The API sometimes sends numbers as strings.
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| format!("invalid value '{s}': {e}")),
        Some(other) => Err(format!("unexpected value {other}")),
    }
}

fn parse_total(v: Option<&Value>) -> Result<usize, EiaError> {
    match v {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|t| t as usize)
            .ok_or_else(|| EiaError::Malformed(format!("invalid total {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|e| EiaError::Malformed(format!("invalid total '{s}': {e}"))),
        _ => Err(EiaError::Malformed("missing 'total'".to_string())),
    }
}

/// Parses one response body. Some responses nest the payload under
/// `response`, some don't.
pub fn parse_page(body: &str) -> Result<EiaPage, EiaError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| EiaError::Malformed(format!("invalid json: {e}")))?;
    let payload = root.get("response").unwrap_or(&root);

    let data = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| EiaError::Malformed("missing 'data' array".to_string()))?;
    let total = parse_total(payload.get("total"))?;

    let mut rows = Vec::with_capacity(data.len());
    for (index, entry) in data.iter().enumerate() {
        let fields = entry.as_object().cloned().ok_or_else(|| EiaError::Row {
            index,
            reason: "entry is not an object".to_string(),
        })?;
        let period_raw = fields
            .get("period")
            .and_then(Value::as_str)
            .ok_or_else(|| EiaError::Row {
                index,
                reason: "missing 'period'".to_string(),
            })?;
        let period = parse_period(period_raw).map_err(|reason| EiaError::Row { index, reason })?;
        let value = parse_value(fields.get("value")).map_err(|reason| EiaError::Row { index, reason })?;
        rows.push(EiaRow { period, value, fields });
    }

    Ok(EiaPage {
        returned: data.len(),
        rows,
        total,
    })
}

/// Region-data rows. Types other than D/NG/TI and rows without a value are skipped.
pub fn to_region_series(rows: &[EiaRow]) -> Result<Vec<RegionSeriesRecord>, EiaError> {
    let mut out = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let Some(value_mwh) = row.value else { continue };
        let Some(kind) = RegionSeriesKind::from_code(row.text(index, "type")?) else {
            continue;
        };
        out.push(RegionSeriesRecord {
            ts: row.period,
            region: row.text(index, "respondent")?.to_string(),
            kind,
            value_mwh,
        });
    }
    Ok(out)
}

pub fn to_interchange(rows: &[EiaRow]) -> Result<Vec<InterchangeRecord>, EiaError> {
    let mut out = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let Some(value_mwh) = row.value else { continue };
        out.push(InterchangeRecord {
            ts: row.period,
            from_region: row.text(index, "fromba")?.to_string(),
            to_region: row.text(index, "toba")?.to_string(),
            value_mwh,
        });
    }
    Ok(out)
}

pub fn to_fuel_generation(rows: &[EiaRow]) -> Result<Vec<FuelGenerationRecord>, EiaError> {
    let mut out = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let Some(generation_mwh) = row.value else { continue };
        out.push(FuelGenerationRecord {
            ts: row.period,
            region: row.text(index, "respondent")?.to_string(),
            fuel_code: row.text(index, "fueltype")?.to_string(),
            generation_mwh,
        });
    }
    Ok(out)
}
