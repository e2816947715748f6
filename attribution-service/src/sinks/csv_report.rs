use std::{fs::File, io::Write, path::Path};

use grid_client::domain::NetFootprintRecord;
use time::format_description::well_known::Rfc3339;

use crate::{
    attribution::{hour_label, HourHistogram},
    pipeline::PipelineError,
};

fn sink_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Sink(e.to_string())
}

fn opt_cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Writes `ts,usage_kwh,intensity_g_per_kwh,net_gco2`; undefined values are empty cells.
pub fn write_footprint_csv<W: Write>(out: W, rows: &[NetFootprintRecord]) -> Result<(), PipelineError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["ts", "usage_kwh", "intensity_g_per_kwh", "net_gco2"])
        .map_err(sink_err)?;
    for r in rows {
        let ts = r.ts.format(&Rfc3339).map_err(sink_err)?;
        w.write_record([
            ts,
            r.usage_kwh.to_string(),
            opt_cell(r.intensity_g_per_kwh),
            opt_cell(r.net_gco2),
        ])
        .map_err(sink_err)?;
    }
    w.flush().map_err(sink_err)?;
    metrics::counter!("footprint_rows_written_total").increment(rows.len() as u64);
    Ok(())
}

/// Writes `hour,label,count` for all 24 hours.
pub fn write_histogram_csv<W: Write>(out: W, histogram: &HourHistogram) -> Result<(), PipelineError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["hour", "label", "count"]).map_err(sink_err)?;
    for (hour, count) in (0u8..).zip(histogram.counts()) {
        w.write_record([hour.to_string(), hour_label(hour), count.to_string()])
            .map_err(sink_err)?;
    }
    w.flush().map_err(sink_err)
}

pub fn create_file(path: &Path) -> Result<File, PipelineError> {
    File::create(path).map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn footprint_csv_leaves_undefined_cells_empty() {
        let rows = vec![
            NetFootprintRecord {
                ts: datetime!(2024-01-01 00:00:00 UTC),
                usage_kwh: 2.0,
                intensity_g_per_kwh: Some(400.0),
                net_gco2: Some(0.8),
            },
            NetFootprintRecord {
                ts: datetime!(2024-01-01 01:00:00 UTC),
                usage_kwh: 1.0,
                intensity_g_per_kwh: None,
                net_gco2: None,
            },
        ];
        let mut buf = Vec::new();
        write_footprint_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ts,usage_kwh,intensity_g_per_kwh,net_gco2");
        assert_eq!(lines[1], "2024-01-01T00:00:00Z,2,400,0.8");
        assert_eq!(lines[2], "2024-01-01T01:00:00Z,1,,");
    }

    #[test]
    fn histogram_csv_has_every_hour() {
        let mut h = HourHistogram::default();
        h.record(0);
        h.record(0);
        h.record(15);
        let mut buf = Vec::new();
        write_histogram_csv(&mut buf, &h).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 25);
        assert_eq!(lines[1], "0,Midnight,2");
        assert_eq!(lines[16], "15,3:00 PM,1");
    }
}
