use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use chrono_tz::Tz;
use grid_client::domain::IntensityPoint;
use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime};

pub const DEFAULT_WINDOW_HOURS: usize = 4;
pub const DEFAULT_FORECAST_HORIZON: usize = 24;

/// Trailing mean ending at `ts`; `None` for the first `window - 1` points and
/// for any window containing an absent value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolledPoint {
    pub ts: OffsetDateTime,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LowCarbonWindow {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    pub mean_intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowOutcome {
    Found(LowCarbonWindow),
    NoData,
}

impl WindowOutcome {
    pub fn window(&self) -> Option<&LowCarbonWindow> {
        match self {
            Self::Found(w) => Some(w),
            Self::NoData => None,
        }
    }
}

/// Right-aligned rolling mean over the series in timestamp order.
///
/// Keeps a running sum over the current run of defined values, so each point
/// costs O(1) whatever the window length.
pub fn rolling_mean(series: &[IntensityPoint], window: usize) -> Vec<RolledPoint> {
    let mut points = series.to_vec();
    points.sort_by_key(|p| p.ts);

    let mut sum = 0.0;
    let mut run = 0usize;
    let mut rolled = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        match p.value {
            Some(v) if window > 0 => {
                sum += v;
                run += 1;
                if run > window {
                    // The run is contiguous, so the point leaving the window is defined.
                    sum -= points[i - window].value.unwrap_or(0.0);
                    run = window;
                }
            }
            _ => {
                sum = 0.0;
                run = 0;
            }
        }
        rolled.push(RolledPoint {
            ts: p.ts,
            mean: (window > 0 && run == window).then(|| sum / window as f64),
        });
    }
    rolled
}

/// Picks the earliest point with the smallest defined mean. The window spans
/// `[end - window hours, end]`.
pub fn min_window(rolled: &[RolledPoint], window: usize) -> WindowOutcome {
    let best = rolled
        .iter()
        .filter_map(|p| p.mean.map(|m| (p.ts, m)))
        .fold(None, |best: Option<(OffsetDateTime, f64)>, (ts, mean)| match best {
            Some((_, best_mean)) if best_mean <= mean => best,
            _ => Some((ts, mean)),
        });

    let Some((end, mean_intensity)) = best else {
        return WindowOutcome::NoData;
    };
    let Some(start) = i64::try_from(window)
        .ok()
        .and_then(|h| end.checked_sub(Duration::hours(h)))
    else {
        return WindowOutcome::NoData;
    };

    WindowOutcome::Found(LowCarbonWindow {
        start,
        end,
        mean_intensity,
    })
}

/// Lowest-average contiguous window of `window` hours in `series`.
pub fn find_low_carbon_window(series: &[IntensityPoint], window: usize) -> WindowOutcome {
    if window == 0 {
        return WindowOutcome::NoData;
    }
    min_window(&rolling_mean(series, window), window)
}

/// Single upcoming window from a forecast, considering only the first
/// `horizon` points.
pub fn predict_upcoming_window(forecast: &[IntensityPoint], horizon: usize, window: usize) -> WindowOutcome {
    let mut points = forecast.to_vec();
    points.sort_by_key(|p| p.ts);
    points.truncate(horizon);
    find_low_carbon_window(&points, window)
}

/// Occurrences of each hour of the day (0-23).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HourHistogram {
    counts: [u32; 24],
}

impl HourHistogram {
    pub fn record(&mut self, hour: u8) {
        if let Some(slot) = self.counts.get_mut(usize::from(hour)) {
            *slot += 1;
        }
    }

    pub fn count(&self, hour: u8) -> u32 {
        self.counts.get(usize::from(hour)).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[u32; 24] {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Most frequent hour, earliest on ties. `None` when nothing was recorded.
    pub fn mode(&self) -> Option<u8> {
        let (hour, count) = self
            .counts
            .iter()
            .enumerate()
            .fold((0usize, 0u32), |best, (h, &c)| if c > best.1 { (h, c) } else { best });
        (count > 0).then_some(hour as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStart {
    pub day: Date,
    pub start_hour: u8,
    pub window: LowCarbonWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPattern {
    pub days: Vec<DailyStart>,
    pub histogram: HourHistogram,
    pub mode_hour: Option<u8>,
}

/// Calendar day and hour of `ts` on the wall clock of `tz`.
fn local_day_hour(ts: OffsetDateTime, tz: Tz) -> Option<(Date, u8)> {
    let local = chrono::DateTime::from_timestamp(ts.unix_timestamp(), 0)?.with_timezone(&tz);
    let month = Month::try_from(u8::try_from(local.month()).ok()?).ok()?;
    let day = Date::from_calendar_date(local.year(), month, u8::try_from(local.day()).ok()?).ok()?;
    Some((day, u8::try_from(local.hour()).ok()?))
}

/// Mines the usual start hour of the daily low-carbon window over a long history.
///
/// Rolling means are computed once over the whole history, then the rolled
/// points are partitioned by calendar day in `tz` and each day is searched on
/// its own. Day boundaries and start hours follow the zone's daylight-saving
/// rules. Days without a defined mean are skipped.
pub fn mine_daily_starts(series: &[IntensityPoint], window: usize, tz: Tz) -> DailyPattern {
    let mut by_day: BTreeMap<Date, Vec<RolledPoint>> = BTreeMap::new();
    if window > 0 {
        for p in rolling_mean(series, window) {
            if let Some((day, _)) = local_day_hour(p.ts, tz) {
                by_day.entry(day).or_default().push(p);
            }
        }
    }

    let mut histogram = HourHistogram::default();
    let mut days = Vec::with_capacity(by_day.len());
    for (day, points) in by_day {
        let WindowOutcome::Found(w) = min_window(&points, window) else {
            continue;
        };
        let Some((_, start_hour)) = local_day_hour(w.start, tz) else {
            continue;
        };
        histogram.record(start_hour);
        days.push(DailyStart {
            day,
            start_hour,
            window: w,
        });
    }

    tracing::debug!(days = days.len(), timezone = %tz, "daily low-carbon windows mined");
    DailyPattern {
        mode_hour: histogram.mode(),
        days,
        histogram,
    }
}

/// Human label for an hour of the day.
pub fn hour_label(hour: u8) -> String {
    match hour {
        0 => "Midnight".to_string(),
        12 => "Noon".to_string(),
        h if h > 12 => format!("{}:00 PM", h - 12),
        h => format!("{h}:00 AM"),
    }
}
