// Query time windows per resolution and entry point
use super::resolution::Resolution;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Inclusive time range, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The window of width `delta` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, delta: Duration) -> Self {
        Self {
            start: end - delta,
            end,
        }
    }

    pub fn width(&self) -> Duration {
        self.end - self.start
    }
}

/// Entry points disagree on some default windows; each keeps its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowProfile {
    /// CSV and JSON exports.
    Export,
    /// Application SVG plots.
    AppPlot,
    /// Field device SVG plots.
    FieldPlot,
}

impl WindowProfile {
    pub fn default_delta(&self, resolution: Resolution) -> Result<Duration, AppError> {
        match (self, resolution) {
            (_, Resolution::Minute) => Ok(Duration::hours(12)),
            (WindowProfile::AppPlot, Resolution::FiveMinutes) => Ok(Duration::hours(72)),
            (_, Resolution::FiveMinutes) => Ok(Duration::hours(48)),
            (_, Resolution::Hour) => Ok(Duration::days(28)),
            (WindowProfile::Export, Resolution::Full) => Ok(Duration::days(40)),
            (_, Resolution::Full) => Err(AppError::InvalidResolution(
                resolution.as_str().to_string(),
            )),
        }
    }

    /// Axis caption for plots.
    pub fn axis_label(&self, resolution: Resolution) -> &'static str {
        match resolution {
            Resolution::Minute => "12 hours",
            Resolution::FiveMinutes => "48 hours",
            Resolution::Hour => "4 weeks",
            Resolution::Full => "40 days",
        }
    }
}

/// Resolves the query window from optional RFC3339 bounds.
///
/// Explicit bounds are used as given. A missing end is `now`; a missing start
/// is the end minus the profile's default width for `resolution`.
pub fn resolve(
    start: Option<&str>,
    end: Option<&str>,
    resolution: Resolution,
    profile: WindowProfile,
    now: DateTime<Utc>,
) -> Result<TimeRange, AppError> {
    let delta = profile.default_delta(resolution)?;

    let start = start.filter(|s| !s.is_empty()).map(parse_timestamp).transpose()?;
    let end = end.filter(|s| !s.is_empty()).map(parse_timestamp).transpose()?;

    let range = match (start, end) {
        (Some(start), Some(end)) => TimeRange::new(start, end),
        (Some(start), None) => TimeRange::new(start, now),
        (None, Some(end)) => TimeRange::ending_at(end, delta),
        (None, None) => TimeRange::ending_at(now, delta),
    };

    if range.width() < Duration::zero() {
        return Err(AppError::bad_input("startDate is after endDate"));
    }

    Ok(range)
}

pub fn resolve_now(
    start: Option<&str>,
    end: Option<&str>,
    resolution: Resolution,
    profile: WindowProfile,
) -> Result<TimeRange, AppError> {
    resolve(start, end, resolution, profile, Utc::now())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| AppError::bad_input(format!("invalid time: {}", value)))
}
