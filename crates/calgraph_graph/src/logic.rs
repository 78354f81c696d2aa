// --- File: crates/calgraph_graph/src/logic.rs ---
use crate::service::GraphServiceError;
use calgraph_common::models::{DateTimeTimeZone, ScheduleInformation};
use calgraph_common::{config_error, external_service_error, validation_error, CalgraphError};
use calgraph_config::BoundaryPolicy;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, Offset, TimeZone};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Layout of `startDateTime`/`endDateTime` query values, e.g. `2025-05-15T10:00:00+02:00`.
pub const OFFSET_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const GAP_STEP_MINUTES: i64 = 15;
const MAX_GAP_STEPS: i64 = 4 * 24;

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
    #[error("Invalid meeting duration: {0} minutes")]
    InvalidDuration(i64),
    #[error("No schedule information returned for {0}")]
    ScheduleUnavailable(String),
    #[error("Schedule lookup for {schedule} failed: {code} - {message}")]
    ScheduleLookupFailed {
        schedule: String,
        code: String,
        message: String,
    },
    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("Calendar service error: {0}")]
    Service(Box<dyn std::error::Error + Send + Sync>),
}

impl ScheduleError {
    pub(crate) fn service<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        ScheduleError::Service(Box::new(err))
    }
}

impl From<ScheduleError> for CalgraphError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::InvalidInterval(_) | ScheduleError::InvalidDuration(_) => {
                validation_error(err)
            }
            ScheduleError::ScheduleUnavailable(_) => CalgraphError::NotFoundError(err.to_string()),
            ScheduleError::ScheduleLookupFailed { code, message, .. } => {
                external_service_error(crate::service::GRAPH_SERVICE_NAME, code, message)
            }
            ScheduleError::TimeParseError(m) => CalgraphError::ParseError(m),
            ScheduleError::InvalidTimeZone(_) => config_error(err),
            ScheduleError::Service(inner) => match inner.downcast::<GraphServiceError>() {
                Ok(graph) => (*graph).into(),
                Err(other) => CalgraphError::HttpError(other.to_string()),
            },
        }
    }
}

// --- Intervals ---

/// A wall-clock span in the schedule time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parses a pair of service date-times, dropping fractional seconds.
    pub fn from_wire(start: &DateTimeTimeZone, end: &DateTimeTimeZone) -> Result<Self, ScheduleError> {
        let parse = |value: &DateTimeTimeZone| {
            value.naive().map_err(|e| {
                ScheduleError::TimeParseError(format!("'{}': {}", value.date_time, e))
            })
        };
        Ok(Self::new(parse(start)?, parse(end)?))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}

pub(crate) fn validate_candidate(candidate: &Interval) -> Result<(), ScheduleError> {
    if candidate.start >= candidate.end {
        return Err(ScheduleError::InvalidInterval(format!(
            "candidate {} must start before it ends",
            candidate
        )));
    }
    Ok(())
}

fn validate_busy(entry: &Interval) -> Result<(), ScheduleError> {
    if entry.start > entry.end {
        return Err(ScheduleError::InvalidInterval(format!(
            "busy entry {} ends before it starts",
            entry
        )));
    }
    Ok(())
}

/// Whether `candidate` collides with a single busy entry.
///
/// Under [`BoundaryPolicy::Inclusive`] both intervals are closed, so an entry
/// ending exactly at `candidate.start` (or starting at `candidate.end`) is a
/// conflict. [`BoundaryPolicy::HalfOpen`] treats both as `[start, end)`.
pub fn overlaps(candidate: &Interval, entry: &Interval, policy: BoundaryPolicy) -> bool {
    match policy {
        BoundaryPolicy::Inclusive => {
            let start_inside = entry.start <= candidate.start && candidate.start <= entry.end;
            let end_inside = entry.start <= candidate.end && candidate.end <= entry.end;
            let encloses = candidate.start < entry.start && candidate.end > entry.end;
            start_inside || end_inside || encloses
        }
        BoundaryPolicy::HalfOpen => candidate.start < entry.end && entry.start < candidate.end,
    }
}

/// Busy entries that collide with `candidate`, in input order.
pub fn conflicts(
    candidate: &Interval,
    busy: &[Interval],
    policy: BoundaryPolicy,
) -> Result<Vec<Interval>, ScheduleError> {
    validate_candidate(candidate)?;
    let mut hits = Vec::new();
    for entry in busy {
        validate_busy(entry)?;
        if overlaps(candidate, entry, policy) {
            hits.push(*entry);
        }
    }
    Ok(hits)
}

/// True when no busy entry collides with `candidate`.
pub fn is_free(
    candidate: &Interval,
    busy: &[Interval],
    policy: BoundaryPolicy,
) -> Result<bool, ScheduleError> {
    let hits = conflicts(candidate, busy, policy)?;
    if !hits.is_empty() {
        debug!("{} conflicts with {} busy entries", candidate, hits.len());
    }
    Ok(hits.is_empty())
}

// --- Schedule lookup results ---

/// Picks the answer for `schedule` out of a getSchedule response.
///
/// Falls back to the first entry when no id matches, since
/// the service may echo a normalised address.
pub fn select_schedule<'a>(
    infos: &'a [ScheduleInformation],
    schedule: &str,
) -> Result<&'a ScheduleInformation, ScheduleError> {
    infos
        .iter()
        .find(|info| info.schedule_id.eq_ignore_ascii_case(schedule))
        .or_else(|| infos.first())
        .ok_or_else(|| ScheduleError::ScheduleUnavailable(schedule.to_string()))
}

/// Converts one principal's schedule into a busy set.
///
/// Every returned item counts as busy regardless of its status. A per-schedule
/// error is surfaced instead of being mistaken for an empty calendar.
pub fn busy_intervals(info: &ScheduleInformation) -> Result<Vec<Interval>, ScheduleError> {
    if let Some(error) = &info.error {
        return Err(ScheduleError::ScheduleLookupFailed {
            schedule: info.schedule_id.clone(),
            code: error
                .response_code
                .clone()
                .unwrap_or_else(|| "ScheduleLookupFailed".to_string()),
            message: error.message.clone().unwrap_or_default(),
        });
    }
    info.schedule_items
        .iter()
        .map(|item| Interval::from_wire(&item.start, &item.end))
        .collect()
}

// --- Formatting helpers ---

/// ISO-8601 duration for a meeting length, e.g. `PT3600S` for 60 minutes.
pub fn iso8601_duration(minutes: i64) -> Result<String, ScheduleError> {
    if minutes <= 0 {
        return Err(ScheduleError::InvalidDuration(minutes));
    }
    Duration::try_minutes(minutes)
        .map(|d| d.to_string())
        .ok_or(ScheduleError::InvalidDuration(minutes))
}

pub fn format_with_offset(value: &DateTime<FixedOffset>) -> String {
    value.format(OFFSET_DATE_TIME_FORMAT).to_string()
}

/// Window shown by the schedule preview, starting at `now`.
///
/// The day view ends at the coming midnight. The week view ends on Sunday of
/// the current week at the same time of day (an empty window on Sundays).
pub fn preview_window<Tz: TimeZone>(
    now: &DateTime<Tz>,
    week_view: bool,
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), ScheduleError> {
    let end = if week_view {
        let days_left = 6 - i64::from(now.weekday().num_days_from_monday());
        resolve_local(&now.timezone(), now.naive_local() + Duration::days(days_left))?
    } else {
        let midnight = now
            .date_naive()
            .succ_opt()
            .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
            .ok_or_else(|| ScheduleError::TimeParseError("date out of range".to_string()))?;
        resolve_local(&now.timezone(), midnight)?
    };
    Ok((to_fixed(now), to_fixed(&end)))
}

/// Maps a wall-clock time onto `tz`. Ambiguous times take the earlier
/// instant; times skipped by a DST jump move to the first instant after it.
fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    local: NaiveDateTime,
) -> Result<DateTime<Tz>, ScheduleError> {
    (0..=MAX_GAP_STEPS)
        .map(|step| local + Duration::minutes(GAP_STEP_MINUTES * step))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .ok_or_else(|| ScheduleError::TimeParseError(format!("{} does not exist locally", local)))
}

fn to_fixed<Tz: TimeZone>(value: &DateTime<Tz>) -> DateTime<FixedOffset> {
    value.with_timezone(&value.offset().fix())
}
