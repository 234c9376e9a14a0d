//! Time utilities: UTC storage format, timezone offsets, due-time resolution.
//!
//! Every timestamp is stored as UTC using [`DB_FORMAT`]. The format sorts
//! lexicographically in time order, so SQL comparisons on the TEXT column are
//! valid. Conversions to the user's wall clock happen only when parsing input
//! and rendering messages.

use crate::errors::{AppError, AppResult};
use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc,
};

pub const DB_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Timestamp format written by the first generation of the bot.
const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_db(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

pub fn from_db(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DB_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse the `timezone` configuration value.
///
/// Accepts `local`, `utc`/`Z`, or a `+HH:MM` / `-HH:MM` offset.
pub fn parse_offset(s: &str) -> AppResult<FixedOffset> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "local" | "" => return Ok(Local::now().offset().fix()),
        "utc" | "z" => return Ok(Utc.fix()),
        _ => {}
    }

    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => return Err(AppError::Config(format!("invalid timezone offset '{}'", s))),
    };

    let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = h
        .parse()
        .map_err(|_| AppError::Config(format!("invalid timezone offset '{}'", s)))?;
    let minutes: i32 = m
        .parse()
        .map_err(|_| AppError::Config(format!("invalid timezone offset '{}'", s)))?;

    if hours > 14 || minutes > 59 {
        return Err(AppError::Config(format!("timezone offset out of range '{}'", s)));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| AppError::Config(format!("timezone offset out of range '{}'", s)))
}

/// Render a UTC instant on the user's wall clock.
pub fn format_local(dt: &DateTime<Utc>, tz: &FixedOffset) -> String {
    dt.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

/// Build the UTC due instant for `day hh:mm` in the current year and month of
/// the user's timezone. `day = None` means today.
pub fn resolve_due(
    now: DateTime<Utc>,
    tz: &FixedOffset,
    day: Option<u32>,
    hour: u32,
    minute: u32,
) -> AppResult<DateTime<Utc>> {
    let local_now = now.with_timezone(tz);
    let day = day.unwrap_or_else(|| local_now.day());

    let date = NaiveDate::from_ymd_opt(local_now.year(), local_now.month(), day).ok_or_else(|| {
        AppError::InvalidDate(format!(
            "{:04}-{:02}-{:02} does not exist",
            local_now.year(),
            local_now.month(),
            day
        ))
    })?;

    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| AppError::InvalidTime(format!("{:02}:{:02}", hour, minute)))?;

    tz.from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::InvalidDate(format!("{} {}", date, time)))
}

/// Legacy `time_send` values were written in the server's local time.
pub fn parse_legacy_local(s: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), LEGACY_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Legacy `time_create` values come from SQLite's CURRENT_TIMESTAMP (UTC).
pub fn parse_legacy_utc(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), LEGACY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
