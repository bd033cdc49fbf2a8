// Date expression parsing for command-line input

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::deadline::today;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Unsupported date expression: '{0}'. Use YYYY-MM-DD, today, tomorrow, yesterday or +Nd")]
    Unsupported(String),
    #[error("Invalid month: '{0}'. Use YYYY-MM")]
    InvalidMonth(String),
}

/// Parse a date expression relative to `today`.
///
/// Accepts absolute dates (`2026-01-10`), ISO datetimes (the date part is
/// kept), `today`, `tomorrow`, `yesterday` and day offsets (`+3d`, `-1d`, `3d`).
pub fn parse_date_expr_from(expr: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let expr = expr.trim();

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(expr, format) {
            return Ok(datetime.date());
        }
    }
    // RFC 3339 with offset, as written by JSON exports
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(expr) {
        return Ok(datetime.date_naive());
    }

    match expr.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Some(offset) = expr.strip_suffix('d') {
        let offset = offset.strip_prefix('+').unwrap_or(offset);
        if let Ok(days) = offset.parse::<i64>() {
            return Duration::try_days(days)
                .and_then(|delta| today.checked_add_signed(delta))
                .ok_or_else(|| DateError::Unsupported(expr.to_string()));
        }
    }

    Err(DateError::Unsupported(expr.to_string()))
}

pub fn parse_date_expr(expr: &str) -> Result<NaiveDate, DateError> {
    parse_date_expr_from(expr, today())
}

/// Parse an optional date argument; `none` and empty text clear the date
pub fn parse_optional_date(expr: &str) -> Result<Option<NaiveDate>, DateError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_date_expr(trimmed).map(Some)
}

/// Parse a stored ISO date column. Unreadable values count as absent.
pub fn parse_stored_date(value: Option<String>) -> Option<NaiveDate> {
    let value = value?;
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            log::warn!("Ignoring unreadable stored date: {:?}", value);
            None
        }
    }
}

/// Parse `YYYY-MM` into (year, month)
pub fn parse_month(expr: &str) -> Result<(i32, u32), DateError> {
    let invalid = || DateError::InvalidMonth(expr.to_string());
    let (year, month) = expr.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    Ok((year, month))
}
