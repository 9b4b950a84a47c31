// Calendar arithmetic for dashboard periods and analytics date filters.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid period, expected YYYY-MM")]
pub struct InvalidPeriod(pub String);

impl From<InvalidPeriod> for ApiError {
    fn from(err: InvalidPeriod) -> Self {
        ApiError::invalid_field("period", err.to_string())
    }
}

/// One calendar month, written "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    first_day: NaiveDate,
    next_first_day: NaiveDate,
}

impl Period {
    /// Midnight UTC on the first day of the month.
    pub fn start(&self) -> DateTime<Utc> {
        midnight(self.first_day)
    }

    /// Midnight UTC on the first day of the following month (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        midnight(self.next_first_day)
    }
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPeriod(s.to_string());
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return Err(invalid());
        }

        let year: i32 = s[..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[5..].parse().map_err(|_| invalid())?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let next_first_day = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;

        Ok(Self {
            first_day,
            next_first_day,
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day.format("%Y-%m"))
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

enum DateInput {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

fn parse_date_input(value: &str) -> Option<DateInput> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(DateInput::Day(day));
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(DateInput::Instant(instant.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| DateInput::Instant(naive.and_utc()))
}

/// Inclusive lower bound for a `startDate` filter.
pub fn range_start(value: &str) -> Option<DateTime<Utc>> {
    match parse_date_input(value)? {
        DateInput::Day(day) => Some(midnight(day)),
        DateInput::Instant(instant) => Some(instant),
    }
}

/// Exclusive upper bound for an inclusive `endDate` filter. A bare date
/// covers the whole day.
pub fn range_end(value: &str) -> Option<DateTime<Utc>> {
    match parse_date_input(value)? {
        DateInput::Day(day) => day.succ_opt().map(midnight),
        DateInput::Instant(instant) => Some(instant + Duration::microseconds(1)),
    }
}

/// Parsed `startDate`/`endDate` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn parse(start_date: Option<&str>, end_date: Option<&str>) -> Result<Self, ApiError> {
        let from = match start_date {
            Some(value) => Some(range_start(value).ok_or_else(|| {
                ApiError::invalid_field("startDate", "Start date must be a valid date string")
            })?),
            None => None,
        };
        let before = match end_date {
            Some(value) => Some(
                range_end(value)
                    .ok_or_else(|| ApiError::invalid_field("endDate", "End date must be a valid date string"))?,
            ),
            None => None,
        };
        Ok(Self { from, before })
    }
}
