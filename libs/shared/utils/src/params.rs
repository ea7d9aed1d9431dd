use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use shared_database::OrderBy;

/// Deserializes blank query/form values as `None` and parses the rest with `FromStr`.
/// HTML filter forms submit every field, so `?active=&name=` must mean "no filter".
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Parses `?ordering=-scheduled_at,status` against the public field names in
/// `allowed`. Unknown fields are ignored; with nothing usable the default applies.
pub fn parse_ordering(
    raw: Option<&str>,
    allowed: &[(&str, &'static str)],
    default: &[OrderBy],
) -> Vec<OrderBy> {
    let requested: Vec<OrderBy> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (descending, name) = match part.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, part),
            };
            allowed
                .iter()
                .find(|(public, _)| *public == name)
                .map(|(_, column)| OrderBy { column: *column, descending })
        })
        .collect();

    if requested.is_empty() {
        default.to_vec()
    } else {
        requested
    }
}

/// Accepts RFC 3339, `datetime-local` input values and plain seconds precision.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Timestamp as stored: RFC 3339 with a `Z` suffix.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

/// A date-range bound. A plain date covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

impl DateBound {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            DateBound::Day(day) => Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)),
            DateBound::Instant(at) => *at,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            DateBound::Day(day) => {
                Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)) + Duration::days(1)
                    - Duration::nanoseconds(1)
            }
            DateBound::Instant(at) => *at,
        }
    }
}

impl FromStr for DateBound {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(day) = parse_date(raw) {
            return Ok(DateBound::Day(day));
        }
        parse_datetime(raw)
            .map(DateBound::Instant)
            .ok_or_else(|| format!("'{}' is not a valid date or date-time", raw))
    }
}
