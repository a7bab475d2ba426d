//! Field deserializers for payloads posted straight from HTML form state,
//! where numbers arrive as strings and dates as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accepts a JSON number or a numeric string. A blank string counts as absent.
pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => match text.trim() {
            "" => Ok(None),
            t => t
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number: {}", t))),
        },
    }
}

/// RFC 3339, or a bare date taken as midnight UTC.
pub fn option_date_start<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    option_date(deserializer, false)
}

/// RFC 3339, or a bare date taken as the last instant of that day, so an
/// inclusive upper bound covers the whole day.
pub fn option_date_end<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    option_date(deserializer, true)
}

fn option_date<'de, D>(deserializer: D, end_of_day: bool) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(&raw, end_of_day).map(Some).map_err(D::Error::custom),
    }
}

pub fn parse_date(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| format!("invalid date: {}", raw))?;
    let naive = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    naive
        .map(|n| n.and_utc())
        .ok_or_else(|| format!("invalid date: {}", raw))
}
