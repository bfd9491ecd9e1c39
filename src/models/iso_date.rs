//! Serde helpers for calendar dates in ISO 8601 form (`YYYY-MM-DD`).
//!
//! The Finance Service sometimes returns full timestamps such as
//! `2024-01-15T00:00:00.000Z` for date fields, so only the date part is read.

use serde::{Deserialize, Deserializer, Serializer};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const ISO_MONTH: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]");

/// Parse the leading `YYYY-MM-DD` of `text`.
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    let date_part = text.get(..10).unwrap_or(text);

    Date::parse(date_part, ISO_DATE)
}

/// Format `date` as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    // The format description only has numeric components, so formatting cannot fail.
    date.format(ISO_DATE)
        .unwrap_or_else(|_| date.to_string())
}

/// Format the month `date` falls in as `YYYY-MM`.
pub fn format_month(date: Date) -> String {
    date.format(ISO_MONTH).unwrap_or_else(|_| {
        format!("{:04}-{:02}", date.year(), u8::from(date.month()))
    })
}

/// Serialize a date as `YYYY-MM-DD`.
pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_date(*date))
}

/// Serialize an optional date, for use with `skip_serializing_if = "Option::is_none"`.
pub fn serialize_option<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(date) => serialize(date, serializer),
        None => serializer.serialize_none(),
    }
}

/// Deserialize a `YYYY-MM-DD` date, or the date part of an RFC 3339 timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;

    parse_date(&text).map_err(|error| {
        serde::de::Error::custom(format!("invalid ISO date \"{text}\": {error}"))
    })
}
