// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! All stored timestamps use one fixed-width RFC3339 UTC format so that
//! Firestore range filters on them behave like chronological comparisons.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z`
/// suffix. This is the only formatter used for stored timestamps.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored RFC3339 timestamp back to UTC.
pub fn parse_utc_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Current UTC calendar date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Format a calendar date as `YYYY-MM-DD` (sortable).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a stored `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Start of a UTC calendar day as a timestamp.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    NaiveDateTime::new(date, NaiveTime::MIN).and_utc()
}

/// Half-open day window `[start, end)` for a UTC calendar date, formatted
/// with the shared formatter so the bounds compare correctly against stored
/// timestamps.
pub fn utc_day_bounds(date: NaiveDate) -> (String, String) {
    let start = day_start(date);
    let end = day_start(date + chrono::Duration::days(1));
    (format_utc_rfc3339(start), format_utc_rfc3339(end))
}
