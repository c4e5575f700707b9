use chrono::{Datelike, Duration, NaiveDate};

/// Calendar date of a timestamp as the athlete saw it.
///
/// Accepts:
/// - YYYY-MM-DD
/// - RFC3339 datetime (the date in the timestamp's own offset, so Strava's
///   `start_date_local`, which carries a literal `Z`, keeps its wall-clock date)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS, with optional fractional seconds
pub fn parse_local_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ndt.date());
    }
    None
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Sunday closing the week that starts on `monday`.
pub fn week_end(monday: NaiveDate) -> NaiveDate {
    monday + Duration::days(6)
}

/// `YYYY-MM-DD` key for a week.
pub fn week_key(monday: NaiveDate) -> String {
    monday.format("%Y-%m-%d").to_string()
}
