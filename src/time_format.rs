use chrono::{DateTime, NaiveDateTime, Utc};

/// Formats a stored timestamp as `Sun 5 Jan 3.07:PM` (UTC). Unparseable
/// input is returned unchanged.
pub fn format_turn_time(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(time) => time.format("%a %-d %b %-I.%M:%p").to_string(),
        None => raw.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    // Postgres `timestamp` without zone, optionally with fractional seconds.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
