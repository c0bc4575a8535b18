//! Date parsing and formatting for front-matter, sitemap and feed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::time::SystemTime;

/// Parse a front-matter date.
///
/// Accepted forms: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, and RFC 3339.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn from_system_time(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// `2024-05-01`
pub fn to_ymd(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d").to_string()
}

/// W3C datetime for sitemap `<lastmod>`: `2024-05-01T10:00:00Z`
pub fn to_w3c(time: SystemTime) -> String {
    from_system_time(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// RFC 2822 for RSS `<pubDate>`: `Wed, 01 May 2024 00:00:00 +0000`
pub fn to_rfc2822(time: DateTime<Utc>) -> String {
    time.to_rfc2822()
}
