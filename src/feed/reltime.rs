// src/feed/reltime.rs
//! Publish-timestamp parsing and relative-age formatting. Feeds disagree on
//! date formats; RFC 2822 covers RSS, RFC 3339 covers Atom, and anything
//! else formats as an empty string rather than an error.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Parse a feed timestamp to unix seconds. Tries RFC 2822 (chrono's parser
/// accepts the obsolete "GMT"/"UT" zones RSS feeds still emit), then RFC 3339.
pub fn parse_feed_date(ts: &str) -> Option<i64> {
    let t = ts.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(t) {
        return Some(dt.timestamp());
    }
    OffsetDateTime::parse(t, &Rfc3339)
        .ok()
        .map(|dt| dt.unix_timestamp())
}

/// "Xs ago" / "Xm ago" / "Xh ago" / "Xd ago", whole-unit thresholds.
pub fn relative_age(now_unix: i64, then_unix: i64) -> String {
    let secs = (now_unix - then_unix).max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 172_800 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Parse + format against the current clock; unparseable input yields "".
pub fn format_relative(ts: &str) -> String {
    match parse_feed_date(ts) {
        Some(then) => relative_age(chrono::Utc::now().timestamp(), then),
        None => String::new(),
    }
}
