//! Lenient RFC 2822 date parsing.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Named zones that survive in real mail despite being obsolete.
const ZONES: &[(&str, &str)] = &[
    ("UT", "+0000"),
    ("GMT", "+0000"),
    ("UTC", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
];

/// Parses a Date header value.
///
/// Strict RFC 2822 first, then common deviations: missing seconds,
/// named or missing zones, trailing comments, doubled whitespace. An
/// unparseable date yields `None`; it never fails the message.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned = normalize(value);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(&cleaned) {
        return Some(parsed);
    }

    // Offset-bearing fallbacks
    for format in [
        "%a, %d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %z",
        "%a, %d %b %Y %H:%M %z",
        "%d %b %Y %H:%M %z",
        "%a, %d %b %y %H:%M:%S %z",
    ] {
        if let Ok(parsed) = DateTime::parse_from_str(&cleaned, format) {
            return Some(parsed);
        }
    }

    // No zone at all: take the timestamp as UTC
    for format in [
        "%a, %d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M:%S",
        "%a, %d %b %Y %H:%M",
        "%d %b %Y %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    None
}

/// Strips comments, collapses whitespace, resolves named zones.
fn normalize(value: &str) -> String {
    let mut no_comments = String::with_capacity(value.len());
    let mut depth = 0u32;
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 => no_comments.push(c),
            _ => {}
        }
    }

    let collapsed = no_comments.split_whitespace().collect::<Vec<_>>().join(" ");

    // Replace a trailing named zone with its numeric offset
    if let Some((head, last)) = collapsed.rsplit_once(' ')
        && let Some((_, offset)) = ZONES.iter().find(|(name, _)| name.eq_ignore_ascii_case(last))
    {
        return format!("{head} {offset}");
    }

    collapsed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn strict_rfc2822() {
        let parsed = parse_date("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        assert_eq!(parsed.timestamp(), 1_057_049_557);
    }

    #[test]
    fn named_zone() {
        let parsed = parse_date("Mon, 1 Jan 2024 12:00:00 GMT").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);

        let parsed = parse_date("Mon, 1 Jan 2024 12:00:00 PST").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn missing_seconds() {
        let parsed = parse_date("Thu, 13 Feb 2014 08:45 +0000").unwrap();
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "08:45:00");
    }

    #[test]
    fn no_zone_is_utc() {
        let parsed = parse_date("13 Feb 2014 08:45:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn trailing_comment_and_extra_spaces() {
        let parsed = parse_date("Mon,  1 Jan 2024   12:00:00 +0100 (CET)");
        assert!(parsed.is_some());
    }

    #[test]
    fn junk_yields_none() {
        assert!(parse_date("").is_none());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("32 Foo 2024 99:99:99 +0000").is_none());
    }
}
