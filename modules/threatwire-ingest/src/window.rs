//! Recency window pre-filter: drop records that are already stored or whose
//! provider timestamp falls outside a trailing window.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse the loose timestamp forms the provider emits: a bare date, a
/// space-separated datetime, or a `T`-separated datetime with or without an
/// offset. Naive forms are assumed UTC. Returns `None` for anything else.
pub fn parse_provider_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}

/// Keep records that are unseen and recent. A record is dropped when its
/// identity is missing or already known, or when its timestamp is missing,
/// unparseable, or older than `now - window`. Unparseable timestamps drop
/// the record silently; that lossy policy is intentional and matches the
/// upstream contract (the provider offers no better signal).
pub fn recent_unseen<T>(
    records: Vec<T>,
    known: &HashSet<String>,
    now: DateTime<Utc>,
    window: Duration,
    identity: impl Fn(&T) -> &str,
    timestamp: impl Fn(&T) -> &str,
) -> Vec<T> {
    let cutoff = now - window;

    records
        .into_iter()
        .filter(|r| {
            let url = identity(r);
            if url.is_empty() || known.contains(url) {
                return false;
            }
            match parse_provider_timestamp(timestamp(r)) {
                Some(ts) => ts >= cutoff,
                None => false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use threatwire_common::RawVictim;

    fn victim(url: &str, discovered: &str) -> RawVictim {
        RawVictim {
            url: url.to_string(),
            discovered: discovered.to_string(),
            ..Default::default()
        }
    }

    fn run(records: Vec<RawVictim>, known: &HashSet<String>, now: DateTime<Utc>) -> Vec<RawVictim> {
        recent_unseen(records, known, now, Duration::days(7), |v| &v.url, |v| {
            &v.discovered
        })
    }

    #[test]
    fn parses_bare_date_as_utc_midnight() {
        let ts = parse_provider_timestamp("2025-01-01").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_datetime_with_and_without_offset() {
        let with_z = parse_provider_timestamp("2025-01-01T12:30:00Z").unwrap();
        let naive_t = parse_provider_timestamp("2025-01-01T12:30:00").unwrap();
        let naive_space = parse_provider_timestamp("2025-01-01 12:30:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(with_z, expected);
        assert_eq!(naive_t, expected);
        assert_eq!(naive_space, expected);

        let offset = parse_provider_timestamp("2025-01-01T12:30:00+02:00").unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        assert!(parse_provider_timestamp("2025-01-01T12:30:00.123456").is_some());
    }

    #[test]
    fn garbage_timestamp_parses_to_none() {
        assert!(parse_provider_timestamp("not-a-date").is_none());
        assert!(parse_provider_timestamp("").is_none());
        assert!(parse_provider_timestamp("2025-13-45").is_none());
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let just_inside = (now - Duration::days(7) + Duration::seconds(1))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let just_outside = (now - Duration::days(7) - Duration::seconds(1))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let exactly_at = (now - Duration::days(7))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        let records = vec![
            victim("https://a", &just_inside),
            victim("https://b", &just_outside),
            victim("https://c", &exactly_at),
        ];
        let kept = run(records, &HashSet::new(), now);
        let urls: Vec<&str> = kept.iter().map(|v| v.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://c"]);
    }

    #[test]
    fn malformed_timestamp_drops_record_silently() {
        let now = Utc::now();
        let records = vec![
            victim("https://good", &now.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            victim("https://bad", "not-a-date"),
            victim("https://missing", ""),
        ];
        let kept = run(records, &HashSet::new(), now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://good");
    }

    #[test]
    fn known_and_missing_identities_are_dropped() {
        let now = Utc::now();
        let recent = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let mut known = HashSet::new();
        known.insert("https://seen".to_string());

        let records = vec![
            victim("https://seen", &recent),
            victim("", &recent),
            victim("https://new", &recent),
        ];
        let kept = run(records, &known, now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://new");
    }
}
