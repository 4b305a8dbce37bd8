//! Match verdict evaluation: set-criteria membership plus timezone-aware
//! recurring window checks.
//!
//! Pure functions over their inputs — the reference instant is injected, so
//! a verdict is reproducible and safe to compute concurrently.

use crate::enums::Weekday;
use crate::types::{Condition, MatchCriteria, TimeWindow, TrafficEvent};
use chrono::{DateTime, Datelike, Utc};

/// Decide whether `event` matches `condition` at the instant `at`.
///
/// Criteria kinds combine with AND; within a kind the set combines with OR;
/// absent kinds are vacuously satisfied. When the condition carries a time
/// window, `at` is converted to local wall-clock time in the window's zone
/// using the IANA rules in effect at that instant.
///
/// `condition` comes from [`validate`](crate::validate::validate) by
/// construction, which is what makes this total: no error surface exists
/// here, only a verdict.
pub fn matches(condition: &Condition, event: &TrafficEvent<'_>, at: DateTime<Utc>) -> bool {
    if !criteria_match(condition.criteria(), event) {
        return false;
    }
    match condition.time() {
        Some(window) => window_matches(window, at),
        None => true,
    }
}

fn criteria_match(criteria: &MatchCriteria, event: &TrafficEvent<'_>) -> bool {
    if let Some(zones) = criteria.zones()
        && !zones.contains(&event.zone)
    {
        return false;
    }

    if let Some(categories) = criteria.url_categories() {
        // An uncategorized event cannot satisfy a category criterion.
        match event.url_category {
            Some(category) if categories.contains(&category) => {}
            _ => return false,
        }
    }

    if let Some(urls) = criteria.urls()
        && !urls.iter().any(|entry| host_matches(event.host, entry))
    {
        return false;
    }

    if let Some(methods) = criteria.http_methods()
        && !methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(event.http_method))
    {
        return false;
    }

    if let Some(services) = criteria.services()
        && !services
            .iter()
            .any(|s| s.protocol == event.protocol && s.port == event.port)
    {
        return false;
    }

    true
}

/// Domain suffix rule: an entry matches the host itself and any subdomain,
/// never a bare substring — `example.com` matches `a.example.com` but not
/// `notexample.com`. Entries are stored lower-cased by the validator.
fn host_matches(host: &str, entry: &str) -> bool {
    let host = host.to_ascii_lowercase();
    match host.strip_suffix(entry) {
        Some(rest) => rest.is_empty() || rest.ends_with('.'),
        None => false,
    }
}

/// Evaluate a recurring weekly window at an absolute instant.
///
/// A straight window (`start < end`) matches when the local weekday is
/// listed and the local time-of-day falls in `[start, end)`. A window with
/// `end < start` crosses local midnight: it also claims the tail before
/// `end` on the day after each listed weekday. `start == end` is a
/// zero-length window and never matches.
fn window_matches(window: &TimeWindow, at: DateTime<Utc>) -> bool {
    let local = at.with_timezone(&window.tz());
    let today = Weekday::from_chrono(local.weekday());
    let t = local.time();
    let start = window.start();
    let end = window.end();

    if start < end {
        return window.days().contains(&today) && t >= start && t < end;
    }
    if start == end {
        return false;
    }

    let yesterday = Weekday::from_chrono(local.weekday().pred());
    (window.days().contains(&today) && t >= start)
        || (window.days().contains(&yesterday) && t < end)
}
