use chrono::{DateTime, TimeZone, Utc};
use netrule::evaluate::matches;
use netrule::types::{Condition, TrafficEvent};
use netrule::validate::validate;
use netrule::{Protocol, RuleError};
use serde_json::{Value, json};

fn condition(doc: Value) -> Condition {
    validate(&doc).expect("test condition should validate")
}

fn base_event(host: &str) -> TrafficEvent<'_> {
    TrafficEvent {
        zone: 1,
        url_category: None,
        host,
        http_method: "GET",
        protocol: Protocol::Tcp,
        port: 443,
    }
}

/// Absolute instant for a local wall-clock time in America/Guayaquil
/// (UTC-5 year-round, which keeps the arithmetic honest).
fn guayaquil(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    chrono_tz::America::Guayaquil
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

// ─── Criteria matching ───────────────────────────────────────────────────────

#[test]
fn url_matches_domain_and_subdomains_only() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urls": ["example.com"] }
    }));
    let now = Utc::now();
    assert!(matches(&c, &base_event("example.com"), now));
    assert!(matches(&c, &base_event("a.example.com"), now));
    assert!(matches(&c, &base_event("deep.a.example.com"), now));
    assert!(!matches(&c, &base_event("badexample.com"), now));
    assert!(!matches(&c, &base_event("notexample.com"), now));
    assert!(!matches(&c, &base_event("example.com.evil.io"), now));
}

#[test]
fn url_matching_is_case_insensitive() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urls": ["FACEBOOK.com"] }
    }));
    assert!(matches(&c, &base_event("Facebook.COM"), Utc::now()));
    assert!(matches(&c, &base_event("m.facebook.com"), Utc::now()));
}

#[test]
fn zone_membership() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "zones": [2, 5] }
    }));
    let mut event = base_event("any.host");
    event.zone = 5;
    assert!(matches(&c, &event, Utc::now()));
    event.zone = 3;
    assert!(!matches(&c, &event, Utc::now()));
}

#[test]
fn category_criterion_requires_a_categorized_event() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urlCategories": [10] }
    }));
    let mut event = base_event("host");
    event.url_category = Some(10);
    assert!(matches(&c, &event, Utc::now()));
    event.url_category = Some(11);
    assert!(!matches(&c, &event, Utc::now()));
    event.url_category = None;
    assert!(!matches(&c, &event, Utc::now()));
}

#[test]
fn http_method_matching_is_case_insensitive() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "httpMethods": ["post", "PUT"] }
    }));
    let mut event = base_event("host");
    event.http_method = "POST";
    assert!(matches(&c, &event, Utc::now()));
    event.http_method = "put";
    assert!(matches(&c, &event, Utc::now()));
    event.http_method = "GET";
    assert!(!matches(&c, &event, Utc::now()));
}

#[test]
fn service_requires_exact_protocol_port_pair() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "services": [
            { "protocol": "TCP", "port": 443 },
            { "protocol": "UDP", "port": 53 }
        ]}
    }));
    let mut event = base_event("host");
    assert!(matches(&c, &event, Utc::now())); // TCP/443

    event.protocol = Protocol::Udp;
    event.port = 53;
    assert!(matches(&c, &event, Utc::now()));

    // Right port, wrong protocol.
    event.protocol = Protocol::Udp;
    event.port = 443;
    assert!(!matches(&c, &event, Utc::now()));

    event.protocol = Protocol::Tcp;
    event.port = 80;
    assert!(!matches(&c, &event, Utc::now()));
}

#[test]
fn criteria_kinds_combine_with_and() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "zones": [1], "urls": ["example.com"] }
    }));
    let now = Utc::now();

    assert!(matches(&c, &base_event("example.com"), now));

    let mut wrong_zone = base_event("example.com");
    wrong_zone.zone = 2;
    assert!(!matches(&c, &wrong_zone, now));

    assert!(!matches(&c, &base_event("other.com"), now));
}

#[test]
fn failed_criteria_short_circuit_the_window() {
    // Host mismatch loses regardless of the (always-open) window.
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urls": ["example.com"] },
        "time": {
            "days": ["MON","TUE","WED","THU","FRI","SAT","SUN"],
            "start": "00:00", "end": "23:59",
            "tz": "America/Guayaquil"
        }
    }));
    assert!(!matches(&c, &base_event("other.com"), Utc::now()));
}

// ─── Time windows ────────────────────────────────────────────────────────────

fn school_condition() -> Condition {
    condition(json!({
        "version": 1,
        "note": "block social media during class",
        "match": { "urls": ["facebook.com", "instagram.com"] },
        "time": {
            "days": ["MON", "TUE", "WED", "THU", "FRI"],
            "start": "07:00",
            "end": "13:00",
            "tz": "America/Guayaquil"
        }
    }))
}

#[test]
fn school_scenario_end_to_end() {
    let c = school_condition();
    let event = base_event("facebook.com");

    // 2024-01-17 is a Wednesday.
    assert!(matches(&c, &event, guayaquil(2024, 1, 17, 9, 0)));
    assert!(!matches(&c, &event, guayaquil(2024, 1, 17, 14, 0)));

    // Inside the window but url criterion fails.
    assert!(!matches(&c, &base_event("twitter.com"), guayaquil(2024, 1, 17, 9, 0)));

    // Saturday morning is outside the listed days.
    assert!(!matches(&c, &event, guayaquil(2024, 1, 20, 9, 0)));
}

#[test]
fn window_start_inclusive_end_exclusive() {
    let c = school_condition();
    let event = base_event("facebook.com");
    assert!(matches(&c, &event, guayaquil(2024, 1, 17, 7, 0)));
    assert!(matches(&c, &event, guayaquil(2024, 1, 17, 12, 59)));
    assert!(!matches(&c, &event, guayaquil(2024, 1, 17, 13, 0)));
    assert!(!matches(&c, &event, guayaquil(2024, 1, 17, 6, 59)));
}

#[test]
fn midnight_crossing_window() {
    let c = condition(json!({
        "version": 1, "note": "friday night window",
        "match": { "urls": ["example.com"] },
        "time": {
            "days": ["FRI"],
            "start": "22:00",
            "end": "02:00",
            "tz": "America/Guayaquil"
        }
    }));
    let event = base_event("example.com");

    // 2024-01-19 is a Friday, 2024-01-20 a Saturday, 2024-01-18 a Thursday.
    assert!(matches(&c, &event, guayaquil(2024, 1, 19, 23, 30))); // late Friday
    assert!(matches(&c, &event, guayaquil(2024, 1, 20, 1, 0))); // early Saturday
    assert!(!matches(&c, &event, guayaquil(2024, 1, 20, 3, 0))); // Saturday, past end
    assert!(!matches(&c, &event, guayaquil(2024, 1, 18, 23, 30))); // Thursday night
    assert!(!matches(&c, &event, guayaquil(2024, 1, 19, 21, 59))); // Friday, before start
    assert!(matches(&c, &event, guayaquil(2024, 1, 19, 22, 0))); // Friday, at start
    assert!(!matches(&c, &event, guayaquil(2024, 1, 20, 2, 0))); // Saturday, at end
}

#[test]
fn crossing_window_tail_requires_previous_day_listed() {
    // Early Friday 01:00 falls before end, but Thursday is not listed.
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urls": ["example.com"] },
        "time": { "days": ["FRI"], "start": "22:00", "end": "02:00", "tz": "America/Guayaquil" }
    }));
    assert!(!matches(&c, &base_event("example.com"), guayaquil(2024, 1, 19, 1, 0)));
}

#[test]
fn degenerate_window_never_matches() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urls": ["example.com"] },
        "time": { "days": ["WED"], "start": "08:00", "end": "08:00", "tz": "America/Guayaquil" }
    }));
    let event = base_event("example.com");
    for (h, mi) in [(0, 0), (7, 59), (8, 0), (8, 1), (23, 59)] {
        assert!(
            !matches(&c, &event, guayaquil(2024, 1, 17, h, mi)),
            "zero-length window matched at {:02}:{:02}",
            h,
            mi
        );
    }
}

#[test]
fn window_uses_seasonal_offset_rules() {
    // New York is UTC-5 in winter, UTC-4 in summer; 21:30 UTC is 16:30 EST
    // (inside) but 17:30 EDT (outside).
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urls": ["example.com"] },
        "time": {
            "days": ["MON","TUE","WED","THU","FRI"],
            "start": "09:00", "end": "17:00",
            "tz": "America/New_York"
        }
    }));
    let event = base_event("example.com");

    let winter = Utc.with_ymd_and_hms(2024, 1, 17, 21, 30, 0).unwrap();
    let summer = Utc.with_ymd_and_hms(2024, 7, 17, 21, 30, 0).unwrap();
    assert!(matches(&c, &event, winter));
    assert!(!matches(&c, &event, summer));
}

#[test]
fn no_window_means_any_time() {
    let c = condition(json!({
        "version": 1, "note": "n",
        "match": { "urls": ["example.com"] }
    }));
    let event = base_event("example.com");
    assert!(matches(&c, &event, guayaquil(2024, 1, 17, 3, 0)));
    assert!(matches(&c, &event, guayaquil(2024, 1, 21, 23, 59)));
}

#[test]
fn verdict_is_deterministic() {
    let c = school_condition();
    let event = base_event("facebook.com");
    let at = guayaquil(2024, 1, 17, 9, 0);
    let first = matches(&c, &event, at);
    for _ in 0..10 {
        assert_eq!(matches(&c, &event, at), first);
    }
}

// ─── load pipeline ───────────────────────────────────────────────────────────

#[test]
fn load_composes_parse_and_validate() {
    let c = netrule::load(
        r#"{ "version": 1, "note": "n", "match": { "zones": [1] } }"#,
    )
    .expect("should load");
    assert_eq!(c.criteria().zones().unwrap(), [1]);

    let errors = netrule::load("{ not json").unwrap_err();
    assert!(matches!(errors[0], RuleError::Parse(_)));

    let errors = netrule::load(r#"{ "version": 7 }"#).unwrap_err();
    assert!(errors.iter().all(|e| matches!(e, RuleError::Validation(_))));
    assert!(!errors.is_empty());
}
