//! Rule condition validation against the version-1 schema.
//!
//! Returns **all** violations, not just the first, so a rule author gets a
//! complete diagnostic list in one pass. A [`Condition`] is only constructed
//! when the document is fully clean — never a partial model alongside
//! violations.

use crate::enums::{Protocol, Weekday};
use crate::error::Violation;
use crate::types::{Condition, MatchCriteria, SCHEMA_VERSION, ServiceSpec, TimeWindow};
use chrono::NaiveTime;
use chrono_tz::Tz;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):([0-5][0-9])$").unwrap());

const TOP_LEVEL_KEYS: [&str; 4] = ["version", "note", "match", "time"];
const CRITERIA_KEYS: [&str; 5] = ["zones", "urlCategories", "urls", "httpMethods", "services"];
const SERVICE_KEYS: [&str; 2] = ["protocol", "port"];
const TIME_KEYS: [&str; 4] = ["days", "start", "end", "tz"];

/// Validate a parsed document tree against the condition schema.
///
/// On success returns the fully constructed, invariant-satisfying
/// [`Condition`]. On failure returns every violation found, each addressed
/// to a field path. The schema is closed: unknown keys are violations,
/// forward compatibility is carried by `version` alone.
pub fn validate(doc: &Value) -> Result<Condition, Vec<Violation>> {
    let Some(obj) = doc.as_object() else {
        return Err(vec![Violation::new(
            "",
            format!("document must be an object, got {}", type_name(doc)),
        )]);
    };

    let mut violations = Vec::new();

    check_unknown_keys(obj, &mut violations);
    check_version(obj, &mut violations);
    let note = check_note(obj, &mut violations);
    let criteria = check_match(obj, &mut violations);
    let time = check_time(obj, &mut violations);

    if !violations.is_empty() {
        return Err(violations);
    }

    // Each checker reports a violation whenever it cannot produce its part,
    // so a clean pass implies every part is present.
    match (note, criteria) {
        (Some(note), Some(criteria)) => Ok(Condition::new(note, criteria, time)),
        _ => unreachable!("clean validation must produce all parts"),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─── Top-level shape ─────────────────────────────────────────────────────────

fn check_unknown_keys(obj: &Map<String, Value>, violations: &mut Vec<Violation>) {
    for key in obj.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            violations.push(Violation::new(key.clone(), format!("unknown field '{}'", key)));
        }
    }
}

fn check_version(obj: &Map<String, Value>, violations: &mut Vec<Violation>) {
    match obj.get("version") {
        None => violations.push(Violation::new("version", "missing required field")),
        Some(value) => match value.as_i64() {
            Some(v) if v == SCHEMA_VERSION => {}
            Some(v) => violations.push(Violation::new(
                "version",
                format!("unsupported schema version {}, expected {}", v, SCHEMA_VERSION),
            )),
            None => violations.push(Violation::new(
                "version",
                format!("must be an integer, got {}", type_name(value)),
            )),
        },
    }
}

fn check_note(obj: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<String> {
    match obj.get("note") {
        None => {
            violations.push(Violation::new("note", "missing required field"));
            None
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                violations.push(Violation::new("note", "must not be empty"));
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(value) => {
            violations.push(Violation::new(
                "note",
                format!("must be a string, got {}", type_name(value)),
            ));
            None
        }
    }
}

// ─── match ───────────────────────────────────────────────────────────────────

fn check_match(obj: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<MatchCriteria> {
    let value = match obj.get("match") {
        None => {
            violations.push(Violation::new("match", "missing required field"));
            return None;
        }
        Some(v) => v,
    };
    let Some(map) = value.as_object() else {
        violations.push(Violation::new(
            "match",
            format!("must be an object, got {}", type_name(value)),
        ));
        return None;
    };

    for key in map.keys() {
        if !CRITERIA_KEYS.contains(&key.as_str()) {
            violations.push(Violation::new(
                format!("match.{}", key),
                format!("unknown field '{}'", key),
            ));
        }
    }

    // Presence is judged before element checks: an invalid-but-specified
    // criterion must not additionally trip the all-absent rule.
    let any_specified = CRITERIA_KEYS.iter().any(|key| match map.get(*key) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
        None => false,
    });
    if !any_specified {
        violations.push(Violation::new(
            "match",
            "at least one criterion must be present and non-empty",
        ));
    }

    let before = violations.len();
    let zones = check_id_list(map, "zones", violations);
    let url_categories = check_id_list(map, "urlCategories", violations);
    let urls = check_string_list(map, "urls", violations);
    let http_methods = check_string_list(map, "httpMethods", violations);
    let services = check_services(map, violations);

    if violations.len() > before || !any_specified {
        return None;
    }
    Some(MatchCriteria::new(
        zones,
        url_categories,
        urls,
        http_methods,
        services,
    ))
}

/// `zones` / `urlCategories`: sequence of positive integers. An empty list
/// means the criterion is absent.
fn check_id_list(
    map: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<u64>> {
    let value = map.get(key)?;
    let path = format!("match.{}", key);
    let Some(items) = value.as_array() else {
        violations.push(Violation::new(
            path,
            format!("must be an array, got {}", type_name(value)),
        ));
        return None;
    };
    if items.is_empty() {
        return None;
    }

    let mut ids = Vec::with_capacity(items.len());
    let mut clean = true;
    for (i, item) in items.iter().enumerate() {
        match item.as_u64() {
            Some(id) if id >= 1 => ids.push(id),
            _ => {
                violations.push(Violation::new(
                    format!("{}[{}]", path, i),
                    "must be a positive integer",
                ));
                clean = false;
            }
        }
    }
    clean.then_some(ids)
}

/// `urls` / `httpMethods`: sequence of non-empty strings. An empty list
/// means the criterion is absent.
fn check_string_list(
    map: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<String>> {
    let value = map.get(key)?;
    let path = format!("match.{}", key);
    let Some(items) = value.as_array() else {
        violations.push(Violation::new(
            path,
            format!("must be an array, got {}", type_name(value)),
        ));
        return None;
    };
    if items.is_empty() {
        return None;
    }

    let mut entries = Vec::with_capacity(items.len());
    let mut clean = true;
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) if !s.is_empty() => entries.push(s.to_string()),
            Some(_) => {
                violations.push(Violation::new(
                    format!("{}[{}]", path, i),
                    "must not be empty",
                ));
                clean = false;
            }
            None => {
                violations.push(Violation::new(
                    format!("{}[{}]", path, i),
                    format!("must be a string, got {}", type_name(item)),
                ));
                clean = false;
            }
        }
    }
    clean.then_some(entries)
}

fn check_services(
    map: &Map<String, Value>,
    violations: &mut Vec<Violation>,
) -> Option<Vec<ServiceSpec>> {
    let value = map.get("services")?;
    let Some(items) = value.as_array() else {
        violations.push(Violation::new(
            "match.services",
            format!("must be an array, got {}", type_name(value)),
        ));
        return None;
    };
    if items.is_empty() {
        return None;
    }

    let mut specs = Vec::with_capacity(items.len());
    let mut clean = true;
    for (i, item) in items.iter().enumerate() {
        match check_service_entry(item, i, violations) {
            Some(spec) => specs.push(spec),
            None => clean = false,
        }
    }
    clean.then_some(specs)
}

fn check_service_entry(
    item: &Value,
    index: usize,
    violations: &mut Vec<Violation>,
) -> Option<ServiceSpec> {
    let path = format!("match.services[{}]", index);
    let Some(entry) = item.as_object() else {
        violations.push(Violation::new(
            path,
            format!("must be an object, got {}", type_name(item)),
        ));
        return None;
    };

    for key in entry.keys() {
        if !SERVICE_KEYS.contains(&key.as_str()) {
            violations.push(Violation::new(
                format!("{}.{}", path, key),
                format!("unknown field '{}'", key),
            ));
        }
    }

    let protocol = match entry.get("protocol") {
        None => {
            violations.push(Violation::new(
                format!("{}.protocol", path),
                "missing required field",
            ));
            None
        }
        Some(Value::String(s)) => match Protocol::from_token(s) {
            Some(p) => Some(p),
            None => {
                violations.push(Violation::new(
                    format!("{}.protocol", path),
                    format!("must be TCP or UDP, got '{}'", s),
                ));
                None
            }
        },
        Some(value) => {
            violations.push(Violation::new(
                format!("{}.protocol", path),
                format!("must be a string, got {}", type_name(value)),
            ));
            None
        }
    };

    let port = match entry.get("port") {
        None => {
            violations.push(Violation::new(
                format!("{}.port", path),
                "missing required field",
            ));
            None
        }
        Some(value) => match value.as_i64() {
            Some(p) if (1..=65535).contains(&p) => Some(p as u16),
            Some(p) => {
                violations.push(Violation::new(
                    format!("{}.port", path),
                    format!("must be in 1..=65535, got {}", p),
                ));
                None
            }
            None => {
                violations.push(Violation::new(
                    format!("{}.port", path),
                    format!("must be an integer, got {}", type_name(value)),
                ));
                None
            }
        },
    };

    match (protocol, port) {
        (Some(protocol), Some(port)) => Some(ServiceSpec { protocol, port }),
        _ => None,
    }
}

// ─── time ────────────────────────────────────────────────────────────────────

fn check_time(obj: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<TimeWindow> {
    let value = obj.get("time")?;
    let Some(map) = value.as_object() else {
        violations.push(Violation::new(
            "time",
            format!("must be an object, got {}", type_name(value)),
        ));
        return None;
    };

    for key in map.keys() {
        if !TIME_KEYS.contains(&key.as_str()) {
            violations.push(Violation::new(
                format!("time.{}", key),
                format!("unknown field '{}'", key),
            ));
        }
    }

    let days = check_days(map, violations);
    let start = check_clock(map, "start", violations);
    let end = check_clock(map, "end", violations);
    let tz = check_tz(map, violations);

    // start == end is admitted as a zero-length window that never matches;
    // the matcher handles it, not the validator.
    match (days, start, end, tz) {
        (Some(days), Some(start), Some(end), Some(tz)) => {
            Some(TimeWindow::new(days, start, end, tz))
        }
        _ => None,
    }
}

fn check_days(map: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<Vec<Weekday>> {
    match map.get("days") {
        None => {
            violations.push(Violation::new("time.days", "missing required field"));
            None
        }
        Some(Value::Array(items)) if items.is_empty() => {
            violations.push(Violation::new("time.days", "must not be empty"));
            None
        }
        Some(Value::Array(items)) => {
            let mut days = Vec::with_capacity(items.len());
            let mut clean = true;
            for (i, item) in items.iter().enumerate() {
                match item.as_str().and_then(Weekday::from_token) {
                    Some(day) => days.push(day),
                    None => {
                        violations.push(Violation::new(
                            format!("time.days[{}]", i),
                            format!(
                                "unknown weekday token {}, expected one of {}",
                                item,
                                Weekday::TOKENS.join(", ")
                            ),
                        ));
                        clean = false;
                    }
                }
            }
            clean.then_some(days)
        }
        Some(value) => {
            violations.push(Violation::new(
                "time.days",
                format!("must be an array, got {}", type_name(value)),
            ));
            None
        }
    }
}

fn check_clock(
    map: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<NaiveTime> {
    let path = format!("time.{}", key);
    match map.get(key) {
        None => {
            violations.push(Violation::new(path, "missing required field"));
            None
        }
        Some(Value::String(s)) => match parse_hhmm(s) {
            Some(t) => Some(t),
            None => {
                violations.push(Violation::new(
                    path,
                    format!("must be HH:MM (24-hour), got '{}'", s),
                ));
                None
            }
        },
        Some(value) => {
            violations.push(Violation::new(
                path,
                format!("must be a string, got {}", type_name(value)),
            ));
            None
        }
    }
}

fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let caps = CLOCK_RE.captures(s)?;
    let hour = caps[1].parse().ok()?;
    let minute = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn check_tz(map: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<Tz> {
    match map.get("tz") {
        None => {
            violations.push(Violation::new("time.tz", "missing required field"));
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            violations.push(Violation::new("time.tz", "must not be empty"));
            None
        }
        Some(Value::String(s)) => match s.parse::<Tz>() {
            Ok(tz) => Some(tz),
            // Unresolvable zones are a violation here, never a deferred
            // runtime error in the matcher.
            Err(_) => {
                violations.push(Violation::new(
                    "time.tz",
                    format!("unknown IANA timezone '{}'", s),
                ));
                None
            }
        },
        Some(value) => {
            violations.push(Violation::new(
                "time.tz",
                format!("must be a string, got {}", type_name(value)),
            ));
            None
        }
    }
}
