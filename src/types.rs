//! Typed rule condition model.
//!
//! A [`Condition`] is only ever constructed by [`validate`](crate::validate::validate),
//! so any live instance already satisfies every schema rule — consumers never
//! re-check. The model is an immutable value: construction plus read accessors.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::enums::{Protocol, Weekday};

/// Current schema version. Any other integer is rejected outright rather
/// than parsed best-effort.
pub const SCHEMA_VERSION: i64 = 1;

/// A validated rule condition: match criteria plus an optional recurring
/// weekly time window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Condition {
    version: i64,
    note: String,
    #[serde(rename = "match")]
    criteria: MatchCriteria,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<TimeWindow>,
}

impl Condition {
    pub(crate) fn new(note: String, criteria: MatchCriteria, time: Option<TimeWindow>) -> Self {
        Condition {
            version: SCHEMA_VERSION,
            note,
            criteria,
            time,
        }
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Human justification for the rule. Never interpreted beyond presence.
    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    pub fn time(&self) -> Option<&TimeWindow> {
        self.time.as_ref()
    }
}

/// The `match` object: independent criteria, ANDed across kinds, ORed
/// within each kind's set.
///
/// Presence is explicit: a criterion the document omitted — or supplied as
/// an empty list — is stored as `None` and is vacuously satisfied during
/// matching. Validation guarantees at least one criterion is present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    zones: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_categories: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<Vec<ServiceSpec>>,
}

impl MatchCriteria {
    /// Normalizes on construction: url entries are lower-cased and method
    /// tokens upper-cased, so matching and canonical serialization are
    /// plain comparisons.
    pub(crate) fn new(
        zones: Option<Vec<u64>>,
        url_categories: Option<Vec<u64>>,
        urls: Option<Vec<String>>,
        http_methods: Option<Vec<String>>,
        services: Option<Vec<ServiceSpec>>,
    ) -> Self {
        MatchCriteria {
            zones,
            url_categories,
            urls: urls.map(|v| v.into_iter().map(|u| u.to_ascii_lowercase()).collect()),
            http_methods: http_methods
                .map(|v| v.into_iter().map(|m| m.to_ascii_uppercase()).collect()),
            services,
        }
    }

    /// Zone identifiers, when the criterion is present.
    pub fn zones(&self) -> Option<&[u64]> {
        self.zones.as_deref()
    }

    /// URL category identifiers, when the criterion is present.
    pub fn url_categories(&self) -> Option<&[u64]> {
        self.url_categories.as_deref()
    }

    /// Domain entries, lower-cased. Each entry matches the domain itself
    /// and all of its subdomains.
    pub fn urls(&self) -> Option<&[String]> {
        self.urls.as_deref()
    }

    /// HTTP method tokens, upper-cased.
    pub fn http_methods(&self) -> Option<&[String]> {
        self.http_methods.as_deref()
    }

    /// L4 services. An event matches by exact `(protocol, port)` equality
    /// with at least one entry.
    pub fn services(&self) -> Option<&[ServiceSpec]> {
        self.services.as_deref()
    }
}

/// An L4 service: protocol plus port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceSpec {
    pub protocol: Protocol,
    /// Always in `1..=65535`; validation rejects port 0.
    pub port: u16,
}

/// The `time` object: a recurring weekly local-time interval, all fields
/// mandatory when present.
///
/// `start` and `end` need not be ordered: `end <= start` denotes a window
/// crossing local midnight, and the degenerate `start == end` is admitted
/// by validation but never matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    days: Vec<Weekday>,
    #[serde(serialize_with = "hhmm")]
    start: NaiveTime,
    #[serde(serialize_with = "hhmm")]
    end: NaiveTime,
    tz: Tz,
}

impl TimeWindow {
    pub(crate) fn new(days: Vec<Weekday>, start: NaiveTime, end: NaiveTime, tz: Tz) -> Self {
        TimeWindow {
            days,
            start,
            end,
            tz,
        }
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// Local wall-clock start, inclusive.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Local wall-clock end, exclusive.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }
}

fn hhmm<S: Serializer>(t: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&t.format("%H:%M").to_string())
}

/// A single classified traffic event presented to the matcher for a verdict.
///
/// Produced by an external traffic-classification component; the engine
/// only reads it.
#[derive(Clone, Copy, Debug)]
pub struct TrafficEvent<'a> {
    /// Originating network zone.
    pub zone: u64,
    /// Category assigned by the URL classifier, when one applies.
    pub url_category: Option<u64>,
    /// Destination host.
    pub host: &'a str,
    /// HTTP method, any casing.
    pub http_method: &'a str,
    /// L4 protocol.
    pub protocol: Protocol,
    /// Destination port.
    pub port: u16,
}
