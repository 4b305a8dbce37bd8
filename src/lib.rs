//! Rule condition validation and matching for network traffic control.
//!
//! Each control rule carries a structured condition describing which traffic
//! it applies to — network zones, URL categories, explicit domains, HTTP
//! methods, L4 services — and an optional recurring weekly time window. This
//! crate is the pure-logic core of that system:
//!
//! ```text
//! parse(json) → Value → validate(doc) → Condition → matches(cond, event, at) → bool
//! ```
//!
//! Rule storage, packet enforcement, and the administrative CRUD surface are
//! external collaborators. The engine performs no I/O and never reads the
//! system clock — the reference instant is injected, so every verdict is
//! reproducible. A [`Condition`] can only be obtained through validation,
//! which is what lets the matcher trust its input without re-checking.
//!
//! # Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use netrule::{Protocol, TrafficEvent, matches};
//!
//! let condition = netrule::load(
//!     r#"{
//!         "version": 1,
//!         "note": "block social media during class",
//!         "match": { "urls": ["facebook.com", "instagram.com"] },
//!         "time": {
//!             "days": ["MON", "TUE", "WED", "THU", "FRI"],
//!             "start": "07:00",
//!             "end": "13:00",
//!             "tz": "America/Guayaquil"
//!         }
//!     }"#,
//! )
//! .expect("valid condition");
//!
//! let event = TrafficEvent {
//!     zone: 1,
//!     url_category: None,
//!     host: "facebook.com",
//!     http_method: "GET",
//!     protocol: Protocol::Tcp,
//!     port: 443,
//! };
//!
//! // Wednesday 09:00 in Guayaquil (UTC-5) is 14:00 UTC.
//! let at = Utc.with_ymd_and_hms(2024, 1, 17, 14, 0, 0).unwrap();
//! assert!(matches(&condition, &event, at));
//! ```

pub mod enums;
pub mod error;
pub mod evaluate;
pub mod parse;
pub mod serialize;
pub mod types;
pub mod validate;

pub use enums::*;
pub use error::*;
pub use types::*;

// Re-export entry-point functions at the crate root for convenience.
pub use evaluate::matches;
pub use parse::parse;
pub use serialize::serialize;
pub use validate::validate;

/// Convenience entry point composing parse → validate.
///
/// # Errors
///
/// Returns `Err(Vec<RuleError>)` if parsing fails or validation finds
/// violations; the list is never empty on failure.
///
/// # Example
///
/// ```rust
/// let errors = netrule::load(r#"{ "version": 2, "match": {} }"#).unwrap_err();
/// assert!(!errors.is_empty());
/// ```
pub fn load(input: &str) -> Result<Condition, Vec<RuleError>> {
    let doc = parse::parse(input).map_err(|e| vec![RuleError::Parse(e)])?;
    validate::validate(&doc)
        .map_err(|violations| violations.into_iter().map(RuleError::Validation).collect())
}
