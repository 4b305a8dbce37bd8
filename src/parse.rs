use crate::error::{ParseError, ParseErrorKind};
use serde_json::Value;

/// Parse JSON text into an unvalidated document tree.
///
/// Performs JSON deserialization and a root-shape check only.
/// Does NOT validate schema conformance — that is [`validate`](crate::validate::validate)'s job,
/// which stays agnostic of the serialization format.
pub fn parse(input: &str) -> Result<Value, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            message: "empty input".to_string(),
            line: None,
            column: None,
        });
    }

    let value: Value = serde_json::from_str(input).map_err(|e| {
        let (line, column) = (e.line(), e.column());
        ParseError {
            kind: ParseErrorKind::Syntax,
            message: e.to_string(),
            line: (line > 0).then_some(line),
            column: (column > 0).then_some(column),
        }
    })?;

    if !value.is_object() {
        return Err(ParseError {
            kind: ParseErrorKind::TypeMismatch,
            message: "document root must be a JSON object".to_string(),
            line: None,
            column: None,
        });
    }

    Ok(value)
}
