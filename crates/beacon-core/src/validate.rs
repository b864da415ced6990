//! Structural validation of inbound beacons.

use serde_json::Value;

use crate::error::RejectReason;
use crate::payload::{CanonicalPayload, PayloadRepresentation};

/// Payload fields every beacon must carry, in the order rejections report
/// them.
pub const REQUIRED_PAYLOAD_FIELDS: [&str; 3] = ["eventType", "timestamp", "currentURL"];

/// Whether a payload field counts as present.
///
/// Mirrors the truthiness rule of the submitting widgets: null, missing,
/// empty strings, `false`, and numeric zero are all absent; arrays and
/// objects are always present.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Validate an inbound beacon and produce its canonical payload.
///
/// Checks run in a fixed order and stop at the first failure:
///
/// 1. `project_id` and `data` present and non-empty
/// 2. canonical string form of `data` within `limit` bytes
/// 3. string submissions parse as JSON
/// 4. required payload fields present with non-empty values
///
/// Pure: no side effects, no store access.
pub fn validate(
    project_id: &str,
    data: &PayloadRepresentation,
    limit: usize,
) -> Result<CanonicalPayload, RejectReason> {
    if project_id.is_empty() || data.is_empty() {
        return Err(RejectReason::MissingField);
    }

    let canonical = data.to_canonical_string();
    if canonical.len() > limit {
        return Err(RejectReason::PayloadTooLarge {
            limit,
            actual: canonical.len(),
        });
    }

    let parsed = match data {
        PayloadRepresentation::RawString(s) => serde_json::from_str(s)
            .map_err(|err| RejectReason::MalformedJson(err.to_string()))?,
        PayloadRepresentation::Structured(v) => v.clone(),
    };

    let missing: Vec<&'static str> = REQUIRED_PAYLOAD_FIELDS
        .iter()
        .filter(|field| !is_present(parsed.get(**field).unwrap_or(&Value::Null)))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(RejectReason::MissingPayloadFields(missing));
    }

    Ok(CanonicalPayload { canonical, parsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> String {
        r#"{"eventType":"click","timestamp":"2026-01-01T00:00:00Z","currentURL":"https://x"}"#
            .to_string()
    }

    #[test]
    fn accepts_a_complete_string_payload() {
        let data = PayloadRepresentation::RawString(valid_payload());
        let payload = validate("p1", &data, 51200).unwrap();
        assert_eq!(payload.canonical, valid_payload());
        assert_eq!(payload.parsed["eventType"], "click");
    }

    #[test]
    fn accepts_a_complete_structured_payload() {
        let data = PayloadRepresentation::Structured(json!({
            "eventType": "click",
            "timestamp": 1000,
            "currentURL": "https://x",
        }));
        assert!(validate("p1", &data, 51200).is_ok());
    }

    #[test]
    fn empty_project_id_is_missing_field() {
        let data = PayloadRepresentation::RawString(valid_payload());
        assert_eq!(
            validate("", &data, 51200).unwrap_err(),
            RejectReason::MissingField
        );
    }

    #[test]
    fn empty_data_is_missing_field() {
        let data = PayloadRepresentation::RawString(String::new());
        assert_eq!(
            validate("p1", &data, 51200).unwrap_err(),
            RejectReason::MissingField
        );
    }

    #[test]
    fn size_check_runs_before_syntax_check() {
        // Not JSON at all, but the ceiling fires first.
        let data = PayloadRepresentation::RawString("x".repeat(100));
        assert!(matches!(
            validate("p1", &data, 10).unwrap_err(),
            RejectReason::PayloadTooLarge { limit: 10, actual: 100 }
        ));
    }

    #[test]
    fn malformed_string_is_rejected() {
        let data = PayloadRepresentation::RawString("{not json".to_string());
        assert!(matches!(
            validate("p1", &data, 51200).unwrap_err(),
            RejectReason::MalformedJson(_)
        ));
    }

    #[test]
    fn missing_fields_are_listed_in_declared_order() {
        let data = PayloadRepresentation::RawString(r#"{"eventType":"click"}"#.to_string());
        assert_eq!(
            validate("p1", &data, 51200).unwrap_err(),
            RejectReason::MissingPayloadFields(vec!["timestamp", "currentURL"])
        );
    }

    #[test]
    fn all_fields_missing_for_non_object_payload() {
        let data = PayloadRepresentation::RawString("[1,2,3]".to_string());
        assert_eq!(
            validate("p1", &data, 51200).unwrap_err(),
            RejectReason::MissingPayloadFields(vec!["eventType", "timestamp", "currentURL"])
        );
    }

    #[test]
    fn falsy_values_count_as_missing() {
        let data = PayloadRepresentation::Structured(json!({
            "eventType": "",
            "timestamp": 0,
            "currentURL": null,
        }));
        assert_eq!(
            validate("p1", &data, 51200).unwrap_err(),
            RejectReason::MissingPayloadFields(vec!["eventType", "timestamp", "currentURL"])
        );
    }

    #[test]
    fn numeric_timestamp_is_present() {
        let data = PayloadRepresentation::Structured(json!({
            "eventType": "click",
            "timestamp": 1000,
            "currentURL": "https://x",
        }));
        assert!(validate("p1", &data, 51200).is_ok());
    }
}
