// Response decoding.
//
// Every endpoint answers with a JSON object whose payload sits under a
// top-level key. `field` pulls that key out untyped; the `expect_*` helpers
// narrow it, failing with `ApiError::Shape` on a type mismatch. List
// payloads go through `lenient_list`, which keeps the elements that decode
// and drops the rest.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

use crate::error::ApiError;

/// Top-level key carrying the payload of every response.
pub const DATA: &str = "data";

/// Parse `body` as a JSON object and take the value stored under `key`.
pub fn field(body: &[u8], key: &str) -> Result<Value, ApiError> {
    let mut parsed: Map<String, Value> = serde_json::from_slice(body)?;
    parsed
        .remove(key)
        .ok_or_else(|| ApiError::FieldMissing(key.to_string()))
}

pub fn expect_str(value: Value, name: &str) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ApiError::shape(name, "a string")),
    }
}

pub fn expect_object(value: Value, name: &str) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::shape(name, "an object")),
    }
}

pub fn expect_array(value: Value, name: &str) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ApiError::shape(name, "an array")),
    }
}

/// Take a required string member out of an object.
pub fn required_str(map: &mut Map<String, Value>, key: &str) -> Result<String, ApiError> {
    let value = map
        .remove(key)
        .ok_or_else(|| ApiError::FieldMissing(key.to_string()))?;
    expect_str(value, key)
}

/// Deserialize a numeric id. The platform may send ids as floats; any finite
/// number in range is accepted and truncated toward zero.
pub fn numeric_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    if let Some(id) = number.as_i64() {
        return Ok(id);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        _ => Err(D::Error::custom(format!("id {number} out of range"))),
    }
}

/// Decode each element as `T`, skipping the ones that do not fit.
pub fn lenient_list<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if decoded.len() != total {
        tracing::warn!(
            dropped = total - decoded.len(),
            kept = decoded.len(),
            "skipped malformed list elements"
        );
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Loose {
        #[serde(deserialize_with = "numeric_id")]
        id: i64,
    }

    #[test]
    fn field_returns_untyped_value() {
        let value = field(br#"{"data":{"a":1},"code":200}"#, "data").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = field(b"not json", "data").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn non_object_root_is_decode_error() {
        let err = field(b"[1,2,3]", "data").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn absent_key_is_field_missing() {
        let err = field(br#"{"msg":"ok"}"#, "data").unwrap_err();
        assert!(matches!(err, ApiError::FieldMissing(ref k) if k == "data"));
    }

    #[test]
    fn key_match_is_exact() {
        let err = field(br#"{"Data":"x"}"#, "data").unwrap_err();
        assert!(matches!(err, ApiError::FieldMissing(_)));
    }

    #[test]
    fn narrowing_reports_expected_kind() {
        let err = expect_str(json!(12), "data").unwrap_err();
        assert!(matches!(err, ApiError::Shape { expected: "a string", .. }));
        assert!(expect_object(json!([]), "data").is_err());
        assert!(expect_array(json!({}), "data").is_err());
        assert_eq!(expect_array(json!([1]), "data").unwrap(), vec![json!(1)]);
    }

    #[test]
    fn required_str_distinguishes_missing_from_mistyped() {
        let mut map = expect_object(json!({"name": "x", "no": 3}), "data").unwrap();
        assert_eq!(required_str(&mut map, "name").unwrap(), "x");
        assert!(matches!(
            required_str(&mut map, "no"),
            Err(ApiError::Shape { .. })
        ));
        assert!(matches!(
            required_str(&mut map, "absent"),
            Err(ApiError::FieldMissing(_))
        ));
    }

    #[test]
    fn numeric_id_accepts_float_encodings() {
        let items = vec![
            json!({"id": 5}),
            json!({"id": 6.0}),
            json!({"id": 7.9}),
            json!({"id": "8"}),
            json!({"id": 1e300}),
        ];
        let decoded: Vec<Loose> = lenient_list(items);
        assert_eq!(
            decoded,
            vec![Loose { id: 5 }, Loose { id: 6 }, Loose { id: 7 }]
        );
    }

    #[test]
    fn lenient_list_drops_only_bad_elements() {
        let items = vec![json!({"id": 1}), json!({"id": "two"}), json!("x"), json!({"id": 3})];
        let decoded: Vec<Item> = lenient_list(items);
        assert_eq!(decoded, vec![Item { id: 1 }, Item { id: 3 }]);
    }
}
