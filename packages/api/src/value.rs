//! Conversion between plain JSON documents and the document database's typed
//! value encoding.
//!
//! | JSON | Wire |
//! |------|------|
//! | `null` | `{"nullValue": null}` |
//! | bool | `{"booleanValue": b}` |
//! | integer | `{"integerValue": "42"}` (int64 travels as a string) |
//! | float | `{"doubleValue": 1.5}` |
//! | string | `{"stringValue": "s"}` |
//! | array | `{"arrayValue": {"values": [...]}}` |
//! | object | `{"mapValue": {"fields": {...}}}` |
//!
//! Server-written `timestampValue`s come back as epoch milliseconds so the
//! models can read `createdAt`/`updatedAt` the same way on every backend.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use store::{Document, StoreError};

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(name, value)| (name.clone(), encode_value(value)))
            .collect(),
    )
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(StoreError::Decode(format!("not a typed value: {value}")));
    };
    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| StoreError::Decode(format!("bad integerValue: {inner}")))?
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "timestampValue" => {
            let text = inner.as_str().unwrap_or_default();
            let at = DateTime::parse_from_rfc3339(text)
                .map_err(|e| StoreError::Decode(format!("bad timestampValue {text}: {e}")))?;
            Value::from(at.with_timezone(&Utc).timestamp_millis())
        }
        "stringValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            Value::Array(values.iter().map(decode_value).collect::<Result<_, _>>()?)
        }
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))?),
        other => return Err(StoreError::Decode(format!("unknown value kind {other}"))),
    };
    Ok(decoded)
}

/// Decode a `fields` object. A missing object is an empty document.
pub fn decode_fields(fields: Option<&Value>) -> Result<Document, StoreError> {
    let Some(fields) = fields else {
        return Ok(Map::new());
    };
    let fields = fields
        .as_object()
        .ok_or_else(|| StoreError::Decode("fields is not an object".to_string()))?;
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_note_fields() {
        let doc = json!({
            "title": "Trip",
            "category": "Personal",
            "imageUrl": null,
            "monthlyBudget": 250.5,
            "createdAt": 1700000000000i64,
        });
        let encoded = encode_fields(doc.as_object().unwrap());
        assert_eq!(encoded["title"], json!({ "stringValue": "Trip" }));
        assert_eq!(encoded["imageUrl"], json!({ "nullValue": null }));
        assert_eq!(encoded["monthlyBudget"], json!({ "doubleValue": 250.5 }));
        assert_eq!(encoded["createdAt"], json!({ "integerValue": "1700000000000" }));
    }

    #[test]
    fn test_decode_server_document() {
        let fields = json!({
            "title": { "stringValue": "Trip" },
            "content": { "stringValue": "Pack bags" },
            "createdAt": { "timestampValue": "2024-01-02T03:04:05.678Z" },
            "tags": { "arrayValue": { "values": [ { "stringValue": "a" }, { "integerValue": "2" } ] } },
            "meta": { "mapValue": { "fields": { "pinned": { "booleanValue": true } } } },
            "empty": { "arrayValue": {} }
        });
        let doc = decode_fields(Some(&fields)).unwrap();
        assert_eq!(doc["title"], "Trip");
        assert_eq!(doc["createdAt"], 1704164645678i64);
        assert_eq!(doc["tags"], json!(["a", 2]));
        assert_eq!(doc["meta"], json!({ "pinned": true }));
        assert_eq!(doc["empty"], json!([]));
    }

    #[test]
    fn test_nested_values_survive_the_wire() {
        let original = json!({ "a": [1, "x", { "b": false }], "c": { "d": null } });
        let doc = original.as_object().unwrap();
        let back = decode_fields(Some(&encode_fields(doc))).unwrap();
        assert_eq!(Value::Object(back), original);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_value(&json!("plain")).is_err());
        assert!(decode_value(&json!({ "integerValue": "abc" })).is_err());
        assert!(decode_value(&json!({ "timestampValue": "yesterday" })).is_err());
        assert!(decode_fields(None).unwrap().is_empty());
    }
}
