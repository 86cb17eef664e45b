//! Conversion between plain JSON and Firestore's typed value encoding.

use serde_json::{json, Map, Number, Value};

use crate::store::{Fields, StoreError};

/// Encodes a JSON value as a Firestore `Value`.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            // Firestore transports 64-bit integers as decimal strings.
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number.as_f64() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode(value)))
            .collect(),
    )
}

/// Decodes a Firestore `Value` into plain JSON. Timestamps, references and
/// bytes come back as their string forms.
pub fn decode(value: &Value) -> Result<Value, StoreError> {
    let Some(encoded) = value.as_object() else {
        return Err(StoreError::Decode(format!("expected typed value, got {value}")));
    };
    let Some((kind, inner)) = encoded.iter().next() else {
        return Err(StoreError::Decode("empty typed value".to_string()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed(kind, inner)),
        "integerValue" => decode_integer(inner).ok_or_else(|| malformed(kind, inner)),
        "doubleValue" => Ok(decode_double(inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|text| Value::String(text.to_string()))
            .ok_or_else(|| malformed(kind, inner)),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => {
            let values: Vec<Value> = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode).collect(),
                Some(other) => Err(malformed(kind, other)),
                None => Ok(Vec::new()),
            }?;
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(StoreError::Decode(format!("unsupported value type '{other}'"))),
    }
}

pub fn decode_fields(fields: &Value) -> Result<Fields, StoreError> {
    let Some(fields) = fields.as_object() else {
        return Err(StoreError::Decode(format!("expected field map, got {fields}")));
    };
    fields
        .iter()
        .map(|(key, value)| decode(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}

fn decode_integer(inner: &Value) -> Option<Value> {
    match inner {
        Value::String(text) => text.parse::<i64>().ok().map(Value::from),
        Value::Number(number) => number.as_i64().map(Value::from),
        _ => None,
    }
}

fn decode_double(inner: &Value) -> Value {
    match inner {
        Value::Number(number) => Value::Number(number.clone()),
        // NaN and the infinities have no JSON representation.
        _ => inner
            .as_str()
            .and_then(|text| text.parse::<f64>().ok())
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
    }
}

fn malformed(kind: &str, inner: &Value) -> StoreError {
    StoreError::Decode(format!("malformed {kind}: {inner}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_scalars_and_nested_maps() {
        let value = json!({
            "city": "Metro",
            "latitude": 33.7537,
            "units": 12,
            "inside_city_limits": true,
            "parish": null,
            "selected_for_report": { "disclaimer": true },
        });

        let encoded = encode(&value);
        let fields = &encoded["mapValue"]["fields"];
        assert_eq!(fields["city"], json!({ "stringValue": "Metro" }));
        assert_eq!(fields["latitude"], json!({ "doubleValue": 33.7537 }));
        assert_eq!(fields["units"], json!({ "integerValue": "12" }));
        assert_eq!(fields["inside_city_limits"], json!({ "booleanValue": true }));
        assert_eq!(fields["parish"], json!({ "nullValue": null }));
        assert_eq!(
            fields["selected_for_report"],
            json!({ "mapValue": { "fields": { "disclaimer": { "booleanValue": true } } } })
        );
    }

    #[test]
    fn decodes_server_documents() {
        let fields = json!({
            "appraisal_id": { "stringValue": "APP-001" },
            "timestamp": { "timestampValue": "2025-05-01T12:30:00.123456Z" },
            "attempts": { "integerValue": "3" },
            "details": { "mapValue": {} },
            "tags": { "arrayValue": {} },
            "score": { "doubleValue": "NaN" },
        });

        let decoded = decode_fields(&fields).expect("fields decode");
        assert_eq!(decoded["appraisal_id"], json!("APP-001"));
        assert_eq!(decoded["timestamp"], json!("2025-05-01T12:30:00.123456Z"));
        assert_eq!(decoded["attempts"], json!(3));
        assert_eq!(decoded["details"], json!({}));
        assert_eq!(decoded["tags"], json!([]));
        assert_eq!(decoded["score"], Value::Null);
    }

    #[test]
    fn rejects_unknown_value_types() {
        let err = decode(&json!({ "vectorValue": {} })).expect_err("unsupported");
        assert!(matches!(err, StoreError::Decode(message) if message.contains("vectorValue")));
    }
}
