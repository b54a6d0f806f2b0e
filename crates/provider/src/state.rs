//! Terraform state handling.
//!
//! Terraform core exchanges attribute values as msgpack-encoded dynamic
//! values; some callers send JSON instead, so decoding tries both.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Dynamic value that can be encoded/decoded from Terraform state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    #[default]
    Null,
    /// A not-yet-known value in a planned state, e.g. the `id` of a
    /// resource that is about to be created. Serializes as null; apply
    /// handlers replace every unknown with a computed result.
    Unknown,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<DynamicValue>),
    Map(HashMap<String, DynamicValue>),
}

impl DynamicValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, DynamicValue>> {
        match self {
            DynamicValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_map()?.get(key)
    }
}

/// Decodes a Terraform dynamic value from msgpack bytes, falling back to
/// JSON. Bytes that decode as neither come back as `Null`.
pub fn decode_dynamic_value(data: &[u8]) -> DynamicValue {
    if data.is_empty() {
        return DynamicValue::Null;
    }
    let mut rd = &data[..];
    if let Ok(value) = rmpv::decode::read_value(&mut rd) {
        // Trailing bytes mean the payload was not msgpack after all
        // (JSON often starts with a byte that parses as a fixint).
        if rd.is_empty() {
            return from_msgpack(value);
        }
    }
    serde_json::from_slice(data).unwrap_or(DynamicValue::Null)
}

/// Maps a raw msgpack value onto `DynamicValue`. Terraform marks values
/// it does not know yet with a msgpack extension (type 0), which must
/// not swallow the rest of the enclosing object.
fn from_msgpack(value: rmpv::Value) -> DynamicValue {
    match value {
        rmpv::Value::Nil => DynamicValue::Null,
        rmpv::Value::Boolean(b) => DynamicValue::Bool(b),
        rmpv::Value::Integer(i) => i
            .as_i64()
            .map(serde_json::Number::from)
            .or_else(|| i.as_u64().map(serde_json::Number::from))
            .map(DynamicValue::Number)
            .unwrap_or(DynamicValue::Null),
        rmpv::Value::F32(f) => float_value(f as f64),
        rmpv::Value::F64(f) => float_value(f),
        rmpv::Value::String(s) => s
            .into_str()
            .map(DynamicValue::String)
            .unwrap_or(DynamicValue::Null),
        rmpv::Value::Array(items) => {
            DynamicValue::List(items.into_iter().map(from_msgpack).collect())
        }
        rmpv::Value::Map(entries) => DynamicValue::Map(
            entries
                .into_iter()
                .filter_map(|(k, v)| Some((k.as_str()?.to_string(), from_msgpack(v))))
                .collect(),
        ),
        rmpv::Value::Ext(..) => DynamicValue::Unknown,
        rmpv::Value::Binary(_) => DynamicValue::Null,
    }
}

fn float_value(f: f64) -> DynamicValue {
    serde_json::Number::from_f64(f)
        .map(DynamicValue::Number)
        .unwrap_or(DynamicValue::Null)
}

/// Encodes a value into the msgpack wire form Terraform expects.
pub fn encode_dynamic_value(value: &DynamicValue) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(value)?)
}

/// Extracts a string attribute, empty if missing or not a string.
pub fn get_string_attr(value: &DynamicValue, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_string())
        .unwrap_or("")
        .to_string()
}

/// Extracts a non-empty string attribute.
pub fn get_optional_string_attr(value: &DynamicValue, key: &str) -> Option<String> {
    value.get(key).and_then(|v| match v {
        DynamicValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Extracts an integer attribute with a default.
pub fn get_int_attr(value: &DynamicValue, key: &str, default: i64) -> i64 {
    value.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

/// Builds a map value from attribute pairs.
pub fn make_state(attrs: Vec<(&str, DynamicValue)>) -> DynamicValue {
    let mut map = HashMap::new();
    for (key, value) in attrs {
        map.insert(key.to_string(), value);
    }
    DynamicValue::Map(map)
}

pub fn string_value(s: impl Into<String>) -> DynamicValue {
    DynamicValue::String(s.into())
}

/// A string value, or null when the input is empty. Optional attributes
/// the server left blank must stay null in state.
pub fn optional_string_value(s: impl Into<String>) -> DynamicValue {
    let s = s.into();
    if s.is_empty() {
        DynamicValue::Null
    } else {
        DynamicValue::String(s)
    }
}

pub fn null_value() -> DynamicValue {
    DynamicValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msgpack_round_trip() {
        let state = make_state(vec![
            ("id", string_value("ag-1")),
            ("name", string_value("web")),
            ("project", null_value()),
        ]);
        let bytes = encode_dynamic_value(&state).unwrap();
        assert_eq!(decode_dynamic_value(&bytes), state);
    }

    #[test]
    fn decode_falls_back_to_json() {
        let decoded = decode_dynamic_value(br#"{"id": "vpc-1", "count": 3}"#);
        assert_eq!(get_string_attr(&decoded, "id"), "vpc-1");
        assert_eq!(get_int_attr(&decoded, "count", 0), 3);
    }

    #[test]
    fn unknown_values_keep_the_rest_of_the_map() {
        // Planned state during a create: computed attributes arrive as
        // msgpack extension 0, configured attributes as plain values.
        let planned = rmpv::Value::Map(vec![
            ("id".into(), rmpv::Value::Ext(0, vec![0])),
            ("name".into(), "web".into()),
        ]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &planned).unwrap();

        let decoded = decode_dynamic_value(&buf);
        assert!(!decoded.is_null());
        assert_eq!(get_string_attr(&decoded, "name"), "web");
        assert_eq!(decoded.get("id"), Some(&DynamicValue::Unknown));
        assert_eq!(get_optional_string_attr(&decoded, "id"), None);
    }

    #[test]
    fn decode_tolerates_garbage() {
        assert!(decode_dynamic_value(&[0xc1, 0xff]).is_null());
        assert!(decode_dynamic_value(b"").is_null());
    }

    #[test]
    fn optional_attrs_skip_empty_strings() {
        let state = make_state(vec![("project", string_value(""))]);
        assert_eq!(get_optional_string_attr(&state, "project"), None);
        assert_eq!(get_optional_string_attr(&state, "missing"), None);

        let state = make_state(vec![("project", string_value("web"))]);
        assert_eq!(
            get_optional_string_attr(&state, "project"),
            Some("web".to_string())
        );
    }

    #[test]
    fn optional_string_value_nulls_empty() {
        assert!(optional_string_value("").is_null());
        assert_eq!(optional_string_value("x"), string_value("x"));
    }
}
