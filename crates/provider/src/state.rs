//! Terraform State Management
//!
//! Values cross the host boundary as msgpack, with JSON accepted as a
//! fallback. Adapters never see the encoded form: they work on
//! [`ResourceData`], which pairs the configuration with the prior state and
//! collects the new state.

use std::collections::HashMap;
use std::io::Cursor;

use ibmcloud_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Dynamic value that can be encoded/decoded from Terraform state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    #[default]
    Null,
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

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::List(l) => Some(l),
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

    /// Attribute value, with a missing key read as null
    pub fn attr(&self, key: &str) -> &DynamicValue {
        static NULL: DynamicValue = DynamicValue::Null;
        self.get(key).unwrap_or(&NULL)
    }

    /// Convert to JSON, dropping null map entries so serde defaults apply
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DynamicValue::Null => serde_json::Value::Null,
            DynamicValue::Bool(b) => serde_json::Value::Bool(*b),
            DynamicValue::Number(n) => serde_json::Value::Number(integral(n)),
            DynamicValue::String(s) => serde_json::Value::String(s.clone()),
            DynamicValue::List(l) => {
                serde_json::Value::Array(l.iter().map(DynamicValue::to_json).collect())
            }
            DynamicValue::Map(m) => serde_json::Value::Object(
                m.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DynamicValue::Null,
            serde_json::Value::Bool(b) => DynamicValue::Bool(b),
            serde_json::Value::Number(n) => DynamicValue::Number(n),
            serde_json::Value::String(s) => DynamicValue::String(s),
            serde_json::Value::Array(a) => {
                DynamicValue::List(a.into_iter().map(DynamicValue::from_json).collect())
            }
            serde_json::Value::Object(o) => DynamicValue::Map(
                o.into_iter()
                    .map(|(k, v)| (k, DynamicValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Decode into a typed configuration struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json())
            .map_err(|e| Error::validation(format!("invalid configuration: {}", e)))
    }

    /// Encode any serializable value
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(DynamicValue::from_json)
            .map_err(|e| Error::validation(format!("cannot encode state value: {}", e)))
    }
}

/// Whole floats become integers; hosts may send `80.0` for a port
fn integral(n: &serde_json::Number) -> serde_json::Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            serde_json::Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

/// Failure to move a value across the host boundary
#[derive(ThisError, Debug)]
pub enum CodecError {
    #[error("value is neither msgpack nor JSON: {0}")]
    Decode(String),

    #[error("failed to encode value: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to encode value as JSON: {0}")]
    EncodeJson(#[from] serde_json::Error),
}

/// Decode a Terraform DynamicValue from msgpack bytes, or JSON bytes
///
/// Input starting with an ASCII digit is read as JSON first: the msgpack
/// integers 48 to 57 are single bytes identical to the JSON digits.
pub fn decode_dynamic_value(data: &[u8]) -> std::result::Result<DynamicValue, CodecError> {
    if data.is_empty() {
        return Ok(DynamicValue::Null);
    }
    if data[0].is_ascii_digit() {
        if let Ok(value) = serde_json::from_slice(data) {
            return Ok(value);
        }
    }

    let mut cursor = Cursor::new(data);
    let msgpack = {
        let mut de = rmp_serde::Deserializer::new(&mut cursor);
        DynamicValue::deserialize(&mut de)
    };
    let msgpack_err = match msgpack {
        Ok(value) if cursor.position() as usize == data.len() => return Ok(value),
        Ok(_) => "trailing bytes after msgpack value".to_string(),
        Err(e) => e.to_string(),
    };

    serde_json::from_slice(data)
        .map_err(|json_err| CodecError::Decode(format!("msgpack: {}; json: {}", msgpack_err, json_err)))
}

/// Encode a value to Terraform DynamicValue msgpack bytes
pub fn encode_dynamic_value(value: &DynamicValue) -> std::result::Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec(value)?)
}

/// An encoded value as the host exchanges it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostValue {
    pub msgpack: Vec<u8>,
    pub json: Vec<u8>,
}

impl HostValue {
    pub fn encode(value: &DynamicValue) -> std::result::Result<Self, CodecError> {
        Ok(Self {
            msgpack: encode_dynamic_value(value)?,
            json: Vec::new(),
        })
    }

    pub fn encode_json(value: &DynamicValue) -> std::result::Result<Self, CodecError> {
        Ok(Self {
            msgpack: Vec::new(),
            json: serde_json::to_vec(value)?,
        })
    }

    pub fn decode(&self) -> std::result::Result<DynamicValue, CodecError> {
        if !self.msgpack.is_empty() {
            decode_dynamic_value(&self.msgpack)
        } else {
            decode_dynamic_value(&self.json)
        }
    }
}

/// Helper to extract a string attribute from a DynamicValue
pub fn get_string_attr(value: &DynamicValue, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_string())
        .unwrap_or("")
        .to_string()
}

/// Helper to extract an optional string attribute from a DynamicValue
pub fn get_optional_string_attr(value: &DynamicValue, key: &str) -> Option<String> {
    value.get(key).and_then(|v| match v {
        DynamicValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Helper to extract an integer attribute from a DynamicValue
pub fn get_int_attr(value: &DynamicValue, key: &str, default: i64) -> i64 {
    value.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

/// Helper to extract a bool attribute from a DynamicValue
pub fn get_optional_bool_attr(value: &DynamicValue, key: &str) -> Option<bool> {
    value.get(key).and_then(|v| v.as_bool())
}

/// Helper to extract a list of strings; non-string elements are skipped
pub fn get_string_list_attr(value: &DynamicValue, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_list())
        .map(|l| {
            l.iter()
                .filter_map(|v| v.as_string().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Create a DynamicValue map with the given attributes
pub fn make_state(attrs: Vec<(&str, DynamicValue)>) -> DynamicValue {
    let mut map = HashMap::new();
    for (key, value) in attrs {
        map.insert(key.to_string(), value);
    }
    DynamicValue::Map(map)
}

/// Create a string DynamicValue
pub fn string_value(s: impl Into<String>) -> DynamicValue {
    DynamicValue::String(s.into())
}

/// String when present, null otherwise
pub fn optional_string_value(s: Option<&str>) -> DynamicValue {
    s.map(string_value).unwrap_or(DynamicValue::Null)
}

/// Create a number DynamicValue from i64
pub fn int_value(n: i64) -> DynamicValue {
    DynamicValue::Number(serde_json::Number::from(n))
}

/// Create a bool DynamicValue
pub fn bool_value(b: bool) -> DynamicValue {
    DynamicValue::Bool(b)
}

pub fn string_list_value<S: AsRef<str>>(items: &[S]) -> DynamicValue {
    DynamicValue::List(items.iter().map(|s| string_value(s.as_ref())).collect())
}

/// Create a null DynamicValue
pub fn null_value() -> DynamicValue {
    DynamicValue::Null
}

/// Configuration, prior state and the state being built for one operation
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    id: Option<String>,
    config: DynamicValue,
    prior: DynamicValue,
    state: HashMap<String, DynamicValue>,
}

impl ResourceData {
    /// New state starts from the configuration, or the prior state when
    /// there is no configuration (refresh, delete).
    pub fn new(config: DynamicValue, prior: DynamicValue) -> Self {
        let id = get_optional_string_attr(&prior, "id")
            .or_else(|| get_optional_string_attr(&config, "id"));
        let state = config
            .as_map()
            .or_else(|| prior.as_map())
            .cloned()
            .unwrap_or_default();
        Self {
            id,
            config,
            prior,
            state,
        }
    }

    /// Data for an import or a data source read, known only by ID
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut data = Self::default();
        data.set_id(id);
        data
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn require_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::validation("resource has no id"))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.state.insert("id".to_string(), string_value(&id));
        self.id = Some(id);
    }

    /// Mark the resource as gone; the host drops it from state
    pub fn clear_id(&mut self) {
        self.id = None;
        self.state.remove("id");
    }

    pub fn config(&self) -> &DynamicValue {
        &self.config
    }

    pub fn prior(&self) -> &DynamicValue {
        &self.prior
    }

    pub fn config_as<T: DeserializeOwned>(&self) -> Result<T> {
        self.config.decode()
    }

    /// Whether the configured value differs from prior state
    pub fn has_change(&self, key: &str) -> bool {
        if self.prior.is_null() {
            return !self.config.attr(key).is_null();
        }
        self.config.attr(key) != self.prior.attr(key)
    }

    /// Value in the state being built
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.state.get(key)
    }

    pub fn set(&mut self, key: &str, value: DynamicValue) {
        self.state.insert(key.to_string(), value);
    }

    pub fn set_encoded<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = DynamicValue::encode(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Final state; null when the ID has been cleared
    pub fn into_state(self) -> DynamicValue {
        match self.id {
            Some(_) => DynamicValue::Map(self.state),
            None => DynamicValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DynamicValue {
        make_state(vec![
            ("id", string_value("gw-1")),
            ("name", string_value("my-transit-gateway")),
            ("global", bool_value(false)),
            ("count", int_value(3)),
            ("tags", string_list_value(&["a", "b"])),
            ("description", null_value()),
        ])
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let value = sample();
        let bytes = encode_dynamic_value(&value).unwrap();
        let decoded = decode_dynamic_value(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_json_fallback() {
        let decoded = decode_dynamic_value(br#"{"name":"my-transit-gateway","global":true}"#).unwrap();
        assert_eq!(get_string_attr(&decoded, "name"), "my-transit-gateway");
        assert_eq!(get_optional_bool_attr(&decoded, "global"), Some(true));
    }

    #[test]
    fn test_json_digit_is_not_read_as_msgpack_integer() {
        assert_eq!(decode_dynamic_value(b"7").unwrap(), int_value(7));
        assert_eq!(decode_dynamic_value(b"42").unwrap(), int_value(42));
        assert_eq!(decode_dynamic_value(&[0x05]).unwrap(), int_value(5));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = decode_dynamic_value(&[0xc1, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_empty_bytes_decode_to_null() {
        assert_eq!(decode_dynamic_value(&[]).unwrap(), DynamicValue::Null);
        assert_eq!(HostValue::default().decode().unwrap(), DynamicValue::Null);
    }

    #[test]
    fn test_decode_skips_nulls() {
        #[derive(Deserialize)]
        struct Config {
            name: String,
            #[serde(default = "default_method")]
            method: String,
        }
        fn default_method() -> String {
            "round_robin".to_string()
        }

        let value = make_state(vec![("name", string_value("lb")), ("method", null_value())]);
        let config: Config = value.decode().unwrap();
        assert_eq!(config.name, "lb");
        assert_eq!(config.method, "round_robin");
    }

    #[test]
    fn test_resource_data_changes() {
        let prior = sample();
        let config = make_state(vec![
            ("name", string_value("renamed")),
            ("global", bool_value(false)),
        ]);
        let data = ResourceData::new(config, prior);
        assert_eq!(data.id(), Some("gw-1"));
        assert!(data.has_change("name"));
        assert!(!data.has_change("global"));
        assert!(!data.has_change("description"));
    }

    #[test]
    fn test_create_reports_only_set_attributes_as_changed() {
        let config = make_state(vec![("name", string_value("gw")), ("global", null_value())]);
        let data = ResourceData::new(config, DynamicValue::Null);
        assert!(data.has_change("name"));
        assert!(!data.has_change("global"));
        assert_eq!(data.id(), None);
    }

    #[test]
    fn test_cleared_id_yields_null_state() {
        let mut data = ResourceData::new(DynamicValue::Null, sample());
        data.set("status", string_value("available"));
        data.clear_id();
        assert_eq!(data.into_state(), DynamicValue::Null);
    }

    #[test]
    fn test_set_encoded() {
        let mut data = ResourceData::with_id("x");
        data.set_encoded("subnets", &vec![1511875i64]).unwrap();
        let state = data.into_state();
        assert_eq!(state.to_json()["subnets"], json!([1511875]));
        assert_eq!(get_string_attr(&state, "id"), "x");
    }
}
