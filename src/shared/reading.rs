/**
 * ECG Reading Data Structure
 *
 * This module defines the Reading struct used for ECG samples relayed from
 * the realtime database to HTTP clients.
 *
 * A reading is an opaque record: a flat mapping of field names to scalar
 * values, plus the `timestamp` field every query orders by. The relay never
 * mutates a reading; it serializes it once and forwards the bytes.
 */
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::shared::error::SharedError;

/// Represents a single ECG sample
///
/// Readings are produced by the devices writing into the realtime database
/// and are read back by the backend either through a point query (latest
/// reading) or through the push subscription.
///
/// # Fields
/// * `timestamp` - Ordering key (milliseconds since epoch by convention)
/// * `fields` - Every other field of the record, kept as-is
///
/// The `timestamp` value is serialized back exactly as the database wrote
/// it; the integer key is derived from it and only used for ordering.
///
/// # Example
/// ```rust
/// use petcardio::shared::Reading;
///
/// let reading = Reading::new(1).with_field("value", 70);
/// assert_eq!(reading.timestamp, 1);
/// assert_eq!(reading.field("value"), Some(&serde_json::json!(70)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Ordering key of the record
    pub timestamp: i64,
    /// Remaining fields of the record
    pub fields: Map<String, Value>,
    raw_timestamp: Value,
}

impl Reading {
    /// Create a reading with no fields besides its timestamp
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            fields: Map::new(),
            raw_timestamp: Value::from(timestamp),
        }
    }

    /// Add a field, replacing any previous value under the same name
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if name != "timestamp" {
            self.fields.insert(name, value.into());
        }
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The `timestamp` value as stored in the database
    pub fn raw_timestamp(&self) -> &Value {
        &self.raw_timestamp
    }

    /// Build a reading from an arbitrary JSON value
    ///
    /// The value must be an object with a numeric `timestamp`.
    pub fn from_value(value: Value) -> Result<Self, SharedError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Err(SharedError::reading("record is not a JSON object")),
        }
    }

    fn from_map(mut fields: Map<String, Value>) -> Result<Self, SharedError> {
        let raw_timestamp = fields
            .remove("timestamp")
            .ok_or_else(|| SharedError::validation("timestamp", "record has no timestamp"))?;
        let timestamp = ordering_key(&raw_timestamp)
            .ok_or_else(|| SharedError::validation("timestamp", "timestamp is not numeric"))?;
        Ok(Self {
            timestamp,
            fields,
            raw_timestamp,
        })
    }

    /// Serialize the reading to the JSON text sent to clients
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Integer ordering key for integer, float or numeric-string timestamps
///
/// Devices are not consistent about how they write the timestamp; every
/// representation that names a number is accepted.
fn ordering_key(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

impl Serialize for Reading {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("timestamp", &self.raw_timestamp)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(fields).map_err(serde::de::Error::custom)
    }
}
