use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which of the two fused streams a decoder produces records for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Environmental sensor log (CO₂, temperature, humidity), seconds-scale.
    Air,
    /// Wearable heart-rate entries, irregular.
    HeartRate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Air => "air",
            SignalKind::HeartRate => "heart_rate",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SignalKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "air" | "co2" | "environment" => Ok(SignalKind::Air),
            "heart_rate" | "heart-rate" | "hr" | "health" => Ok(SignalKind::HeartRate),
            other => Err(format!("unknown signal kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Scalar JSON values only; arrays and objects have no field representation.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Number(number) => number.as_f64().map(FieldValue::Number),
            Value::String(text) => Some(FieldValue::Text(text.clone())),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(text) => FieldValue::Text(text.to_string()),
            None => FieldValue::Null,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

/// One decoded element before any timestamp interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub timestamp_raw: String,
    pub fields: FieldMap,
}

impl RawRecord {
    pub fn new(timestamp_raw: impl Into<String>) -> Self {
        Self {
            timestamp_raw: timestamp_raw.into(),
            fields: FieldMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Records produced.
    pub decoded: usize,
    /// Lines or archive rows that failed structural parsing.
    pub skipped_lines: usize,
    /// Parsed elements lacking a timestamp or the expected structure.
    pub missing_fields: usize,
}

impl DecodeStats {
    pub fn merge(&mut self, other: DecodeStats) {
        self.decoded += other.decoded;
        self.skipped_lines += other.skipped_lines;
        self.missing_fields += other.missing_fields;
    }

    pub fn dropped(&self) -> usize {
        self.skipped_lines + self.missing_fields
    }
}

#[derive(Debug, Clone)]
pub struct Decoded {
    pub decoder: &'static str,
    pub records: Vec<RawRecord>,
    pub stats: DecodeStats,
}

impl Decoded {
    pub fn new(decoder: &'static str) -> Self {
        Self {
            decoder,
            records: Vec::new(),
            stats: DecodeStats::default(),
        }
    }

    pub(crate) fn push(&mut self, record: RawRecord) {
        self.records.push(record);
        self.stats.decoded += 1;
    }

    pub(crate) fn skip_line(&mut self) {
        self.stats.skipped_lines += 1;
    }

    pub(crate) fn missing_field(&mut self) {
        self.stats.missing_fields += 1;
    }

    /// Appends another unit's records, keeping input order.
    pub fn absorb(&mut self, other: Decoded) {
        self.records.extend(other.records);
        self.stats.merge(other.stats);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
