//! Firestore REST `Value` encoding.
//!
//! Every field arrives as a single-key object such as `{"stringValue": "hi"}`,
//! which maps directly onto an externally tagged serde enum.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    /// The store sends `{"nullValue": null}`.
    NullValue(Option<String>),
    BooleanValue(bool),
    /// int64 travels as a decimal string.
    IntegerValue(String),
    /// Non-finite doubles travel as `"NaN"`, `"Infinity"` or `"-Infinity"`.
    #[serde(
        deserialize_with = "deserialize_double",
        serialize_with = "serialize_double"
    )]
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

fn deserialize_double<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDouble {
        Number(f64),
        Text(String),
    }

    match RawDouble::deserialize(deserializer)? {
        RawDouble::Number(n) => Ok(n),
        RawDouble::Text(text) => match text.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => Err(D::Error::custom(format!("invalid double value {other:?}"))),
        },
    }
}

fn serialize_double<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Value::StringValue(text.into())
    }

    #[must_use]
    pub fn null() -> Self {
        Value::NullValue(None)
    }

    #[must_use]
    pub fn integer(n: i64) -> Self {
        Value::IntegerValue(n.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar rendering used when a value stands in for message text.
    #[must_use]
    pub fn display_text(&self) -> Option<String> {
        match self {
            Value::StringValue(s) => Some(s.clone()),
            Value::IntegerValue(n) => Some(n.clone()),
            Value::DoubleValue(d) => Some(d.to_string()),
            Value::BooleanValue(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Falsy values are null, `false`, zero, and empty strings or containers.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::NullValue(_) => false,
            Value::BooleanValue(b) => *b,
            Value::IntegerValue(n) => n.parse::<i64>().map_or(true, |n| n != 0),
            Value::DoubleValue(d) => *d != 0.0,
            Value::StringValue(s) | Value::BytesValue(s) => !s.is_empty(),
            Value::ArrayValue(a) => !a.values.is_empty(),
            Value::MapValue(m) => !m.fields.is_empty(),
            Value::TimestampValue(_) | Value::ReferenceValue(_) | Value::GeoPointValue(_) => true,
        }
    }

    /// Ordering key for values that can sort a transcript.
    #[must_use]
    pub fn sort_key(&self) -> Option<SortKey> {
        match self {
            Value::IntegerValue(n) => n.parse::<i64>().ok().map(SortKey::Integer),
            Value::DoubleValue(d) => Some(SortKey::Number(*d)),
            Value::TimestampValue(ts) => DateTime::parse_from_rfc3339(ts)
                .ok()
                .map(|t| SortKey::Time(t.with_timezone(&Utc))),
            Value::StringValue(s) => Some(SortKey::Text(s.clone())),
            _ => None,
        }
    }
}

/// Comparable message timestamp.
///
/// Across kinds the store's own type order holds: numbers, then instants,
/// then strings. Integers and doubles share one exact numeric order.
#[derive(Debug, Clone)]
pub enum SortKey {
    Integer(i64),
    Number(f64),
    Time(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Integer(_) | SortKey::Number(_) => 0,
            SortKey::Time(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Integer(a), SortKey::Integer(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Integer(a), SortKey::Number(b)) => compare_integer_to_double(*a, *b),
            (SortKey::Number(a), SortKey::Integer(b)) => {
                compare_integer_to_double(*b, *a).reverse()
            }
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Exact comparison without rounding the integer through `f64`. NaN sorts
/// above every integer.
fn compare_integer_to_double(int: i64, double: f64) -> Ordering {
    // 2^63, the first double past `i64::MAX`.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() || double >= TWO_POW_63 {
        return Ordering::Less;
    }
    if double < -TWO_POW_63 {
        return Ordering::Greater;
    }

    let whole = double.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&double).unwrap_or(Ordering::Equal),
        other => other,
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}
