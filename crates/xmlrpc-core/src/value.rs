//! The XML-RPC value model.
//!
//! A [`Value`] is one XML-RPC datum. There are exactly eight variants: six
//! leaf types and two recursive containers ([`Value::Struct`] and
//! [`Value::Array`]). Equality is structural, so two trees compare equal when
//! every member and element compares equal.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use thiserror::Error;

/// Members of an XML-RPC struct, keyed by member name.
pub type Members = BTreeMap<String, Value>;

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<int>` / `<i4>`.
    Int(i64),
    /// `<boolean>`, encoded as `0` or `1`.
    Bool(bool),
    /// `<string>`.
    Str(String),
    /// `<double>`.
    Double(f64),
    /// `<dateTime.iso8601>`, without timezone offset.
    DateTime(NaiveDateTime),
    /// `<base64>`.
    Bytes(Vec<u8>),
    /// `<struct>`.
    Struct(Members),
    /// `<array>`.
    Array(Vec<Value>),
}

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Bool,
    Str,
    Double,
    DateTime,
    Bytes,
    Struct,
    Array,
}

impl ValueKind {
    /// Returns the canonical wire element name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "boolean",
            Self::Str => "string",
            Self::Double => "double",
            Self::DateTime => "dateTime.iso8601",
            Self::Bytes => "base64",
            Self::Struct => "struct",
            Self::Array => "array",
        }
    }

    /// Returns true for the recursive container kinds.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Struct | Self::Array)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised when a value does not have the shape a caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The value is a different variant.
    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// A struct has no member with the requested name.
    #[error("missing struct member: {0}")]
    MissingMember(String),

    /// An integer does not fit the requested target type.
    #[error("integer {value} out of range for {target}")]
    OutOfRange { value: i64, target: &'static str },
}

impl TypeError {
    /// Creates a mismatch error.
    pub fn mismatch(expected: ValueKind, found: ValueKind) -> Self {
        Self::Mismatch { expected, found }
    }
}

/// XML-RPC timestamp format (ISO-8601 basic date, extended time).
pub const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Timestamp layouts accepted on input, canonical first.
pub const DATETIME_INPUT_FORMATS: [&str; 3] = [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y%m%dT%H%M%S"];

/// Parses a timestamp in any of [`DATETIME_INPUT_FORMATS`].
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

impl Value {
    /// Returns the variant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Bool(_) => ValueKind::Bool,
            Self::Str(_) => ValueKind::Str,
            Self::Double(_) => ValueKind::Double,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Struct(_) => ValueKind::Struct,
            Self::Array(_) => ValueKind::Array,
        }
    }

    /// Builds a struct value from `(name, value)` pairs.
    ///
    /// A repeated name keeps the last value.
    pub fn structure<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Struct(
            members
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Members> {
        match self {
            Self::Struct(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Looks up a struct member by name.
    ///
    /// Returns `None` if the value is not a struct or has no such member.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|members| members.get(name))
    }

    /// Looks up a struct member and converts it to `T`.
    ///
    /// # Errors
    ///
    /// Fails if this value is not a struct, the member is missing, or the
    /// member has a different type.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T, TypeError> {
        let members = self
            .as_struct()
            .ok_or_else(|| TypeError::mismatch(ValueKind::Struct, self.kind()))?;
        let member = members
            .get(name)
            .ok_or_else(|| TypeError::MissingMember(name.to_string()))?;
        T::from_value(member.clone())
    }

    /// Converts this value into `T`, checking the variant.
    pub fn into_typed<T: FromValue>(self) -> Result<T, TypeError> {
        T::from_value(self)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Self::Bytes(v.0)
    }
}

impl From<Members> for Value {
    fn from(v: Members) -> Self {
        Self::Struct(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

/// A byte buffer transmitted as `<base64>`.
///
/// `Vec<u8>` on its own converts as an array of integers; wrap it in
/// `Binary` to send or receive raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binary(pub Vec<u8>);

impl Binary {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Binary {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Binary {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

/// Extraction of a typed result from a [`Value`].
///
/// Conversions never coerce between variants: asking for an `i64` from a
/// `Str("4")` is a [`TypeError::Mismatch`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, TypeError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(TypeError::mismatch(ValueKind::Int, other.kind())),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| TypeError::OutOfRange {
            value: wide,
            target: "i32",
        })
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(TypeError::mismatch(ValueKind::Bool, other.kind())),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(TypeError::mismatch(ValueKind::Str, other.kind())),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Double(d) => Ok(d),
            other => Err(TypeError::mismatch(ValueKind::Double, other.kind())),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => Err(TypeError::mismatch(ValueKind::DateTime, other.kind())),
        }
    }
}

impl FromValue for Binary {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Bytes(b) => Ok(Binary(b)),
            other => Err(TypeError::mismatch(ValueKind::Bytes, other.kind())),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(TypeError::mismatch(ValueKind::Array, other.kind())),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Struct(members) => members
                .into_iter()
                .map(|(name, member)| Ok((name, T::from_value(member)?)))
                .collect(),
            other => Err(TypeError::mismatch(ValueKind::Struct, other.kind())),
        }
    }
}

// JSON rendering used by the CLI. Bytes become base64 text and timestamps
// use the wire format.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Double(d) => serializer.serialize_f64(*d),
            Self::DateTime(dt) => {
                serializer.serialize_str(&dt.format(DATETIME_FORMAT).to_string())
            }
            Self::Bytes(b) => serializer.serialize_str(&STANDARD.encode(b)),
            Self::Struct(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (name, member) in members {
                    map.serialize_entry(name, member)?;
                }
                map.end()
            }
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_struct() -> Value {
        Value::structure([
            ("name", Value::from("Ben")),
            ("age", Value::Int(42)),
            (
                "tags",
                Value::Array(vec![Value::from("a"), Value::from("b")]),
            ),
        ])
    }

    #[test]
    fn timestamps_in_every_input_layout() {
        let dt = NaiveDate::from_ymd_opt(1998, 7, 17)
            .unwrap()
            .and_hms_opt(14, 8, 55)
            .unwrap();
        for text in ["19980717T14:08:55", "1998-07-17T14:08:55", "19980717T140855"] {
            assert_eq!(parse_datetime(text), Some(dt), "{}", text);
        }
        assert_eq!(parse_datetime("1998-07-17"), None);
        assert_eq!(parse_datetime("19980717T14:08:55Z"), None);
    }

    #[test]
    fn kind_names_match_wire_elements() {
        assert_eq!(Value::Int(1).kind().as_str(), "int");
        assert_eq!(Value::Bool(true).kind().as_str(), "boolean");
        assert_eq!(Value::Bytes(vec![]).kind().as_str(), "base64");
        assert_eq!(ValueKind::DateTime.to_string(), "dateTime.iso8601");
        assert!(ValueKind::Struct.is_container());
        assert!(!ValueKind::Str.is_container());
    }

    #[test]
    fn structural_equality_is_deep() {
        assert_eq!(sample_struct(), sample_struct());

        let mut other = sample_struct();
        if let Value::Struct(ref mut members) = other {
            members.insert(
                "tags".to_string(),
                Value::Array(vec![Value::from("a"), Value::from("c")]),
            );
        }
        assert_ne!(sample_struct(), other);
    }

    #[test]
    fn structure_keeps_last_duplicate() {
        let value = Value::structure([("k", Value::Int(1)), ("k", Value::Int(2))]);
        assert_eq!(value.get("k"), Some(&Value::Int(2)));
        assert_eq!(value.as_struct().map(|m| m.len()), Some(1));
    }

    #[test]
    fn get_as_reports_missing_and_mismatch() {
        let value = sample_struct();
        assert_eq!(value.get_as::<String>("name").unwrap(), "Ben");
        assert_eq!(value.get_as::<i64>("age").unwrap(), 42);
        assert_eq!(
            value.get_as::<Vec<String>>("tags").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            value.get_as::<i64>("missing"),
            Err(TypeError::MissingMember("missing".to_string()))
        );
        assert_eq!(
            value.get_as::<bool>("age"),
            Err(TypeError::mismatch(ValueKind::Bool, ValueKind::Int))
        );
        assert_eq!(
            Value::Int(1).get_as::<i64>("x"),
            Err(TypeError::mismatch(ValueKind::Struct, ValueKind::Int))
        );
    }

    #[test]
    fn from_value_never_coerces() {
        assert!(i64::from_value(Value::from("4")).is_err());
        assert!(bool::from_value(Value::Int(1)).is_err());
        assert!(String::from_value(Value::Bytes(b"x".to_vec())).is_err());
    }

    #[test]
    fn i32_conversion_checks_range() {
        assert_eq!(i32::from_value(Value::Int(7)).unwrap(), 7);
        assert_eq!(
            i32::from_value(Value::Int(i64::from(i32::MAX) + 1)),
            Err(TypeError::OutOfRange {
                value: i64::from(i32::MAX) + 1,
                target: "i32",
            })
        );
    }

    #[test]
    fn binary_round_trip() {
        let value = Value::from(Binary::from(&b"Hello"[..]));
        assert_eq!(value.as_bytes(), Some(&b"Hello"[..]));
        assert_eq!(Binary::from_value(value).unwrap().into_inner(), b"Hello");
    }

    #[test]
    fn serializes_to_json() {
        let dt = NaiveDate::from_ymd_opt(1998, 7, 17)
            .unwrap()
            .and_hms_opt(14, 8, 55)
            .unwrap();
        let value = Value::structure([
            ("when", Value::DateTime(dt)),
            ("blob", Value::Bytes(b"Hello World".to_vec())),
            ("ok", Value::Bool(true)),
            ("list", Value::Array(vec![Value::Int(1), Value::Double(2.5)])),
        ]);

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "when": "19980717T14:08:55",
                "blob": "SGVsbG8gV29ybGQ=",
                "ok": true,
                "list": [1, 2.5],
            })
        );
    }
}
