//! Conversion of call arguments into XML-RPC values.
//!
//! Arguments are anything implementing [`ToValue`]. Primitives, strings,
//! sequences, string-keyed maps, [`Binary`] buffers and [`Value`]s convert
//! out of the box. Application record types implement [`ToValue`] with a
//! [`StructBuilder`], which applies the per-type field renames registered in
//! [`FieldMaps`]:
//!
//! ```rust
//! use xmlrpc_client::{ConversionResult, FieldMaps, ToValue};
//! use xmlrpc_core::Value;
//!
//! struct Upload {
//!     file: String,
//!     size: u32,
//! }
//!
//! impl ToValue for Upload {
//!     fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
//!         Ok(fields
//!             .record::<Self>()
//!             .field("file", &self.file)?
//!             .field("size", &self.size)?
//!             .build())
//!     }
//! }
//!
//! let fields = FieldMaps::new().with::<Upload, _, _, _>([("file", "FileName")]);
//! let value = Upload { file: "a.txt".into(), size: 3 }.to_value(&fields).unwrap();
//! assert_eq!(value.get("FileName"), Some(&Value::from("a.txt")));
//! ```

use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use xmlrpc_core::{Binary, Members, Value};

use crate::error::{ClientError, ClientResult, ConversionError, ConversionResult};

/// Conversion of a host value into an XML-RPC [`Value`].
pub trait ToValue {
    /// Converts `self`, consulting `fields` for struct member renames.
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value>;
}

/// Per-type tables mapping struct field names to wire member names.
///
/// Fixed when a client is built and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct FieldMaps {
    maps: HashMap<TypeId, HashMap<String, String>>,
}

impl FieldMaps {
    /// Creates an empty set of tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds renames for record type `T`, merging with earlier ones.
    pub fn register<T, I, K, V>(&mut self, mapping: I) -> &mut Self
    where
        T: 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = self.maps.entry(TypeId::of::<T>()).or_default();
        for (field, wire) in mapping {
            table.insert(field.into(), wire.into());
        }
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<T, I, K, V>(mut self, mapping: I) -> Self
    where
        T: 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.register::<T, I, K, V>(mapping);
        self
    }

    /// Returns the wire name of `field` for record type `T`.
    pub fn wire_name<'a, T: 'static>(&'a self, field: &'a str) -> &'a str {
        self.maps
            .get(&TypeId::of::<T>())
            .and_then(|table| table.get(field))
            .map(String::as_str)
            .unwrap_or(field)
    }

    /// Returns true if no renames are registered.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Starts building the struct value of a `T` record.
    pub fn record<T: 'static>(&self) -> StructBuilder<'_> {
        StructBuilder {
            fields: self,
            renames: self.maps.get(&TypeId::of::<T>()),
            type_name: type_name::<T>(),
            members: Members::new(),
        }
    }
}

/// Builds the struct value of one record, applying its field renames.
#[derive(Debug)]
pub struct StructBuilder<'a> {
    fields: &'a FieldMaps,
    renames: Option<&'a HashMap<String, String>>,
    type_name: &'static str,
    members: Members,
}

impl StructBuilder<'_> {
    /// Converts and adds one field.
    pub fn field<V: ToValue + ?Sized>(mut self, name: &str, value: &V) -> ConversionResult<Self> {
        let converted = value
            .to_value(self.fields)
            .map_err(|source| ConversionError::Field {
                type_name: self.type_name,
                field: name.to_string(),
                source: Box::new(source),
            })?;
        let wire = self
            .renames
            .and_then(|table| table.get(name))
            .map_or(name, String::as_str);
        self.members.insert(wire.to_string(), converted);
        Ok(self)
    }

    /// Finishes the struct.
    pub fn build(self) -> Value {
        Value::Struct(self.members)
    }
}

/// Converts positional call arguments, in order.
pub fn to_params(args: &[&(dyn ToValue + Sync)], fields: &FieldMaps) -> ClientResult<Vec<Value>> {
    args.iter()
        .enumerate()
        .map(|(index, arg)| {
            arg.to_value(fields)
                .map_err(|source| ClientError::Conversion { index, source })
        })
        .collect()
}

impl ToValue for Value {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(self.clone())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
        (**self).to_value(fields)
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
        (**self).to_value(fields)
    }
}

macro_rules! lossless_int {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
                    Ok(Value::Int(i64::from(*self)))
                }
            }
        )*
    };
}

macro_rules! checked_int {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
                    i64::try_from(*self)
                        .map(Value::Int)
                        .map_err(|_| ConversionError::out_of_range(self))
                }
            }
        )*
    };
}

lossless_int!(i8, i16, i32, i64, u8, u16, u32);
checked_int!(u64, usize, isize, i128, u128);

impl ToValue for bool {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(Value::Bool(*self))
    }
}

impl ToValue for str {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(Value::Str(self.to_string()))
    }
}

impl ToValue for String {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(Value::Str(self.clone()))
    }
}

impl ToValue for f32 {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(Value::Double(f64::from(*self)))
    }
}

impl ToValue for f64 {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(Value::Double(*self))
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(Value::DateTime(*self))
    }
}

impl ToValue for Binary {
    fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
        Ok(Value::Bytes(self.0.clone()))
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
        self.iter()
            .map(|item| item.to_value(fields))
            .collect::<ConversionResult<Vec<_>>>()
            .map(Value::Array)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
        self.as_slice().to_value(fields)
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
        self.as_slice().to_value(fields)
    }
}

impl<V: ToValue> ToValue for BTreeMap<String, V> {
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
        map_to_struct(self.iter(), fields)
    }
}

impl<V: ToValue, S> ToValue for HashMap<String, V, S> {
    fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
        map_to_struct(self.iter(), fields)
    }
}

fn map_to_struct<'a, V, I>(entries: I, fields: &FieldMaps) -> ConversionResult<Value>
where
    V: ToValue + 'a,
    I: Iterator<Item = (&'a String, &'a V)>,
{
    entries
        .map(|(name, value)| Ok((name.clone(), value.to_value(fields)?)))
        .collect::<ConversionResult<Members>>()
        .map(Value::Struct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Point {
        x: i32,
        y: i32,
    }

    impl ToValue for Point {
        fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
            Ok(fields
                .record::<Self>()
                .field("x", &self.x)?
                .field("y", &self.y)?
                .build())
        }
    }

    struct Shape {
        name: String,
        points: Vec<Point>,
        weight: u64,
    }

    impl ToValue for Shape {
        fn to_value(&self, fields: &FieldMaps) -> ConversionResult<Value> {
            Ok(fields
                .record::<Self>()
                .field("name", &self.name)?
                .field("points", &self.points)?
                .field("weight", &self.weight)?
                .build())
        }
    }

    struct Secret;

    impl ToValue for Secret {
        fn to_value(&self, _fields: &FieldMaps) -> ConversionResult<Value> {
            Err(ConversionError::unsupported::<Self>("secrets are never sent"))
        }
    }

    fn shape() -> Shape {
        Shape {
            name: "tri".to_string(),
            points: vec![Point { x: 0, y: 1 }, Point { x: 2, y: 3 }],
            weight: 9,
        }
    }

    #[test]
    fn primitives() {
        let fields = FieldMaps::new();
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(0, 0, 1)
            .unwrap();
        let params = to_params(
            &[&4, &true, &"Ben", &2.5f64, &Binary(b"hi".to_vec()), &dt],
            &fields,
        )
        .unwrap();
        assert_eq!(
            params,
            vec![
                Value::Int(4),
                Value::Bool(true),
                Value::from("Ben"),
                Value::Double(2.5),
                Value::Bytes(b"hi".to_vec()),
                Value::DateTime(dt),
            ]
        );
    }

    #[test]
    fn sequences_and_maps() {
        let fields = FieldMaps::new();
        let mut map = HashMap::new();
        map.insert("a".to_string(), vec![1u8, 2]);

        assert_eq!(
            map.to_value(&fields).unwrap(),
            Value::structure([("a", Value::Array(vec![Value::Int(1), Value::Int(2)]))])
        );
        assert_eq!(
            [["x"], ["y"]].to_value(&fields).unwrap(),
            Value::Array(vec![
                Value::Array(vec![Value::from("x")]),
                Value::Array(vec![Value::from("y")]),
            ])
        );
    }

    #[test]
    fn values_pass_through() {
        let value = Value::structure([("k", Value::Int(1))]);
        assert_eq!(value.to_value(&FieldMaps::new()).unwrap(), value);
    }

    #[test]
    fn records_use_field_names() {
        let value = shape().to_value(&FieldMaps::new()).unwrap();
        assert_eq!(value.get("name"), Some(&Value::from("tri")));
        assert_eq!(value.get("weight"), Some(&Value::Int(9)));
        let points = value.get("points").and_then(Value::as_array).unwrap();
        assert_eq!(points[1], Value::structure([("x", Value::Int(2)), ("y", Value::Int(3))]));
    }

    #[test]
    fn renames_apply_per_type() {
        let fields = FieldMaps::new()
            .with::<Point, _, _, _>([("x", "X"), ("y", "Y")])
            .with::<Shape, _, _, _>([("name", "Label")]);

        let value = shape().to_value(&fields).unwrap();
        assert_eq!(value.get("Label"), Some(&Value::from("tri")));
        assert_eq!(value.get("name"), None);
        let points = value.get("points").and_then(Value::as_array).unwrap();
        assert_eq!(points[0], Value::structure([("X", Value::Int(0)), ("Y", Value::Int(1))]));
        assert_eq!(fields.wire_name::<Shape>("points"), "points");
        assert_eq!(fields.wire_name::<Shape>("name"), "Label");
    }

    #[test]
    fn register_merges() {
        let mut fields = FieldMaps::new();
        fields.register::<Point, _, _, _>([("x", "first")]);
        fields.register::<Point, _, _, _>([("y", "second")]);
        assert_eq!(fields.wire_name::<Point>("x"), "first");
        assert_eq!(fields.wire_name::<Point>("y"), "second");
        assert!(!fields.is_empty());
    }

    #[test]
    fn out_of_range_fails_the_call() {
        let err = to_params(&[&1, &u64::MAX], &FieldMaps::new()).unwrap_err();
        match err {
            ClientError::Conversion { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source, ConversionError::out_of_range(u64::MAX));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn refused_conversion_is_not_replaced() {
        let err = to_params(&[&"ok", &Secret], &FieldMaps::new()).unwrap_err();
        assert!(matches!(err, ClientError::Conversion { index: 1, .. }));
        assert!(err.to_string().contains("secrets are never sent"));
    }

    #[test]
    fn field_errors_name_the_field() {
        let mut bad = shape();
        bad.weight = u64::MAX;
        let err = bad.to_value(&FieldMaps::new()).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Field { ref field, .. } if field == "weight"
        ));
    }
}
