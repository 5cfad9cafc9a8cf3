//! # Values
//!
//! `Value` is the closed set of wire categories. Build one when the shape of the
//! data is only known at runtime; otherwise encode typed values through `Encode`.

use std::sync::Arc;

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::TimeZone;

use crate::codec;
use crate::encode::Bytes;
use crate::encode::Encode;
use crate::encode::Field;
use crate::encode::Marshal;
use crate::encode::Record;
use crate::encoder::Encoder;
use crate::error::Result;

/// An encodable value, tagged with its wire category.
#[derive(Debug, Clone)]
pub enum Value {
    /// Encodes itself; see `Marshal`.
    Custom(Arc<dyn Marshal>),
    Int(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    Base64(Vec<u8>),
    /// Second precision, no zone.
    DateTime(NaiveDateTime),
    Array(Vec<Value>),
    Struct(Struct),
    /// The absent marker, `<nil/>`.
    Nil,
}

impl Value {
    pub fn custom<M: Marshal + 'static>(custom: M) -> Self {
        Value::Custom(Arc::new(custom))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// The wire category name.
    pub fn category(&self) -> &'static str {
        match self {
            Value::Custom(_) => "custom",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Base64(_) => "base64",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Nil => "nil",
        }
    }
}

impl Encode for Value {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        codec::encode_value(enc, self)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self { Value::Int(i64::from(v)) }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self { Value::Double(f64::from(v)) }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Double(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Boolean(v) }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::String(v.to_string()) }
}

impl From<String> for Value {
    fn from(v: String) -> Self { Value::String(v) }
}

impl From<char> for Value {
    fn from(v: char) -> Self { Value::String(v.to_string()) }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self { Value::Base64(v.0) }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self { Value::DateTime(v) }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self { Value::DateTime(v.naive_local()) }
}

impl From<Struct> for Value {
    fn from(v: Struct) -> Self { Value::Struct(v) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self { Value::Nil }
}

/// An ordered set of named members.
///
/// Member order is insertion order; duplicate names are kept as given.
#[derive(Debug, Clone, Default)]
pub struct Struct {
    members: Vec<(String, Value)>,
}

impl Struct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member, builder style.
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.members.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Struct {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Record for Struct {
    fn fields(&self) -> Vec<Field<'_>> {
        self.members.iter().map(|(n, v)| Field::new(n, v)).collect()
    }
}

impl Encode for Struct {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        codec::encode_record_value(enc, self)
    }
}
