//! # Codec
//!
//! The recursive translation from values to XML-RPC markup.
//!
//! ## Invariants
//! - **Single wrapper**: every wire value is wrapped in exactly one `<value>`, added here
//!   (or by an `Encode` impl), never by the scalar writers.
//! - **Order**: sequence elements and record fields are written in their given order.
//! - **Propagation**: a `Marshal` failure at any depth aborts the whole encode.

use crate::encode::Encode;
use crate::encode::Record;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::value::Value;

/// Encodes a `Value` as one wire value.
///
/// Precedence: a custom capability wins over every built-in category. The
/// remaining categories are disjoint variants, listed in dispatch order.
pub fn encode_value(enc: &mut Encoder, val: &Value) -> Result<()> {
    match val {
        Value::Custom(custom) => enc.marshal(&**custom),
        Value::Int(v) => enc.value(|enc| enc.int(*v)),
        Value::Double(v) => enc.value(|enc| enc.double(*v)),
        Value::String(v) => enc.value(|enc| enc.string(v)),
        Value::Boolean(v) => enc.value(|enc| enc.boolean(*v)),
        Value::Base64(v) => enc.value(|enc| enc.base64(v)),
        Value::DateTime(v) => enc.value(|enc| enc.date_time(v)),
        Value::Array(items) => enc.value(|enc| encode_sequence(enc, items)),
        Value::Struct(fields) => encode_record_value(enc, fields),
        Value::Nil => enc.value(|enc| enc.nil()),
    }
}

/// Encodes `<array><data>…</data></array>` as the payload of an open `<value>`.
///
/// An empty slice produces an empty `<data></data>`.
pub fn encode_sequence<T: Encode>(enc: &mut Encoder, items: &[T]) -> Result<()> {
    encode_iter(enc, items)
}

/// Like `encode_sequence`, for any borrowing iterator.
pub fn encode_iter<'a, T, I>(enc: &mut Encoder, items: I) -> Result<()>
where
    T: Encode + 'a,
    I: IntoIterator<Item = &'a T>,
{
    enc.array_begin()?;
    for item in items {
        item.encode(enc)?;
    }
    enc.array_end()
}

/// Encodes `<struct>…</struct>` as the payload of an open `<value>`.
///
/// Each field becomes `<member><name>NAME</name>VALUE</member>`.
pub fn encode_record<R: Record + ?Sized>(enc: &mut Encoder, record: &R) -> Result<()> {
    enc.struct_begin()?;
    for field in record.fields() {
        enc.member_begin(field.name)?;
        field.value.encode(enc)?;
        enc.member_end()?;
    }
    enc.struct_end()
}

/// Encodes a record as a complete `<value><struct>…</struct></value>`.
pub fn encode_record_value<R: Record + ?Sized>(enc: &mut Encoder, record: &R) -> Result<()> {
    enc.value(|enc| encode_record(enc, record))
}

/// Encodes a standalone value fragment.
pub fn to_string<T: Encode + ?Sized>(value: &T) -> Result<String> {
    let mut enc = Encoder::new();
    value.encode(&mut enc)?;
    enc.into_string()
}
