//! # Capability Traits
//!
//! How Rust types become wire values.
//!
//! - `Encode`: the type writes exactly one wire value.
//! - `Record`: the type is a named, ordered set of fields (a `<struct>`, or a parameter list).
//! - `Marshal`: the type produces its own pre-formed fragment, bypassing the built-in rules.
//!
//! `u8` is deliberately not `Encode`. Binary data must be wrapped in `Bytes`, so a
//! byte buffer can never be mistaken for an array of integers.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::TimeZone;

use crate::codec;
use crate::encoder::Encoder;
use crate::error::Result;

/// A value that can be written as one XML-RPC `<value>`.
pub trait Encode {
    fn encode(&self, enc: &mut Encoder) -> Result<()>;
}

/// A (wire-name, value) pair of a `Record`.
pub struct Field<'a> {
    pub name: &'a str,
    pub value: &'a dyn Encode,
}

impl<'a> Field<'a> {
    pub fn new(name: &'a str, value: &'a dyn Encode) -> Self {
        Self { name, value }
    }
}

/// A struct-like aggregate.
///
/// `fields` must return the fields in declaration order. The order is the
/// member order of a `<struct>` and the positional order of a parameter list.
/// Usually derived with `#[derive(Record)]`.
pub trait Record {
    fn fields(&self) -> Vec<Field<'_>>;
}

/// The custom-encode capability.
///
/// The returned bytes replace the whole `<value>…</value>` fragment verbatim and
/// must be UTF-8. Return `Error::marshal(..)` to fail the encode.
pub trait Marshal: std::fmt::Debug + Send + Sync {
    fn marshal(&self) -> Result<Vec<u8>>;
}

/// Adapts a `Marshal` type into an `Encode` one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Custom<T>(pub T);

impl<T: Marshal> Encode for Custom<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.marshal(&self.0)
    }
}

/// An opaque byte blob, encoded as `<base64>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self { Self(v) }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self { Self(v.to_vec()) }
}

impl From<&str> for Bytes {
    fn from(v: &str) -> Self { Self(v.as_bytes().to_vec()) }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

impl Encode for Bytes {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.base64(&self.0))
    }
}

// ============================================================================
//  SCALARS
// ============================================================================

/// Integers that widen losslessly into `i64`.
macro_rules! impl_encode_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder) -> Result<()> {
                    enc.value(|enc| enc.int(i64::from(*self)))
                }
            }
        )*
    };
}

impl_encode_int!(i8, i16, i32, i64, u16, u32);

impl Encode for isize {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.int(*self as i64))
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.double(f64::from(*self)))
    }
}

impl Encode for f64 {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.double(*self))
    }
}

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.boolean(*self))
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.string(self))
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        self.as_str().encode(enc)
    }
}

impl Encode for char {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        let mut buf = [0u8; 4];
        self.encode_utf8(&mut buf).encode(enc)
    }
}

impl Encode for NaiveDateTime {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.date_time(self))
    }
}

/// Zoned timestamps are written in their own local wall-clock time, without conversion.
impl<Tz: TimeZone> Encode for DateTime<Tz> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        self.naive_local().encode(enc)
    }
}

// ============================================================================
//  ABSENT
// ============================================================================

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        match self {
            Some(v) => v.encode(enc),
            None => enc.value(|enc| enc.nil()),
        }
    }
}

impl Encode for () {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| enc.nil())
    }
}

// ============================================================================
//  SEQUENCES
// ============================================================================

impl<T: Encode> Encode for [T] {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| codec::encode_sequence(enc, self))
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        self.as_slice().encode(enc)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        self.as_slice().encode(enc)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.value(|enc| codec::encode_iter(enc, self))
    }
}

// ============================================================================
//  RECORDS
// ============================================================================

/// Maps encode as structs, members in key order.
impl<K: AsRef<str>, V: Encode> Record for BTreeMap<K, V> {
    fn fields(&self) -> Vec<Field<'_>> {
        self.iter().map(|(k, v)| Field::new(k.as_ref(), v)).collect()
    }
}

impl<K: AsRef<str>, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        codec::encode_record_value(enc, self)
    }
}

/// The empty parameter list.
impl Record for () {
    fn fields(&self) -> Vec<Field<'_>> {
        Vec::new()
    }
}

/// Tuples as positional parameter lists, fields named by index.
macro_rules! impl_record_tuple {
    ($($idx:tt $ty:ident),+) => {
        impl<$($ty: Encode),+> Record for ($($ty,)+) {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![$(Field::new(stringify!($idx), &self.$idx)),+]
            }
        }
    };
}

impl_record_tuple!(0 A);
impl_record_tuple!(0 A, 1 B);
impl_record_tuple!(0 A, 1 B, 2 C);
impl_record_tuple!(0 A, 1 B, 2 C, 3 D);
impl_record_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_record_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_record_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_record_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);

// ============================================================================
//  POINTERS
// ============================================================================

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        (**self).encode(enc)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        (**self).encode(enc)
    }
}

impl<T: Encode + ?Sized> Encode for Rc<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        (**self).encode(enc)
    }
}

impl<T: Encode + ?Sized> Encode for Arc<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        (**self).encode(enc)
    }
}

impl<T: Encode + ToOwned + ?Sized> Encode for Cow<'_, T> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        (**self).encode(enc)
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn fields(&self) -> Vec<Field<'_>> {
        (**self).fields()
    }
}
