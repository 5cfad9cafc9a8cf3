//! # rpcxml
//!
//! A small, strict encoder from Rust values to XML-RPC markup.
//!
//! ## Philosophy
//!
//! - **Explicit categories**: the wire category of a value comes from its type (`Encode`)
//!   or from an explicit `Value` variant, never from inspecting its content.
//! - **Strict structure**: the `Encoder` tracks open elements as a scope stack and rejects
//!   writes that would break the XML-RPC grammar.
//! - **Pure**: encoding owns a local buffer, never mutates its input, and has no global state.
//!
//! ## Format
//!
//! | Category | Wire form |
//! |---|---|
//! | Integer | `<int>-12</int>` |
//! | Float | `<double>3.145926</double>` (six fractional digits) |
//! | Text | `<string>a &amp; b</string>` |
//! | Boolean | `<boolean>1</boolean>` |
//! | Binary | `<base64>eW91</base64>` |
//! | Timestamp | `<dateTime.iso8601>20120717T14:08:55</dateTime.iso8601>` |
//! | Sequence | `<array><data>…</data></array>` |
//! | Record | `<struct><member><name>N</name>…</member></struct>` |
//! | Absent | `<nil/>` |
//!
//! Each of these is wrapped in one `<value>…</value>`. A `Marshal` type replaces the
//! whole wrapped fragment with its own output.
//!
//! ```ignore
//! #[derive(rpcxml::Record)]
//! struct Add {
//!     #[rpc(rename = "lhs")]
//!     a: i32,
//!     b: i32,
//! }
//!
//! let xml = rpcxml::encode_request("math.add", &Add { a: 1, b: 2 })?;
//! ```

pub mod codec;
pub mod encode;
pub mod encoder;
pub mod envelope;
pub mod error;
pub mod value;

#[cfg(test)]
mod tests;

pub use error::Error;
pub use error::Result;

pub use encoder::Encoder;
pub use encoder::Item;
pub use encoder::Scope;
pub use encoder::escape;

pub use encode::Bytes;
pub use encode::Custom;
pub use encode::Encode;
pub use encode::Field;
pub use encode::Marshal;
pub use encode::Record;

pub use value::Struct;
pub use value::Value;

pub use codec::to_string;

pub use envelope::MethodCall;
pub use envelope::MethodResponse;
pub use envelope::encode_request;
pub use envelope::encode_response;

#[cfg(feature = "derive")]
pub use rpcxml_derive::Record;
