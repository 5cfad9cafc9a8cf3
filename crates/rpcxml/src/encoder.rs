//! # Encoder
//!
//! A bounded, state-machine driven writer for XML-RPC markup.
//!
//! The Encoder owns a growable `String` buffer and a stack of open scopes. Every
//! write is validated against the innermost scope, so the low-level API cannot
//! produce markup that violates the XML-RPC element grammar:
//!
//! | Scope | Allowed children |
//! |---|---|
//! | `Root` | anything |
//! | `Value` | exactly one payload (scalar, `nil`, array, struct) |
//! | `Array` | any number of values |
//! | `Struct` | any number of members |
//! | `Member` | exactly one value, after the name |
//! | `MethodCall`, `MethodResponse` | exactly one `params` |
//! | `Params` | any number of params |
//! | `Param` | exactly one value |

use std::borrow::Cow;
use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Datelike;
use chrono::NaiveDateTime;
use chrono::Timelike;

use crate::encode::Marshal;
use crate::error::Error;
use crate::error::Result;

/// An open element on the `Encoder` stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The virtual root; allows any item.
    Root,
    /// `<value>`; strictly one payload.
    Value,
    /// `<array><data>`; any number of values.
    Array,
    /// `<struct>`; any number of members.
    Struct,
    /// `<member>`; strictly one value after the name.
    Member,
    /// `<methodCall>`; strictly one params list after the method name.
    MethodCall,
    /// `<methodResponse>`; strictly one params list.
    MethodResponse,
    /// `<params>`; any number of params.
    Params,
    /// `<param>`; strictly one value.
    Param,
}

impl Scope {
    fn close_tag(self) -> &'static str {
        match self {
            Scope::Root => "",
            Scope::Value => "</value>",
            Scope::Array => "</data></array>",
            Scope::Struct => "</struct>",
            Scope::Member => "</member>",
            Scope::MethodCall => "</methodCall>",
            Scope::MethodResponse => "</methodResponse>",
            Scope::Params => "</params>",
            Scope::Param => "</param>",
        }
    }

    /// Strict scopes hold exactly one item.
    fn is_strict(self) -> bool {
        matches!(
            self,
            Scope::Value | Scope::Member | Scope::Param | Scope::MethodCall | Scope::MethodResponse
        )
    }

    fn allows(self, item: Item) -> bool {
        match self {
            Scope::Root => true,
            Scope::Value => item == Item::Payload,
            Scope::Array | Scope::Member | Scope::Param => item == Item::Value,
            Scope::Struct => item == Item::Member,
            Scope::MethodCall | Scope::MethodResponse => item == Item::Params,
            Scope::Params => item == Item::Param,
        }
    }
}

/// The kind of element being written, checked against the enclosing `Scope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    /// A `<value>` element, or a custom fragment standing in for one.
    Value,
    /// The content of a `<value>`: a tagged scalar, `<nil/>`, `<array>` or `<struct>`.
    Payload,
    Member,
    Params,
    Param,
    /// `<methodCall>` or `<methodResponse>`.
    Envelope,
}

struct Frame {
    scope: Scope,
    count: usize,
}

/// A growable buffer that encodes values into XML-RPC markup.
///
/// Each encode call owns its own `Encoder`; nothing is shared or pooled.
pub struct Encoder {
    buf: String,
    /// Open scopes above the root. Empty means `Scope::Root`.
    stack: Vec<Frame>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Creates a new encoder with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: String::with_capacity(cap),
            stack: Vec::with_capacity(8),
        }
    }

    /// Consumes the encoder and returns the finished markup.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if any scope is open.
    pub fn into_string(self) -> Result<String> {
        if !self.stack.is_empty() {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    /// Returns a view of the current markup.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if any scope is open.
    pub fn as_str(&self) -> Result<&str> {
        if !self.stack.is_empty() {
            return Err(Error::ScopeStillOpen);
        }
        Ok(&self.buf)
    }

    /// The innermost open scope.
    pub fn scope(&self) -> Scope {
        self.stack.last().map_or(Scope::Root, |frame| frame.scope)
    }

    fn check_write(&self, item: Item) -> Result<()> {
        let Some(frame) = self.stack.last() else {
            return Ok(());
        };
        if !frame.scope.allows(item) {
            return Err(Error::UnexpectedItem { scope: frame.scope, item });
        }
        if frame.scope.is_strict() && frame.count >= 1 {
            return Err(Error::TooManyItems(frame.scope));
        }
        Ok(())
    }

    fn on_item_written(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            frame.count += 1;
        }
    }

    fn begin_scope(&mut self, item: Item, scope: Scope, open: &str) -> Result<()> {
        self.check_write(item)?;
        self.buf.push_str(open);
        self.stack.push(Frame { scope, count: 0 });
        Ok(())
    }

    fn end_scope(&mut self, expected: Scope) -> Result<()> {
        let Some(frame) = self.stack.last() else {
            return Err(Error::ScopeUnderflow);
        };
        if frame.scope != expected {
            return Err(Error::ScopeMismatch { expected, actual: frame.scope });
        }
        if frame.scope.is_strict() && frame.count == 0 {
            return Err(Error::EmptyScope(frame.scope));
        }

        self.stack.pop();
        self.buf.push_str(expected.close_tag());
        self.on_item_written();
        Ok(())
    }

    /// Writes `<tag>body</tag>` as the payload of the open value.
    fn tagged<F>(&mut self, tag: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut String) -> Result<()>,
    {
        self.check_write(Item::Payload)?;
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        body(&mut self.buf)?;
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
        self.on_item_written();
        Ok(())
    }

    /// Encodes `<int>`: signed base-10.
    pub fn int(&mut self, v: i64) -> Result<()> {
        self.tagged("int", |buf| Ok(write!(buf, "{}", v)?))
    }

    /// Encodes `<double>`: fixed-point with six fractional digits.
    pub fn double(&mut self, v: f64) -> Result<()> {
        self.tagged("double", |buf| Ok(write!(buf, "{:.6}", v)?))
    }

    /// Encodes `<string>` with `&`, `"`, `<` and `>` escaped.
    pub fn string(&mut self, v: &str) -> Result<()> {
        self.tagged("string", |buf| {
            write_escaped(buf, v);
            Ok(())
        })
    }

    /// Encodes `<boolean>` as `1` or `0`.
    pub fn boolean(&mut self, v: bool) -> Result<()> {
        self.tagged("boolean", |buf| {
            buf.push(if v { '1' } else { '0' });
            Ok(())
        })
    }

    /// Encodes `<base64>` using the standard padded alphabet.
    pub fn base64(&mut self, v: &[u8]) -> Result<()> {
        self.tagged("base64", |buf| {
            STANDARD.encode_string(v, buf);
            Ok(())
        })
    }

    /// Encodes `<dateTime.iso8601>` as `YYYYMMDDTHH:MM:SS`.
    ///
    /// The wall-clock fields are written as given; no zone is appended and none is applied.
    pub fn date_time(&mut self, v: &NaiveDateTime) -> Result<()> {
        self.tagged("dateTime.iso8601", |buf| {
            write!(
                buf,
                "{:04}{:02}{:02}T{:02}:{:02}:{:02}",
                v.year(),
                v.month(),
                v.day(),
                v.hour(),
                v.minute(),
                v.second()
            )?;
            Ok(())
        })
    }

    /// Encodes the absent marker `<nil/>`.
    pub fn nil(&mut self) -> Result<()> {
        self.check_write(Item::Payload)?;
        self.buf.push_str("<nil/>");
        self.on_item_written();
        Ok(())
    }

    /// Begins a `<value>` wrapper.
    ///
    /// # Invariants
    /// - Must be closed via `value_end()`.
    /// - **Strict:** Requires exactly one payload.
    pub fn value_begin(&mut self) -> Result<()> { self.begin_scope(Item::Value, Scope::Value, "<value>") }
    /// Ends a `<value>` wrapper.
    pub fn value_end(&mut self) -> Result<()> { self.end_scope(Scope::Value) }

    /// Writes one `<value>` whose payload is produced by `f`.
    pub fn value<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.value_begin()?;
        f(self)?;
        self.value_end()
    }

    /// Begins an `<array><data>` container. Allows any number of values.
    pub fn array_begin(&mut self) -> Result<()> { self.begin_scope(Item::Payload, Scope::Array, "<array><data>") }
    /// Ends an array container.
    pub fn array_end(&mut self) -> Result<()> { self.end_scope(Scope::Array) }

    /// Begins a `<struct>` container.
    ///
    /// # Invariants
    /// - **Strict:** Only `member_begin()` is allowed as a direct child.
    pub fn struct_begin(&mut self) -> Result<()> { self.begin_scope(Item::Payload, Scope::Struct, "<struct>") }
    /// Ends a `<struct>` container.
    pub fn struct_end(&mut self) -> Result<()> { self.end_scope(Scope::Struct) }

    /// Begins a `<member>` and writes its escaped `<name>`.
    ///
    /// # Invariants
    /// - **Strict:** Requires exactly one value after this call.
    pub fn member_begin(&mut self, name: &str) -> Result<()> {
        self.begin_scope(Item::Member, Scope::Member, "<member><name>")?;
        write_escaped(&mut self.buf, name);
        self.buf.push_str("</name>");
        Ok(())
    }
    /// Ends a `<member>`.
    pub fn member_end(&mut self) -> Result<()> { self.end_scope(Scope::Member) }

    /// Begins `<methodCall>` and writes the escaped `<methodName>`.
    ///
    /// Only allowed at the root.
    pub fn method_call_begin(&mut self, method: &str) -> Result<()> {
        self.begin_scope(Item::Envelope, Scope::MethodCall, "<methodCall><methodName>")?;
        write_escaped(&mut self.buf, method);
        self.buf.push_str("</methodName>");
        Ok(())
    }
    /// Ends `<methodCall>`.
    pub fn method_call_end(&mut self) -> Result<()> { self.end_scope(Scope::MethodCall) }

    /// Begins `<methodResponse>`. Only allowed at the root.
    pub fn method_response_begin(&mut self) -> Result<()> {
        self.begin_scope(Item::Envelope, Scope::MethodResponse, "<methodResponse>")
    }
    /// Ends `<methodResponse>`.
    pub fn method_response_end(&mut self) -> Result<()> { self.end_scope(Scope::MethodResponse) }

    /// Begins a `<params>` list.
    pub fn params_begin(&mut self) -> Result<()> { self.begin_scope(Item::Params, Scope::Params, "<params>") }
    /// Ends a `<params>` list.
    pub fn params_end(&mut self) -> Result<()> { self.end_scope(Scope::Params) }

    /// Begins a `<param>`. **Strict:** requires exactly one value.
    pub fn param_begin(&mut self) -> Result<()> { self.begin_scope(Item::Param, Scope::Param, "<param>") }
    /// Ends a `<param>`.
    pub fn param_end(&mut self) -> Result<()> { self.end_scope(Scope::Param) }

    /// Inserts the output of a custom `Marshal` verbatim, in place of a whole `<value>`.
    ///
    /// # Errors
    /// Propagates the marshal failure, or `Error::InvalidUtf8` if the bytes are not UTF-8.
    /// Nothing is written on failure.
    pub fn marshal<M: Marshal + ?Sized>(&mut self, custom: &M) -> Result<()> {
        self.check_write(Item::Value)?;

        let bytes = custom.marshal().inspect_err(|e| {
            tracing::debug!(error = %e, "custom marshal failed");
        })?;
        let fragment = String::from_utf8(bytes).map_err(|e| {
            tracing::debug!(valid_up_to = e.utf8_error().valid_up_to(), "custom marshal produced invalid utf-8");
            Error::InvalidUtf8
        })?;

        tracing::trace!(len = fragment.len(), "inserting custom value fragment");
        self.buf.push_str(&fragment);
        self.on_item_written();
        Ok(())
    }
}

/// Escapes `&`, `"`, `<` and `>` for inclusion in markup. All other characters pass through.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '"', '<', '>']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    write_escaped(&mut out, s);
    Cow::Owned(out)
}

// Single pass, so a replacement is never itself rescanned.
fn write_escaped(buf: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '"' => buf.push_str("&quot;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            _ => buf.push(c),
        }
    }
}
