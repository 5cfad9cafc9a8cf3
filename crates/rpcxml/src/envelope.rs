//! # Envelopes
//!
//! `methodCall` and `methodResponse` documents.
//!
//! Parameters come from a `Record`: its fields, in declaration order, form the
//! positional parameter list. Field names are not written.
//!
//! ## Invariants
//! - One complete document per call: no prolog, no whitespace between elements.
//! - The method name is escaped with the same rule as `<string>` content.

use crate::encode::Record;
use crate::encoder::Encoder;
use crate::error::Result;

/// An outbound request.
pub struct MethodCall<'a, P: ?Sized> {
    pub method: &'a str,
    pub params: &'a P,
}

impl<'a, P: Record + ?Sized> MethodCall<'a, P> {
    pub fn new(method: &'a str, params: &'a P) -> Self {
        Self { method, params }
    }

    /// Encode this call into the encoder. The encoder must be at its root.
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.method_call_begin(self.method)?;
        encode_params(enc, self.params)?;
        enc.method_call_end()
    }

    pub fn encode_to_string(&self) -> Result<String> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        enc.into_string()
    }
}

/// An outbound (successful) response.
pub struct MethodResponse<'a, P: ?Sized> {
    pub params: &'a P,
}

impl<'a, P: Record + ?Sized> MethodResponse<'a, P> {
    pub fn new(params: &'a P) -> Self {
        Self { params }
    }

    /// Encode this response into the encoder. The encoder must be at its root.
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.method_response_begin()?;
        encode_params(enc, self.params)?;
        enc.method_response_end()
    }

    pub fn encode_to_string(&self) -> Result<String> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        enc.into_string()
    }
}

/// Builds a complete `<methodCall>` document.
///
/// # Errors
/// Only a failing `Marshal` implementation, at any depth, can make this fail.
pub fn encode_request<P: Record + ?Sized>(method: &str, params: &P) -> Result<String> {
    let doc = MethodCall::new(method, params).encode_to_string()?;
    tracing::debug!(method, len = doc.len(), "encoded method call");
    Ok(doc)
}

/// Builds a complete `<methodResponse>` document.
pub fn encode_response<P: Record + ?Sized>(params: &P) -> Result<String> {
    let doc = MethodResponse::new(params).encode_to_string()?;
    tracing::debug!(len = doc.len(), "encoded method response");
    Ok(doc)
}

fn encode_params<P: Record + ?Sized>(enc: &mut Encoder, params: &P) -> Result<()> {
    enc.params_begin()?;
    for field in params.fields() {
        enc.param_begin()?;
        field.value.encode(enc)?;
        enc.param_end()?;
    }
    enc.params_end()
}
