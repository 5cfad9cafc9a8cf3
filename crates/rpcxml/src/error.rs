//! # Error Definitions
//!
//! Built-in encoding is total over its accepted inputs. The only failure a
//! well-formed call can produce is a `Marshal` implementation reporting one;
//! the structural variants exist to reject misuse of the low-level `Encoder`.

use crate::encoder::Item;
use crate::encoder::Scope;

/// rpcxml encoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A custom `Marshal` implementation reported a failure.
    Marshal(String),
    /// A custom `Marshal` implementation produced bytes that are not UTF-8.
    InvalidUtf8,
    /// Closing a scope that does not match the active scope stack.
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Attempted to close a scope when only the Root remains.
    ScopeUnderflow,
    /// Attempted to finalize the document with open scopes.
    ScopeStillOpen,
    /// Structural Violation: Attempted to write >1 item into a strict scope (Value/Member/Param/envelope).
    TooManyItems(Scope),
    /// Structural Violation: Attempted to close a strict scope without its single item.
    EmptyScope(Scope),
    /// Structural Violation: The item kind is not allowed as a direct child of the scope.
    UnexpectedItem { scope: Scope, item: Item },
    /// Writing formatted output into the buffer failed.
    Format,
}

impl Error {
    /// Builds the error a `Marshal` implementation returns to signal failure.
    pub fn marshal(msg: impl Into<String>) -> Self {
        Error::Marshal(msg.into())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Marshal(msg) => write!(f, "custom marshal failed: {}", msg),
            Error::InvalidUtf8 => write!(f, "custom marshal produced invalid UTF-8"),
            Error::ScopeMismatch { expected, actual } => {
                write!(f, "Scope Mismatch: expected {:?}, found {:?}", expected, actual)
            }
            Error::TooManyItems(s) => write!(f, "Too many items in scope {:?}; expected exactly 1", s),
            Error::EmptyScope(s) => write!(f, "Empty scope {:?}; expected exactly 1 item", s),
            Error::UnexpectedItem { scope, item } => {
                write!(f, "{:?} is not allowed inside scope {:?}", item, scope)
            }
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self { Self::Format }
}

/// Specialized `Result` for rpcxml operations.
pub type Result<T> = std::result::Result<T, Error>;
