//! Value marshaling between the client library and the host.
//!
//! Native → host goes through [`marshal`], the single conversion table every
//! accessor uses. Host → native covers query text (passed through as an
//! opaque string), positional arguments ([`HostArg`]) and index basing
//! ([`IndexBase`]).

use crate::error::{BridgeError, BridgeResult};
use rowbridge_client::NativeValue;

/// Largest integer magnitude an IEEE-754 double represents exactly (2^53).
pub const MAX_SAFE_INTEGER: u64 = 1 << 53;

/// A cell value in host-ready form.
///
/// `Null` is absence: it stands for SQL NULL, an out-of-range `get` and any
/// tag the marshaler does not convert. It is distinct from present falsy
/// values such as `Int(0)`, `Bool(false)` or an empty `Str`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// No value.
    Null,
    /// Byte string, copied verbatim.
    Str(Vec<u8>),
    /// Unsigned integer.
    UInt(u64),
    /// Signed integer.
    Int(i64),
    /// Single-precision float.
    F32(f32),
    /// Double-precision float.
    F64(f64),
    /// Boolean.
    Bool(bool),
}

impl ScalarValue {
    /// Returns true for absence.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Returns the string as UTF-8, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Returns a float widened to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::F32(f) => Some(f64::from(*f)),
            ScalarValue::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns true for integers a double-based host cannot hold exactly.
    #[must_use]
    pub fn exceeds_safe_integer(&self) -> bool {
        match self {
            ScalarValue::UInt(n) => *n > MAX_SAFE_INTEGER,
            ScalarValue::Int(n) => n.unsigned_abs() > MAX_SAFE_INTEGER,
            _ => false,
        }
    }
}

/// Converts one native cell into its host form.
///
/// Documents, arrays and raw bytes have no scalar form and marshal to
/// absence, the same as NULL.
#[must_use]
pub fn marshal(value: &NativeValue) -> ScalarValue {
    match value {
        NativeValue::Null => ScalarValue::Null,
        NativeValue::String(bytes) => ScalarValue::Str(bytes.clone()),
        NativeValue::UInt64(n) => ScalarValue::UInt(*n),
        NativeValue::Int64(n) => ScalarValue::Int(*n),
        NativeValue::Float(f) => ScalarValue::F32(*f),
        NativeValue::Double(f) => ScalarValue::F64(*f),
        NativeValue::Bool(b) => ScalarValue::Bool(*b),
        NativeValue::Document(_) | NativeValue::Raw(_) | NativeValue::Array(_) => {
            ScalarValue::Null
        }
    }
}

/// A positional argument received from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostArg {
    /// The host's nil/None.
    Nil,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Text string.
    Str(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Any other host type, by name.
    Other(String),
}

impl HostArg {
    /// Returns the host type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            HostArg::Nil => "nil",
            HostArg::Bool(_) => "boolean",
            HostArg::Int(_) => "integer",
            HostArg::Float(_) => "number",
            HostArg::Str(_) => "string",
            HostArg::Bytes(_) => "bytes",
            HostArg::Other(name) => name,
        }
    }

    /// Stands in for a host string that has no UTF-8 form.
    #[must_use]
    pub fn non_utf8_string() -> Self {
        HostArg::Other("non-UTF-8 string".into())
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            HostArg::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostArg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for HostArg {
    fn from(value: &str) -> Self {
        HostArg::Str(value.to_string())
    }
}

impl From<String> for HostArg {
    fn from(value: String) -> Self {
        HostArg::Str(value)
    }
}

impl From<i64> for HostArg {
    fn from(value: i64) -> Self {
        HostArg::Int(value)
    }
}

/// Requires a string argument.
///
/// # Errors
///
/// Returns [`BridgeError::ArgumentType`] for any other host type.
pub fn expect_string<'a>(
    operation: &'static str,
    position: usize,
    arg: &'a HostArg,
) -> BridgeResult<&'a str> {
    arg.as_str()
        .ok_or_else(|| BridgeError::argument_type(operation, position, "string", arg.type_name()))
}

/// Requires an integer argument.
///
/// # Errors
///
/// Returns [`BridgeError::ArgumentType`] for any other host type.
pub fn expect_integer(operation: &'static str, position: usize, arg: &HostArg) -> BridgeResult<i64> {
    arg.as_integer()
        .ok_or_else(|| BridgeError::argument_type(operation, position, "integer", arg.type_name()))
}

/// Index convention of an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexBase {
    /// Host index is the native index.
    Zero,
    /// Host index 1 is native index 0.
    One,
}

impl IndexBase {
    /// Converts a host index into a native 0-based index.
    ///
    /// The result may be negative; accessors treat that as out of range.
    #[must_use]
    pub const fn to_native(self, index: i64) -> i64 {
        match self {
            IndexBase::Zero => index,
            IndexBase::One => index.saturating_sub(1),
        }
    }
}
