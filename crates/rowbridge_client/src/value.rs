//! Tagged cell values.

use crate::error::{ClientError, ClientResult};
use std::fmt;

/// Type tag of a [`NativeValue`].
///
/// The numeric codes match the client library's value-type enumeration and
/// are what `Row.type()` reports to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    /// SQL NULL.
    Null = 0,
    /// Unsigned 64-bit integer.
    UInt64 = 1,
    /// Signed 64-bit integer.
    Int64 = 2,
    /// Single-precision float.
    Float = 3,
    /// Double-precision float.
    Double = 4,
    /// Boolean.
    Bool = 5,
    /// Byte string (usually UTF-8 text).
    String = 6,
    /// Document with named fields.
    Document = 7,
    /// Raw bytes the client did not decode.
    Raw = 8,
    /// Array of values.
    Array = 9,
}

impl TypeTag {
    /// All tags, ordered by code.
    pub const ALL: [TypeTag; 10] = [
        TypeTag::Null,
        TypeTag::UInt64,
        TypeTag::Int64,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::Bool,
        TypeTag::String,
        TypeTag::Document,
        TypeTag::Raw,
        TypeTag::Array,
    ];

    /// Returns the integer code reported to the host.
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }

    /// Looks a tag up by its integer code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Returns the tag's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Null => "NULL",
            TypeTag::UInt64 => "UINT64",
            TypeTag::Int64 => "INT64",
            TypeTag::Float => "FLOAT",
            TypeTag::Double => "DOUBLE",
            TypeTag::Bool => "BOOL",
            TypeTag::String => "STRING",
            TypeTag::Document => "DOCUMENT",
            TypeTag::Raw => "RAW",
            TypeTag::Array => "ARRAY",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One column's value within a row.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// SQL NULL.
    Null,
    /// Unsigned integer.
    UInt64(u64),
    /// Signed integer.
    Int64(i64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Boolean.
    Bool(bool),
    /// Byte string. Not guaranteed to be UTF-8 and may contain NUL bytes.
    String(Vec<u8>),
    /// Document fields in server order.
    Document(Vec<(String, NativeValue)>),
    /// Undecoded bytes (temporal types, blobs, geometry).
    Raw(Vec<u8>),
    /// Array of values.
    Array(Vec<NativeValue>),
}

impl NativeValue {
    /// Returns the value's type tag.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            NativeValue::Null => TypeTag::Null,
            NativeValue::UInt64(_) => TypeTag::UInt64,
            NativeValue::Int64(_) => TypeTag::Int64,
            NativeValue::Float(_) => TypeTag::Float,
            NativeValue::Double(_) => TypeTag::Double,
            NativeValue::Bool(_) => TypeTag::Bool,
            NativeValue::String(_) => TypeTag::String,
            NativeValue::Document(_) => TypeTag::Document,
            NativeValue::Raw(_) => TypeTag::Raw,
            NativeValue::Array(_) => TypeTag::Array,
        }
    }

    /// Returns true for SQL NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Number of sub-elements.
    ///
    /// Arrays report their length and documents their field count. NULL has
    /// no elements; every other scalar counts as a single element.
    #[must_use]
    pub fn element_count(&self) -> usize {
        match self {
            NativeValue::Array(items) => items.len(),
            NativeValue::Document(fields) => fields.len(),
            NativeValue::Null => 0,
            _ => 1,
        }
    }

    /// Returns the sub-element at a 0-based index.
    ///
    /// A scalar is its own element 0. Document fields are addressed in
    /// server order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ElementOutOfRange`] when `index` is negative or
    /// not below [`element_count`](Self::element_count).
    pub fn element(&self, index: i64) -> ClientResult<&NativeValue> {
        let count = self.element_count();
        let out_of_range = || ClientError::ElementOutOfRange { index, count };
        let i = usize::try_from(index).map_err(|_| out_of_range())?;

        match self {
            NativeValue::Array(items) => items.get(i).ok_or_else(out_of_range),
            NativeValue::Document(fields) => {
                fields.get(i).map(|(_, v)| v).ok_or_else(out_of_range)
            }
            _ if i < count => Ok(self),
            _ => Err(out_of_range()),
        }
    }

    /// Looks up a document field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&NativeValue> {
        match self {
            NativeValue::Document(fields) => {
                fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.as_bytes().to_vec())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        NativeValue::String(value.into_bytes())
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        NativeValue::Int64(value)
    }
}

impl From<u64> for NativeValue {
    fn from(value: u64) -> Self {
        NativeValue::UInt64(value)
    }
}

impl From<f32> for NativeValue {
    fn from(value: f32) -> Self {
        NativeValue::Float(value)
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Double(value)
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Bool(value)
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(NativeValue::Null, Into::into)
    }
}
