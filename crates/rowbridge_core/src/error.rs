//! Error types for the binding layer.

use crate::registry::Kind;
use rowbridge_client::ClientError;
use thiserror::Error;

/// Result type for binding operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Host exception family an error is raised as.
///
/// Adapters map each class onto one host exception type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostErrorClass {
    /// Wrong constructor arity. A subclass of the host's type error.
    ArgumentCount,
    /// The host's type error.
    Type,
    /// Use of a released object.
    Reference,
    /// The host's generic runtime error.
    Runtime,
    /// Client-library failure. A subclass of the host's runtime error.
    NativeExecution,
}

/// Errors raised at the host/native boundary.
///
/// Every variant is raised synchronously at its detection site and aborts
/// the current host call. Only message text crosses to the host; callers
/// that need to branch on the failure class use the variant.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A constructor received the wrong number of positional arguments.
    #[error("invalid number of arguments: expected {expected}, got {actual}")]
    ArgumentCount {
        /// Accepted counts, for example `1 or 4`.
        expected: String,
        /// Count received.
        actual: usize,
    },

    /// An argument had the wrong host type.
    #[error("bad argument #{position} to '{operation}' ({expected} expected, got {found})")]
    ArgumentType {
        /// Operation being called.
        operation: &'static str,
        /// 1-based argument position.
        position: usize,
        /// Expected host type.
        expected: &'static str,
        /// Host type received.
        found: String,
    },

    /// An operation was invoked on a receiver of another kind.
    #[error("calling '{operation}' on bad self ({expected} expected, got {found})")]
    TypeMismatch {
        /// Operation being called.
        operation: &'static str,
        /// Kind the operation belongs to.
        expected: Kind,
        /// Kind of the receiver.
        found: Kind,
    },

    /// The receiver's native resource has already been released.
    #[error("{kind} has already been released")]
    Released {
        /// Kind of the released receiver.
        kind: Kind,
    },

    /// A kind was registered twice with the same host registry.
    #[error("kind '{kind}' is already registered")]
    AlreadyRegistered {
        /// The duplicated kind.
        kind: Kind,
    },

    /// An instance of a kind was requested before the kind was registered.
    #[error("kind '{kind}' is not registered")]
    NotRegistered {
        /// The missing kind.
        kind: Kind,
    },

    /// The client library reported a failure. Renders the native message
    /// unchanged.
    #[error(transparent)]
    Native(#[from] ClientError),

    /// The client library panicked.
    #[error("{message}")]
    NativePanic {
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl BridgeError {
    /// Creates an argument count error.
    pub fn argument_count(expected: impl Into<String>, actual: usize) -> Self {
        Self::ArgumentCount {
            expected: expected.into(),
            actual,
        }
    }

    /// Creates an argument type error.
    pub fn argument_type(
        operation: &'static str,
        position: usize,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::ArgumentType {
            operation,
            position,
            expected,
            found: found.into(),
        }
    }

    /// Creates a receiver type mismatch error.
    pub fn type_mismatch(operation: &'static str, expected: Kind, found: Kind) -> Self {
        Self::TypeMismatch {
            operation,
            expected,
            found,
        }
    }

    /// Returns true when the failure came from the client library.
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_) | Self::NativePanic { .. })
    }

    /// Returns the host exception family for this error.
    #[must_use]
    pub fn host_class(&self) -> HostErrorClass {
        match self {
            Self::ArgumentCount { .. } => HostErrorClass::ArgumentCount,
            Self::ArgumentType { .. } | Self::TypeMismatch { .. } => HostErrorClass::Type,
            Self::Released { .. } => HostErrorClass::Reference,
            Self::AlreadyRegistered { .. } | Self::NotRegistered { .. } => HostErrorClass::Runtime,
            Self::Native(_) | Self::NativePanic { .. } => HostErrorClass::NativeExecution,
        }
    }
}
