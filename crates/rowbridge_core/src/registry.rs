//! Host-visible kinds and their operation tables.
//!
//! Two kinds cross the boundary: `Session` and `Row`. Each is described by a
//! static [`KindDescriptor`] listing its methods, its generic-index operation
//! and its read-only properties. The host adapter installs them through
//! [`init`], which registers `Row` before `Session` so a row kind always
//! exists by the time a session can produce rows.

use crate::error::{BridgeError, BridgeResult};
use crate::marshal::IndexBase;
use std::fmt;

/// A native object kind exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Database session.
    Session,
    /// Query-result row.
    Row,
}

impl Kind {
    /// Returns the host-visible name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Session => "Session",
            Kind::Row => "Row",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of an operation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Host-visible name.
    pub name: &'static str,
    /// Number of arguments after the receiver.
    pub arity: usize,
    /// Index convention, for accessors that take a column index.
    pub index_base: Option<IndexBase>,
}

impl Operation {
    /// Creates a method entry.
    #[must_use]
    pub const fn method(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            arity,
            index_base: None,
        }
    }

    /// Marks the operation as an indexed accessor.
    #[must_use]
    pub const fn indexed(mut self, base: IndexBase) -> Self {
        self.index_base = Some(base);
        self
    }

    /// Converts a host index into the native 0-based index for this
    /// operation.
    #[must_use]
    pub const fn native_index(&self, index: i64) -> i64 {
        match self.index_base {
            Some(base) => base.to_native(index),
            None => index,
        }
    }
}

/// `Session(...)` constructor.
pub const SESSION_NEW: Operation = Operation::method("Session", 1);
/// Accepted constructor argument counts.
pub const SESSION_NEW_ARITIES: &[usize] = &[1, 4];
/// `Session.sql(query)`.
pub const SESSION_SQL: Operation = Operation::method("sql", 1);

/// `Row.get(index)`, 1-based.
pub const ROW_GET: Operation = Operation::method("get", 1).indexed(IndexBase::One);
/// `Row[index]`, 1-based alias of `get`.
pub const ROW_INDEX: Operation = Operation::method("__index", 1).indexed(IndexBase::One);
/// `Row.type(index)`, 0-based.
pub const ROW_TYPE: Operation = Operation::method("type", 1).indexed(IndexBase::Zero);
/// `Row.elementCount(index)`, 0-based.
pub const ROW_ELEMENT_COUNT: Operation =
    Operation::method("elementCount", 1).indexed(IndexBase::Zero);
/// `Row.at(index, subindex)`, both 0-based.
pub const ROW_AT: Operation = Operation::method("at", 2).indexed(IndexBase::Zero);
/// `Row.colCount`, read-only.
pub const ROW_COL_COUNT: Operation = Operation::method("colCount", 0);

/// Describes one host-visible kind.
#[derive(Debug, PartialEq, Eq)]
pub struct KindDescriptor {
    /// The kind.
    pub kind: Kind,
    /// Accepted constructor argument counts; `None` when the host cannot
    /// construct instances.
    pub constructor: Option<&'static [usize]>,
    /// Named methods.
    pub methods: &'static [Operation],
    /// Generic-index operation.
    pub index: Option<Operation>,
    /// Read-only computed properties.
    pub properties: &'static [Operation],
}

impl KindDescriptor {
    /// Returns the host-visible name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Operation> {
        self.methods.iter().find(|op| op.name == name)
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Operation> {
        self.properties.iter().find(|op| op.name == name)
    }

    /// Checks that a constructor call has an accepted argument count.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ArgumentCount`] for any other count.
    pub fn check_constructor_arity(&self, actual: usize) -> BridgeResult<()> {
        let accepted = self.constructor.unwrap_or(&[]);
        if accepted.contains(&actual) {
            return Ok(());
        }
        let expected = accepted
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(BridgeError::argument_count(expected, actual))
    }

    /// Checks that a receiver belongs to this kind.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TypeMismatch`] otherwise.
    pub fn check_receiver(&self, operation: &'static str, found: Kind) -> BridgeResult<()> {
        if found == self.kind {
            Ok(())
        } else {
            Err(BridgeError::type_mismatch(operation, self.kind, found))
        }
    }
}

/// The `Session` kind.
pub static SESSION: KindDescriptor = KindDescriptor {
    kind: Kind::Session,
    constructor: Some(SESSION_NEW_ARITIES),
    methods: &[SESSION_SQL],
    index: None,
    properties: &[],
};

/// The `Row` kind.
pub static ROW: KindDescriptor = KindDescriptor {
    kind: Kind::Row,
    constructor: None,
    methods: &[ROW_GET, ROW_TYPE, ROW_ELEMENT_COUNT, ROW_AT],
    index: Some(ROW_INDEX),
    properties: &[ROW_COL_COUNT],
};

/// Returns every kind in registration order.
#[must_use]
pub fn kinds() -> [&'static KindDescriptor; 2] {
    [&ROW, &SESSION]
}

/// Returns the descriptor of a kind.
#[must_use]
pub fn descriptor(kind: Kind) -> &'static KindDescriptor {
    match kind {
        Kind::Session => &SESSION,
        Kind::Row => &ROW,
    }
}

/// The host's kind-registration primitive.
pub trait HostRegistry {
    /// Host error type.
    type Error: From<BridgeError>;

    /// Returns true if the kind is already installed.
    fn is_registered(&self, kind: Kind) -> bool;

    /// Installs a kind.
    ///
    /// # Errors
    ///
    /// Returns the host's error if installation fails.
    fn register_kind(&mut self, descriptor: &'static KindDescriptor) -> Result<(), Self::Error>;
}

/// Registers both kinds with a host registry, `Row` first.
///
/// Call once per registry, from the embedding code.
///
/// # Errors
///
/// Returns [`BridgeError::AlreadyRegistered`] if the registry already holds
/// either kind, or the host's own registration error.
pub fn init<R: HostRegistry>(registry: &mut R) -> Result<(), R::Error> {
    for descriptor in kinds() {
        if registry.is_registered(descriptor.kind) {
            return Err(BridgeError::AlreadyRegistered {
                kind: descriptor.kind,
            }
            .into());
        }
        registry.register_kind(descriptor)?;
        tracing::debug!(kind = descriptor.name(), "registered kind");
    }
    Ok(())
}

/// A plain registry that records installed kinds.
#[derive(Debug, Default)]
pub struct KindTable {
    registered: Vec<&'static KindDescriptor>,
}

impl KindTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor of an installed kind.
    #[must_use]
    pub fn get(&self, kind: Kind) -> Option<&'static KindDescriptor> {
        self.registered.iter().copied().find(|d| d.kind == kind)
    }

    /// Returns the descriptor of an installed kind.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotRegistered`] if the kind is missing.
    pub fn require(&self, kind: Kind) -> BridgeResult<&'static KindDescriptor> {
        self.get(kind).ok_or(BridgeError::NotRegistered { kind })
    }

    /// Returns the installed kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static KindDescriptor> + '_ {
        self.registered.iter().copied()
    }
}

impl HostRegistry for KindTable {
    type Error = BridgeError;

    fn is_registered(&self, kind: Kind) -> bool {
        self.get(kind).is_some()
    }

    fn register_kind(&mut self, descriptor: &'static KindDescriptor) -> BridgeResult<()> {
        if self.is_registered(descriptor.kind) {
            return Err(BridgeError::AlreadyRegistered {
                kind: descriptor.kind,
            });
        }
        self.registered.push(descriptor);
        Ok(())
    }
}
