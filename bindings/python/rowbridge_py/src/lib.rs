//! Python bindings for rowbridge.
//!
//! This crate provides the `rowbridge` extension module using PyO3. It
//! installs the `Session` and `Row` classes and translates bridge errors
//! into Python exceptions.

use pyo3::create_exception;
use pyo3::exceptions::{PyReferenceError, PyRuntimeError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyFloat, PyInt, PyList, PyString, PyTuple};
use pyo3::IntoPyObjectExt;
use rowbridge_core::{
    Bridge, BridgeError, HostArg, HostErrorClass, HostRegistry, Kind, KindDescriptor, RowWrapper,
    ScalarValue, SessionWrapper, StandardConnector,
};
use std::sync::OnceLock;

/// Library version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

create_exception!(
    rowbridge,
    ArgumentCountError,
    PyTypeError,
    "Wrong number of constructor arguments."
);
create_exception!(
    rowbridge,
    NativeExecutionError,
    PyRuntimeError,
    "The database client reported a failure."
);

static BRIDGE: OnceLock<Bridge> = OnceLock::new();

/// Error returned from Python-visible methods.
#[derive(Debug)]
pub enum Error {
    /// Raised by the binding layer.
    Bridge(BridgeError),
    /// Raised by Python itself.
    Python(PyErr),
}

impl From<BridgeError> for Error {
    fn from(err: BridgeError) -> Self {
        Error::Bridge(err)
    }
}

impl From<PyErr> for Error {
    fn from(err: PyErr) -> Self {
        Error::Python(err)
    }
}

impl From<Error> for PyErr {
    fn from(err: Error) -> Self {
        let err = match err {
            Error::Python(err) => return err,
            Error::Bridge(err) => err,
        };
        let message = err.to_string();
        match err.host_class() {
            HostErrorClass::ArgumentCount => ArgumentCountError::new_err(message),
            HostErrorClass::Type => PyTypeError::new_err(message),
            HostErrorClass::Reference => PyReferenceError::new_err(message),
            HostErrorClass::Runtime => PyRuntimeError::new_err(message),
            HostErrorClass::NativeExecution => NativeExecutionError::new_err(message),
        }
    }
}

fn bridge() -> Result<&'static Bridge, Error> {
    BRIDGE
        .get()
        .ok_or(Error::Bridge(BridgeError::NotRegistered {
            kind: Kind::Session,
        }))
}

/// Converts a Python argument into a host argument.
fn host_arg(value: &Bound<'_, PyAny>) -> HostArg {
    if value.is_none() {
        return HostArg::Nil;
    }
    // bool is a subclass of int, so it goes first.
    if let Ok(b) = value.downcast::<PyBool>() {
        return HostArg::Bool(b.is_true());
    }
    if value.is_instance_of::<PyInt>() {
        return value
            .extract::<i64>()
            .map_or_else(|_| HostArg::Other("out-of-range integer".into()), HostArg::Int);
    }
    if let Ok(f) = value.downcast::<PyFloat>() {
        return HostArg::Float(f.value());
    }
    if let Ok(s) = value.downcast::<PyString>() {
        return s
            .to_str()
            .map_or_else(|_| HostArg::non_utf8_string(), |s| HostArg::Str(s.to_owned()));
    }
    if let Ok(b) = value.downcast::<PyBytes>() {
        return HostArg::Bytes(b.as_bytes().to_vec());
    }
    let name = value
        .get_type()
        .name()
        .map_or_else(|_| "object".to_string(), |n| n.to_string());
    HostArg::Other(name)
}

/// Converts a marshaled cell into a Python object.
///
/// Strings that are not valid UTF-8 come back as `bytes`.
fn scalar_to_py(py: Python<'_>, value: &ScalarValue) -> PyResult<PyObject> {
    match value {
        ScalarValue::Null => Ok(py.None()),
        ScalarValue::Str(bytes) => match value.as_str() {
            Some(s) => s.into_py_any(py),
            None => PyBytes::new(py, bytes).into_py_any(py),
        },
        ScalarValue::UInt(n) => n.into_py_any(py),
        ScalarValue::Int(n) => n.into_py_any(py),
        ScalarValue::F32(f) => f64::from(*f).into_py_any(py),
        ScalarValue::F64(f) => f.into_py_any(py),
        ScalarValue::Bool(b) => b.into_py_any(py),
    }
}

/// A database session.
///
/// Construct with a connection string, `Session("sqlite::memory:")`, or
/// with four strings, `Session(host, user, password, schema)`.
#[pyclass(name = "Session", module = "rowbridge")]
pub struct Session {
    inner: SessionWrapper,
}

#[pymethods]
impl Session {
    /// Opens a session.
    #[new]
    #[pyo3(signature = (*args))]
    fn new(args: &Bound<'_, PyTuple>) -> Result<Self, Error> {
        let args: Vec<HostArg> = args.iter().map(|arg| host_arg(&arg)).collect();
        let inner = bridge()?.open_session(&args)?;
        Ok(Self { inner })
    }

    /// Executes a statement and returns its rows.
    fn sql(&self, py: Python<'_>, query: &Bound<'_, PyAny>) -> Result<Vec<Row>, Error> {
        let query = host_arg(query);
        let rows = py.allow_threads(|| self.inner.sql_arg(&query))?;
        Ok(rows.into_iter().map(|inner| Row { inner }).collect())
    }

    /// Closes the session. Returns False if it was already closed.
    fn close(&self) -> bool {
        self.inner.release()
    }

    /// Whether the session has been closed.
    #[getter]
    fn closed(&self) -> bool {
        self.inner.is_released()
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    #[pyo3(signature = (_exc_type=None, _exc_val=None, _exc_tb=None))]
    fn __exit__(
        &self,
        _exc_type: Option<PyObject>,
        _exc_val: Option<PyObject>,
        _exc_tb: Option<PyObject>,
    ) -> bool {
        self.inner.release();
        false
    }

    fn __repr__(&self) -> String {
        let state = if self.inner.is_released() { "closed" } else { "open" };
        format!("Session({state})")
    }
}

/// One result row.
///
/// `get` and `row[i]` are 1-based and return None outside the row.
/// `type`, `elementCount` and `at` are 0-based and raise instead.
#[pyclass(name = "Row", module = "rowbridge")]
pub struct Row {
    inner: RowWrapper,
}

impl Row {
    fn py_values<'py>(&self, py: Python<'py>) -> Result<Bound<'py, PyList>, Error> {
        let values = self
            .inner
            .values()?
            .iter()
            .map(|v| scalar_to_py(py, v))
            .collect::<PyResult<Vec<_>>>()?;
        Ok(PyList::new(py, values)?)
    }
}

#[pymethods]
impl Row {
    /// Returns a column value, 1-based.
    fn get(&self, py: Python<'_>, index: &Bound<'_, PyAny>) -> Result<PyObject, Error> {
        let value = self.inner.get_arg(&host_arg(index))?;
        Ok(scalar_to_py(py, &value)?)
    }

    fn __getitem__(&self, py: Python<'_>, key: &Bound<'_, PyAny>) -> Result<PyObject, Error> {
        let value = self.inner.index(&host_arg(key))?;
        Ok(scalar_to_py(py, &value)?)
    }

    /// Returns the client type code of a column, 0-based.
    #[pyo3(name = "type")]
    fn type_code(&self, index: i64) -> Result<i64, Error> {
        Ok(self.inner.type_code(index)?)
    }

    /// Returns the number of sub-elements of a column, 0-based.
    #[pyo3(name = "elementCount")]
    fn element_count(&self, index: i64) -> Result<i64, Error> {
        Ok(self.inner.element_count(index)?)
    }

    /// Returns a sub-element of a column, both indices 0-based.
    fn at(&self, py: Python<'_>, index: i64, subindex: i64) -> Result<PyObject, Error> {
        let value = self.inner.at(index, subindex)?;
        Ok(scalar_to_py(py, &value)?)
    }

    /// The number of columns.
    #[getter(colCount)]
    fn col_count(&self) -> Result<i64, Error> {
        Ok(self.inner.col_count()?)
    }

    fn __len__(&self) -> Result<usize, Error> {
        let count = self.inner.col_count()?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn __iter__<'py>(&self, py: Python<'py>) -> Result<Bound<'py, PyAny>, Error> {
        let list = self.py_values(py)?;
        Ok(list.as_any().try_iter()?.into_any())
    }

    fn __repr__(&self, py: Python<'_>) -> Result<String, Error> {
        let list = self.py_values(py)?;
        Ok(format!("Row({})", list.repr()?))
    }
}

/// Installs classes into a Python module.
struct ModuleRegistry<'a, 'py> {
    module: &'a Bound<'py, PyModule>,
}

impl HostRegistry for ModuleRegistry<'_, '_> {
    type Error = Error;

    fn is_registered(&self, kind: Kind) -> bool {
        self.module.hasattr(kind.name()).unwrap_or(false)
    }

    fn register_kind(&mut self, descriptor: &'static KindDescriptor) -> Result<(), Error> {
        match descriptor.kind {
            Kind::Session => self.module.add_class::<Session>()?,
            Kind::Row => self.module.add_class::<Row>()?,
        }
        Ok(())
    }
}

/// Registers the `Session` and `Row` classes on `module`, backed by `bridge`.
///
/// # Errors
///
/// Fails if either class is already present on the module.
pub fn register(module: &Bound<'_, PyModule>, bridge: &Bridge) -> PyResult<()> {
    bridge.init(&mut ModuleRegistry { module })?;
    Ok(())
}

/// Python module initialization.
#[pymodule]
fn rowbridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let bridge = BRIDGE.get_or_init(|| Bridge::new(StandardConnector));
    register(m, bridge)?;
    tracing::debug!("rowbridge module initialized");

    let py = m.py();
    m.add("ArgumentCountError", py.get_type::<ArgumentCountError>())?;
    m.add("NativeExecutionError", py.get_type::<NativeExecutionError>())?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    Ok(())
}

/// Returns the rowbridge library version.
#[pyfunction]
fn version() -> &'static str {
    VERSION
}
