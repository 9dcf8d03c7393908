//! The row wrapper.

use crate::error::BridgeResult;
use crate::guard::guarded;
use crate::handle::Handle;
use crate::marshal::{expect_integer, marshal, HostArg, ScalarValue};
use crate::registry::{ROW, ROW_AT, ROW_COL_COUNT, ROW_ELEMENT_COUNT, ROW_GET, ROW_INDEX, ROW_TYPE};
use crate::session::Bridge;
use rowbridge_client::{NativeValue, Row};
use std::sync::Arc;

/// Host-visible `Row` object.
///
/// Column accessors use two index conventions. `get` and the generic index
/// are 1-based and answer absence for any index outside the row. `type`,
/// `elementCount` and `at` are 0-based and fail with a native error instead.
#[derive(Debug)]
pub struct RowWrapper {
    bridge: Bridge,
    handle: Handle,
}

impl RowWrapper {
    pub(crate) fn new(bridge: Bridge, handle: Handle) -> Self {
        Self { bridge, handle }
    }

    fn row(&self, operation: &'static str) -> BridgeResult<Arc<Row>> {
        ROW.check_receiver(operation, self.handle.kind())?;
        self.bridge.row_at(self.handle, operation)
    }

    fn scalar(&self, operation: &'static str, value: &NativeValue) -> ScalarValue {
        let scalar = marshal(value);
        if self.bridge.config().warn_on_unsafe_integers && scalar.exceeds_safe_integer() {
            tracing::warn!(
                handle = %self.handle,
                operation,
                value = ?scalar,
                "integer exceeds 2^53 and may lose precision in the host"
            );
        }
        scalar
    }

    /// Returns the value of a column, 1-based.
    ///
    /// # Errors
    ///
    /// Only fails if the row has been released. An out-of-range index, like
    /// a NULL cell, yields [`ScalarValue::Null`].
    pub fn get(&self, index: i64) -> BridgeResult<ScalarValue> {
        let row = self.row(ROW_GET.name)?;
        Ok(row
            .get(ROW_GET.native_index(index))
            .map_or(ScalarValue::Null, |v| self.scalar(ROW_GET.name, v)))
    }

    /// Same as [`get`](Self::get) with the index given as a host argument.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::ArgumentType` if `index` is not an integer.
    pub fn get_arg(&self, index: &HostArg) -> BridgeResult<ScalarValue> {
        let index = expect_integer(ROW_GET.name, 1, index)?;
        self.get(index)
    }

    /// Generic index access, `row[key]`.
    ///
    /// Integer keys behave like [`get`](Self::get). Any other key yields
    /// [`ScalarValue::Null`].
    ///
    /// # Errors
    ///
    /// Only fails if the row has been released.
    pub fn index(&self, key: &HostArg) -> BridgeResult<ScalarValue> {
        let row = self.row(ROW_INDEX.name)?;
        Ok(key
            .as_integer()
            .and_then(|index| row.get(ROW_INDEX.native_index(index)))
            .map_or(ScalarValue::Null, |v| self.scalar(ROW_INDEX.name, v)))
    }

    /// Returns the client type code of a column, 0-based.
    ///
    /// # Errors
    ///
    /// Returns a native error if `index` is outside the row.
    pub fn type_code(&self, index: i64) -> BridgeResult<i64> {
        let row = self.row(ROW_TYPE.name)?;
        guarded(ROW_TYPE.name, || {
            row.value(ROW_TYPE.native_index(index))
                .map(|v| v.type_tag().code())
        })
    }

    /// Returns the number of sub-elements of a column, 0-based.
    ///
    /// # Errors
    ///
    /// Returns a native error if `index` is outside the row.
    pub fn element_count(&self, index: i64) -> BridgeResult<i64> {
        let row = self.row(ROW_ELEMENT_COUNT.name)?;
        let count = guarded(ROW_ELEMENT_COUNT.name, || {
            row.value(ROW_ELEMENT_COUNT.native_index(index))
                .map(NativeValue::element_count)
        })?;
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    /// Returns a sub-element of a column, both indices 0-based.
    ///
    /// # Errors
    ///
    /// Returns a native error if either index is out of range.
    pub fn at(&self, index: i64, subindex: i64) -> BridgeResult<ScalarValue> {
        let row = self.row(ROW_AT.name)?;
        let element = guarded(ROW_AT.name, || {
            row.value(ROW_AT.native_index(index))
                .and_then(|v| v.element(ROW_AT.native_index(subindex)))
                .cloned()
        })?;
        Ok(self.scalar(ROW_AT.name, &element))
    }

    /// Returns the number of columns.
    ///
    /// # Errors
    ///
    /// Only fails if the row has been released.
    pub fn col_count(&self) -> BridgeResult<i64> {
        let row = self.row(ROW_COL_COUNT.name)?;
        Ok(i64::try_from(row.col_count()).unwrap_or(i64::MAX))
    }

    /// Returns every column value in order.
    ///
    /// # Errors
    ///
    /// Only fails if the row has been released.
    pub fn values(&self) -> BridgeResult<Vec<ScalarValue>> {
        let row = self.row(ROW_GET.name)?;
        Ok(row
            .values()
            .iter()
            .map(|v| self.scalar(ROW_GET.name, v))
            .collect())
    }

    /// Returns the handle.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Releases the row. Returns false if already released.
    pub fn release(&self) -> bool {
        self.bridge.release(self.handle)
    }

    /// Returns true once the row has been released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.bridge.row_at(self.handle, ROW_GET.name).is_err()
    }
}

impl Drop for RowWrapper {
    fn drop(&mut self) {
        self.bridge.release(self.handle);
    }
}
