//! Materialized rows and result sets.

use crate::error::{ClientError, ClientResult};
use crate::value::NativeValue;

/// One result record.
///
/// A row is immutable once built and its column count never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Box<[NativeValue]>,
}

impl Row {
    /// Creates a row from its cell values.
    #[must_use]
    pub fn new(values: Vec<NativeValue>) -> Self {
        Self {
            values: values.into_boxed_slice(),
        }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.values.len()
    }

    /// Returns the cell at a 0-based index, or `None` when out of range.
    #[must_use]
    pub fn get(&self, index: i64) -> Option<&NativeValue> {
        usize::try_from(index).ok().and_then(|i| self.values.get(i))
    }

    /// Returns the cell at a 0-based index.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ColumnOutOfRange`] when `index` is outside the row.
    pub fn value(&self, index: i64) -> ClientResult<&NativeValue> {
        self.get(index).ok_or(ClientError::ColumnOutOfRange {
            index,
            count: self.values.len(),
        })
    }

    /// Returns all cells in column order.
    #[must_use]
    pub fn values(&self) -> &[NativeValue] {
        &self.values
    }
}

impl FromIterator<NativeValue> for Row {
    fn from_iter<I: IntoIterator<Item = NativeValue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The fully materialized result of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
    affected_rows: u64,
}

impl ResultSet {
    /// Creates a result set from column names and rows.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            affected_rows: 0,
        }
    }

    /// Creates an empty result for a statement that produced no rows.
    #[must_use]
    pub fn empty(affected_rows: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows,
        }
    }

    /// Sets the affected-row count reported by the server.
    #[must_use]
    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = affected_rows;
        self
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows changed by a DML statement.
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    /// Returns the rows without consuming the result.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the result and returns every row in result order.
    #[must_use]
    pub fn fetch_all(self) -> Vec<Row> {
        self.rows
    }
}
