//! Record schemas and the catalog that builds rows from them.
//!
//! The catalog is rebuilt by replaying migrations against a metadata-only
//! builder (see [`CatalogBuilder`](crate::builder::CatalogBuilder)), so it
//! always describes exactly the tables the applied migrations created.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::column::ColumnDescriptor;
use crate::error::RowError;
use crate::row::Row;
use crate::value::Value;

/// Shape of one table as seen by the row layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    table: String,
    columns: Vec<String>,
    defaults: Vec<Value>,
    protected: BTreeSet<String>,
}

impl RecordSchema {
    /// Builds a schema from column descriptors, skipping constraint-only ones.
    #[must_use]
    pub fn from_columns(table: impl Into<String>, columns: &[ColumnDescriptor]) -> Self {
        let stored: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.is_stored()).collect();
        Self {
            table: table.into(),
            columns: stored.iter().map(|c| c.name.clone()).collect(),
            defaults: stored.iter().map(|c| c.default.clone()).collect(),
            protected: stored
                .iter()
                .filter(|c| c.protected)
                .map(|c| c.name.clone())
                .collect(),
        }
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column names in declared order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Default values, parallel to [`columns`](Self::columns).
    #[must_use]
    pub fn defaults(&self) -> &[Value] {
        &self.defaults
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the table has no stored columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column.
    #[must_use]
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Returns true if the column is declared.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.index_of(column).is_some()
    }

    /// Returns true if the column is protected.
    #[must_use]
    pub fn is_protected(&self, column: &str) -> bool {
        self.protected.contains(column)
    }

    pub(crate) fn unknown_column(&self, column: &str) -> RowError {
        RowError::UnknownColumn {
            table: self.table.clone(),
            column: column.to_string(),
        }
    }
}

/// Registry of record schemas by table name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    schemas: BTreeMap<String, Arc<RecordSchema>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the record type for `table`, replacing any previous one.
    pub fn define(&mut self, table: &str, columns: &[ColumnDescriptor]) -> Arc<RecordSchema> {
        let schema = Arc::new(RecordSchema::from_columns(table, columns));
        self.schemas.insert(table.to_string(), Arc::clone(&schema));
        schema
    }

    /// Removes the record type for `table`.
    pub fn undefine(&mut self, table: &str) -> Option<Arc<RecordSchema>> {
        self.schemas.remove(table)
    }

    /// Looks up a record type.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<&Arc<RecordSchema>> {
        self.schemas.get(table)
    }

    /// Looks up a record type, failing with [`RowError::UnknownTable`].
    pub fn schema(&self, table: &str) -> Result<&Arc<RecordSchema>, RowError> {
        self.get(table)
            .ok_or_else(|| RowError::UnknownTable(table.to_string()))
    }

    /// Returns true if `table` is registered.
    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.schemas.contains_key(table)
    }

    /// Registered table names, sorted.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Builds a row for `table` from `(column, value)` pairs.
    ///
    /// Omitted columns take their declared default.
    pub fn build<I, K, V>(&self, table: &str, fields: I) -> Result<Row, RowError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Row::construct(self.schema(table)?, fields)
    }
}
