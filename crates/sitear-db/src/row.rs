//! Schema-bound rows.
//!
//! A [`Row`] holds one value per column of its [`RecordSchema`], in declared
//! order. The key set is fixed: unknown columns are rejected on read and
//! write. Protected columns can only be written while the row is being
//! constructed; [`Row::copy`] starts a new construction phase, so a copy is
//! freely editable until [`Row::lock`] is called.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::catalog::RecordSchema;
use crate::error::RowError;
use crate::value::Value;

/// A record bound to one table's schema.
#[derive(Debug)]
pub struct Row {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
    locked: bool,
}

impl Row {
    /// Creates a locked row holding the schema defaults.
    #[must_use]
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let values = schema.defaults().to_vec();
        Self {
            schema,
            values,
            locked: true,
        }
    }

    /// Creates a row from `(column, value)` pairs and locks it.
    ///
    /// Protected columns may be set here; afterwards they are read-only.
    pub fn construct<I, K, V>(schema: &Arc<RecordSchema>, fields: I) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut row = Self {
            schema: Arc::clone(schema),
            values: schema.defaults().to_vec(),
            locked: false,
        };
        for (column, value) in fields {
            row.set(column.as_ref(), value)?;
        }
        row.locked = true;
        Ok(row)
    }

    /// Creates a row from a raw result tuple.
    pub fn hydrate(schema: &Arc<RecordSchema>, raw: Vec<Value>) -> Result<Self, RowError> {
        let mut row = Self::new(Arc::clone(schema));
        row.load_from_tuple(raw)?;
        Ok(row)
    }

    /// The schema this row is bound to.
    #[must_use]
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        self.schema.table()
    }

    /// Column names in declared order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        self.schema.columns()
    }

    /// Returns true if the column is declared.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.schema.has_column(column)
    }

    /// Reads a field.
    pub fn get(&self, column: &str) -> Result<&Value, RowError> {
        self.schema
            .index_of(column)
            .map(|i| &self.values[i])
            .ok_or_else(|| self.schema.unknown_column(column))
    }

    /// Writes a field.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<(), RowError> {
        let index = self
            .schema
            .index_of(column)
            .ok_or_else(|| self.schema.unknown_column(column))?;
        if self.locked && self.schema.is_protected(column) {
            return Err(RowError::ProtectedField {
                table: self.table().to_string(),
                column: column.to_string(),
            });
        }
        self.values[index] = value.into();
        Ok(())
    }

    /// All values in declared order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Values for the requested columns, in the requested order.
    pub fn values_for<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<&Value>, RowError> {
        columns.iter().map(|c| self.get(c.as_ref())).collect()
    }

    /// `(column, value)` pairs in declared order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.keys()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Pairs whose value is not [`Value::Unset`].
    #[must_use]
    pub fn assigned_pairs(&self) -> Vec<(&str, &Value)> {
        self.items().filter(|(_, v)| !v.is_unset()).collect()
    }

    /// Overwrites every field positionally. Protection does not apply.
    pub fn load_from_tuple(&mut self, raw: Vec<Value>) -> Result<&mut Self, RowError> {
        if raw.len() != self.schema.len() {
            return Err(RowError::SizeMismatch {
                table: self.table().to_string(),
                expected: self.schema.len(),
                found: raw.len(),
            });
        }
        self.values = raw;
        Ok(self)
    }

    /// Returns an unlocked copy with the same schema and values.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            values: self.values.clone(),
            locked: false,
        }
    }

    /// Ends the construction phase; protected columns become read-only.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Returns true once construction has finished.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.table())?;
        for (i, (k, v)) in self.items().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, ")")
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.items() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
