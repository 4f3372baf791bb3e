//! Column descriptors.
//!
//! A [`ColumnDescriptor`] carries everything a migration says about one
//! column: the storage type and SQL constraints used for DDL, plus the
//! row-layer attributes (default value, protection) that only the catalog
//! cares about. Foreign keys are descriptors too, but they carry no storage
//! type and render as a table constraint instead of a column.
//!
//! ```rust
//! use sitear_db::column::{foreign_key, integer, real, text};
//!
//! let cols = [
//!     integer("id").primary_key().unique().protected(),
//!     text("name"),
//!     real("lat").default(0.0),
//!     foreign_key("house_id", "auction_house", "id"),
//! ];
//! assert_eq!(cols[0].render(), r#""id" INTEGER PRIMARY KEY UNIQUE"#);
//! assert_eq!(
//!     cols[3].render(),
//!     r#"FOREIGN KEY("house_id") REFERENCES "auction_house"("id")"#
//! );
//! ```

use std::fmt;

use crate::value::Value;

/// Declared storage type of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// INTEGER affinity.
    Integer,
    /// REAL affinity.
    Real,
    /// TEXT affinity.
    Text,
    /// BLOB affinity.
    Blob,
    /// NUMERIC affinity.
    Numeric,
    /// DATE (NUMERIC affinity, kept for readability of the schema).
    Date,
    /// Any other declared type name.
    Custom(String),
}

impl StorageType {
    /// Returns the type name used in DDL.
    #[must_use]
    pub fn as_sql(&self) -> &str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
            Self::Numeric => "NUMERIC",
            Self::Date => "DATE",
            Self::Custom(name) => name,
        }
    }
}

/// Target of a foreign key: `table(column)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", quote_ident(&self.table), quote_ident(&self.column))
    }
}

/// Everything a migration declares about one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Storage type; `None` marks a constraint-only descriptor.
    pub storage_type: Option<StorageType>,
    /// PRIMARY KEY.
    pub primary_key: bool,
    /// UNIQUE.
    pub unique: bool,
    /// NOT NULL.
    pub not_null: bool,
    /// CHECK expression.
    pub check: Option<String>,
    /// AUTOINCREMENT.
    pub autoincrement: bool,
    /// Foreign key target. A foreign-key descriptor carries nothing else.
    pub foreign_key: Option<ForeignKeyRef>,
    /// Value a freshly built row starts with.
    pub default: Value,
    /// Writable only while a row is being constructed.
    pub protected: bool,
}

impl ColumnDescriptor {
    /// Creates a plain column with no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, storage_type: StorageType) -> Self {
        Self {
            name: name.into(),
            storage_type: Some(storage_type),
            primary_key: false,
            unique: false,
            not_null: false,
            check: None,
            autoincrement: false,
            foreign_key: None,
            default: Value::Unset,
            protected: false,
        }
    }

    /// Creates a foreign-key constraint on `name` referencing `table(column)`.
    ///
    /// The result is not a real column and is left out of the row field set.
    #[must_use]
    pub fn foreign_key(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            storage_type: None,
            primary_key: false,
            unique: false,
            not_null: false,
            check: None,
            autoincrement: false,
            foreign_key: Some(ForeignKeyRef {
                table: table.into(),
                column: column.into(),
            }),
            default: Value::Unset,
            protected: false,
        }
    }

    /// Marks the column as PRIMARY KEY.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Adds a CHECK constraint.
    #[must_use]
    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }

    /// Marks the column as AUTOINCREMENT.
    #[must_use]
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Sets the value new rows start with.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Makes the column read-only once a row has been constructed.
    #[must_use]
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Returns true if this descriptor is a real, stored column.
    #[must_use]
    pub fn is_stored(&self) -> bool {
        self.storage_type.is_some() && self.foreign_key.is_none()
    }

    /// Renders the DDL fragment for this descriptor.
    ///
    /// Constraints always appear in the order PRIMARY KEY, UNIQUE, NOT NULL,
    /// CHECK, AUTOINCREMENT.
    #[must_use]
    pub fn render(&self) -> String {
        if let Some(fk) = &self.foreign_key {
            return format!("FOREIGN KEY({}) REFERENCES {}", quote_ident(&self.name), fk);
        }

        let mut parts = vec![quote_ident(&self.name)];
        if let Some(ty) = &self.storage_type {
            parts.push(ty.as_sql().to_string());
        }
        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if self.unique {
            parts.push("UNIQUE".to_string());
        }
        if self.not_null {
            parts.push("NOT NULL".to_string());
        }
        if let Some(check) = &self.check {
            parts.push(format!("CHECK ({check})"));
        }
        if self.autoincrement {
            parts.push("AUTOINCREMENT".to_string());
        }
        parts.join(" ")
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quotes an identifier for SQLite.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Creates an INTEGER column.
#[must_use]
pub fn integer(name: impl Into<String>) -> ColumnDescriptor {
    ColumnDescriptor::new(name, StorageType::Integer)
}

/// Creates a REAL column.
#[must_use]
pub fn real(name: impl Into<String>) -> ColumnDescriptor {
    ColumnDescriptor::new(name, StorageType::Real)
}

/// Creates a TEXT column.
#[must_use]
pub fn text(name: impl Into<String>) -> ColumnDescriptor {
    ColumnDescriptor::new(name, StorageType::Text)
}

/// Creates a BLOB column.
#[must_use]
pub fn blob(name: impl Into<String>) -> ColumnDescriptor {
    ColumnDescriptor::new(name, StorageType::Blob)
}

/// Creates a DATE column.
#[must_use]
pub fn date(name: impl Into<String>) -> ColumnDescriptor {
    ColumnDescriptor::new(name, StorageType::Date)
}

/// Creates a foreign-key constraint descriptor.
#[must_use]
pub fn foreign_key(
    name: impl Into<String>,
    table: impl Into<String>,
    column: impl Into<String>,
) -> ColumnDescriptor {
    ColumnDescriptor::foreign_key(name, table, column)
}
