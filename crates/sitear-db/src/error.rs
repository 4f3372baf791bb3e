//! Error types for the storage core.
//!
//! Errors fall into five families: connection, schema, migration, row and
//! query. Schema and migration errors mean the persisted state is
//! incompatible with the code and should stop the program; row and query
//! errors are left to the caller.

use std::fmt;
use std::path::PathBuf;

/// Direction a migration step was running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward (`up`).
    Up,
    /// Backward (`down`).
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Problems with a migration list or with the schema recorded in a database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Schema ids live in 15 bits and 0 is reserved for "never applied".
    #[error("schema id {0} must be in 1..=32767")]
    InvalidSchemaId(u32),

    /// The first migration is not version 1.
    #[error("schema does not start at 1 (first version is {first})")]
    DoesNotStartAtOne {
        /// Version of the first migration.
        first: u16,
    },

    /// Versions are not strictly increasing.
    #[error("invalid schema ordering: version {found} follows {previous}")]
    InvalidOrdering {
        /// The earlier version.
        previous: u16,
        /// The offending version.
        found: u16,
    },

    /// Versions skip a number.
    #[error("schema does not increment by 1: version {found} follows {previous}")]
    DoesNotIncrement {
        /// The earlier version.
        previous: u16,
        /// The offending version.
        found: u16,
    },

    /// The database belongs to another schema family.
    #[error("database schema id {database} != schema id {expected}")]
    Mismatch {
        /// Schema id stored in the database.
        database: u16,
        /// Schema id the caller asked for.
        expected: u16,
    },

    /// The requested target version does not exist.
    #[error("invalid version {requested} (latest is {latest})")]
    InvalidVersion {
        /// Requested target.
        requested: u16,
        /// Highest known version.
        latest: u16,
    },

    /// The database was migrated by newer code than this.
    #[error("database version {database} is newer than latest known version {latest}")]
    UnknownDatabaseVersion {
        /// Version stored in the database.
        database: u16,
        /// Highest known version.
        latest: u16,
    },
}

/// Misuse of a [`Row`](crate::Row) or of the catalog that builds rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// No record type is registered under this table name.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// The column is not declared by the table.
    #[error("column {column} not in table {table}")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Write to a protected column after construction.
    #[error("{column} is protected in table {table}")]
    ProtectedField {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A raw tuple does not have one value per column.
    #[error("incorrect row size for table {table}: expected {expected}, got {found}")]
    SizeMismatch {
        /// Table name.
        table: String,
        /// Declared column count.
        expected: usize,
        /// Tuple length.
        found: usize,
    },
}

/// Invalid search or select requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Empty table name.
    #[error("invalid table: '{0}'")]
    InvalidTable(String),

    /// Empty column name.
    #[error("invalid column: '{0}'")]
    InvalidColumn(String),

    /// The table has no record type in the catalog.
    #[error("unknown table: '{0}'")]
    UnknownTable(String),

    /// The column is not declared by the table.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A row built for one table was sent to another.
    #[error("row of table '{row}' cannot be inserted into '{target}'")]
    TableMismatch {
        /// Table the row was built for.
        row: String,
        /// Table named in the insert.
        target: String,
    },

    /// Unbalanced quote in a search string.
    #[error("term syntax error: {0}")]
    TermSyntax(String),

    /// Record iteration was requested on a cursor without a record type.
    #[error("cursor has no record schema")]
    NoRecordSchema,
}

/// Errors returned by the storage core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The driver was never opened or has been closed.
    #[error("not connected to database: {}", .0.display())]
    NotConnected(PathBuf),

    /// A value does not fit in its persisted bit budget.
    #[error("{what} {value:#x} out of range (max {max:#x})")]
    OutOfRange {
        /// Which quantity overflowed.
        what: &'static str,
        /// Offending value.
        value: i64,
        /// Largest allowed value.
        max: i64,
    },

    /// Schema sequencing or compatibility error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A migration's `up` or `down` failed.
    #[error("migration {version} ({direction}) failed: {source}")]
    Migration {
        /// Version of the failing migration.
        version: u16,
        /// Which transform was running.
        direction: Direction,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Row misuse.
    #[error(transparent)]
    Row(#[from] RowError),

    /// Query misuse.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Error reported by SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;
