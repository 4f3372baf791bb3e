//! Bootstrap errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::site::SiteType;

/// Errors raised while opening a site database.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The generic viewer has no schema to create a database with.
    #[error("can not use 'generic' site type when creating database")]
    GenericOnCreate,

    /// The database file does not exist.
    #[error("database not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but no schema was ever applied to it.
    #[error("opened database with 0 schema id")]
    BlankSchemaId,

    /// The file belongs to a schema family this build does not know.
    #[error("database using unknown schema id: {0:#04x}")]
    UnknownSchemaId(u16),

    /// The requested site type differs from the one stored in the file.
    #[error("site type '{requested}' is not compatible with database site type '{stored}'")]
    SiteTypeMismatch {
        /// Site type asked for.
        requested: SiteType,
        /// Site type recorded in the database.
        stored: SiteType,
    },

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] sitear_db::Error),
}

/// Result type for bootstrap operations.
pub type Result<T> = std::result::Result<T, BootstrapError>;
