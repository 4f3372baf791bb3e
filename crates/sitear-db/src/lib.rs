//! Versioned SQLite storage for site archives.
//!
//! `sitear-db` is the storage core of the site archiver:
//! - Schemas are ordered lists of reversible migrations tagged with a schema
//!   family id, and the database records which family and version it holds
//! - Rows are dynamic records whose shape comes from a catalog rebuilt from
//!   the same migrations that built the tables
//! - Searches compose AND/OR/NOT term groups into one parameterized query
//!
//! # Architecture
//!
//! - **Column** - [`ColumnDescriptor`] and its DDL rendering
//! - **Catalog** - table name to [`RecordSchema`], builds [`Row`]s
//! - **Migration** - `{version, up, down}` records and sequence validation
//! - **Manager** - walks a database between versions, rebuilds the catalog
//! - **Driver** - the connection, the version slot, inserts and cursors
//! - **Search** - term tokenizer and query builder
//!
//! # Example
//!
//! ```rust
//! use sitear_db::prelude::*;
//!
//! fn up(b: &mut dyn SchemaBuilder) -> Result<()> {
//!     b.add_table("lot", &[integer("id").primary_key().protected(), text("desc")])
//! }
//!
//! fn down(b: &mut dyn SchemaBuilder) -> Result<()> {
//!     b.drop_table("lot")
//! }
//!
//! # fn main() -> Result<()> {
//! let mut driver = Driver::open_in_memory()?;
//! let manager = MigrationManager::new(1, [Migration::new(1, up, down)])?;
//! manager.apply(&mut driver, None)?;
//!
//! let row = driver.build("lot", [("desc", "red sofa")])?;
//! driver.insert_row("lot", &row, false)?;
//!
//! let terms = SearchTerms::parse("red", "", "chair")?;
//! let search = build_search(driver.catalog(), "lot", "desc", &terms, false)?;
//! let mut cursor = search.cursor(&driver)?;
//! let found = cursor.records()?.collect::<Result<Vec<_>>>()?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod catalog;
pub mod column;
pub mod driver;
pub mod error;
pub mod manager;
pub mod migration;
pub mod row;
pub mod search;
pub mod terms;
pub mod value;
pub mod version;

pub use builder::{CatalogBuilder, DdlBuilder, SchemaBuilder};
pub use catalog::{Catalog, RecordSchema};
pub use column::{ColumnDescriptor, StorageType};
pub use driver::{Cursor, Driver, DriverConfig};
pub use error::{Direction, Error, QueryError, Result, RowError, SchemaError};
pub use manager::{ApplyReport, MigrationManager, MigrationStatus};
pub use migration::Migration;
pub use row::Row;
pub use value::Value;
pub use version::VersionSlot;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::{CatalogBuilder, DdlBuilder, SchemaBuilder};
    pub use crate::catalog::{Catalog, RecordSchema};
    pub use crate::column::{
        blob, date, foreign_key, integer, real, text, ColumnDescriptor, StorageType,
    };
    pub use crate::driver::{Cursor, Driver, DriverConfig};
    pub use crate::error::{Direction, Error, QueryError, Result, RowError, SchemaError};
    pub use crate::manager::{ApplyReport, MigrationManager, MigrationStatus};
    pub use crate::migration::{validate, Migration};
    pub use crate::row::Row;
    pub use crate::search::{build_search, compose_like, Search, SearchTerms};
    pub use crate::terms::split_terms;
    pub use crate::value::Value;
    pub use crate::version::VersionSlot;
}
