//! Schema builders.
//!
//! Migrations describe their changes against [`SchemaBuilder`]. Two
//! implementations exist: [`DdlBuilder`] runs the DDL on a connection and
//! [`CatalogBuilder`] only records record schemas. Replaying the same
//! migrations through both keeps the tables and the catalog in lockstep.

use tracing::debug;

use crate::catalog::Catalog;
use crate::column::ColumnDescriptor;
use crate::driver::Driver;
use crate::error::{QueryError, Result};

/// The operations a migration may perform.
pub trait SchemaBuilder {
    /// Creates a table.
    fn add_table(&mut self, name: &str, columns: &[ColumnDescriptor]) -> Result<()>;

    /// Drops a table.
    fn drop_table(&mut self, name: &str) -> Result<()>;
}

/// Executes schema changes against a live connection.
pub struct DdlBuilder<'a> {
    driver: &'a Driver,
}

impl<'a> DdlBuilder<'a> {
    /// Creates a builder over `driver`.
    #[must_use]
    pub fn new(driver: &'a Driver) -> Self {
        Self { driver }
    }
}

impl SchemaBuilder for DdlBuilder<'_> {
    fn add_table(&mut self, name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        self.driver.add_table(name, columns)
    }

    fn drop_table(&mut self, name: &str) -> Result<()> {
        self.driver.drop_table(name)
    }
}

/// Records schema changes into a [`Catalog`] without touching any database.
pub struct CatalogBuilder<'a> {
    catalog: &'a mut Catalog,
}

impl<'a> CatalogBuilder<'a> {
    /// Creates a builder that fills `catalog`.
    pub fn new(catalog: &'a mut Catalog) -> Self {
        Self { catalog }
    }
}

impl SchemaBuilder for CatalogBuilder<'_> {
    fn add_table(&mut self, name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        let schema = self.catalog.define(name, columns);
        debug!(table = name, columns = schema.len(), "Defined record type");
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<()> {
        self.catalog
            .undefine(name)
            .map(|_| ())
            .ok_or_else(|| QueryError::UnknownTable(name.to_string()).into())
    }
}
