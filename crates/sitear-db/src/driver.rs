//! Synchronous SQLite driver.
//!
//! [`Driver`] owns the single connection, the [`Catalog`] produced by the last
//! migration run, and the primitives everything else is built on: statement
//! execution, the version slot, DDL, row inserts and lazy cursors.
//!
//! Cursors are two-step. [`Driver::cursor`] prepares a statement and keeps the
//! parameters; [`Cursor::rows`] or [`Cursor::records`] then execute it and
//! hand out an iterator in which every `next()` is exactly one step of the
//! running statement.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{params_from_iter, Connection, OpenFlags, Statement};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, RecordSchema};
use crate::column::{quote_ident, ColumnDescriptor};
use crate::error::{Error, QueryError, Result};
use crate::row::Row;
use crate::value::Value;
use crate::version::{VersionSlot, MAX_RAW};

const MEMORY_PATH: &str = ":memory:";

/// Connection options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Enforce foreign keys (`PRAGMA foreign_keys = ON`).
    pub foreign_keys: bool,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            foreign_keys: false,
            create_if_missing: true,
        }
    }
}

/// The storage connection plus its catalog.
#[derive(Debug)]
pub struct Driver {
    path: PathBuf,
    conn: Option<Connection>,
    catalog: Catalog,
}

impl Driver {
    /// Opens (or creates) the database at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &DriverConfig::default())
    }

    /// Opens the database at `path`.
    pub fn open_with(path: impl AsRef<Path>, config: &DriverConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if config.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let conn = Connection::open_with_flags(&path, flags)?;
        info!(path = %path.display(), "Opened database");
        Self::from_connection(path, conn, config)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(PathBuf::from(MEMORY_PATH), conn, &DriverConfig::default())
    }

    fn from_connection(path: PathBuf, conn: Connection, config: &DriverConfig) -> Result<Self> {
        if config.foreign_keys {
            conn.pragma_update(None, "foreign_keys", true)?;
        }
        Ok(Self {
            path,
            conn: Some(conn),
            catalog: Catalog::new(),
        })
    }

    /// Closes the connection. Closing twice is harmless.
    pub fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                conn.close().map_err(|(_, err)| err)?;
                info!(path = %self.path.display(), "Closed database");
            }
            None => warn!(path = %self.path.display(), "Database already closed"),
        }
        Ok(())
    }

    /// Returns true while the connection is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns true unless a transaction or savepoint is open.
    pub fn is_autocommit(&self) -> Result<bool> {
        Ok(self.conn()?.is_autocommit())
    }

    /// Path the driver was opened on (`:memory:` for in-memory databases).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::NotConnected(self.path.clone()))
    }

    /// Executes one statement and returns the number of changed rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        let conn = self.conn()?;
        debug!(sql = %sql, params = params.len(), "Executing");
        Ok(conn.execute(sql, params_from_iter(params))?)
    }

    /// Executes several `;`-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn()?;
        debug!(sql = %sql, "Executing batch");
        Ok(conn.execute_batch(sql)?)
    }

    // ---- version slot ---------------------------------------------------

    /// Reads the raw `user_version` value.
    pub fn raw_user_version(&self) -> Result<i32> {
        Ok(self
            .conn()?
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    /// Writes the raw `user_version` value.
    pub fn set_raw_user_version(&self, raw: i64) -> Result<()> {
        if !(0..=MAX_RAW).contains(&raw) {
            return Err(Error::OutOfRange {
                what: "user_version",
                value: raw,
                max: MAX_RAW,
            });
        }
        let conn = self.conn()?;
        debug!(raw, "Setting user_version");
        conn.pragma_update(None, "user_version", raw)?;
        Ok(())
    }

    /// Reads the persisted `(schema id, version)` slot.
    pub fn version_slot(&self) -> Result<VersionSlot> {
        VersionSlot::decode(self.raw_user_version()?)
    }

    /// Persists `(schema_id, version)` in the slot.
    pub fn set_version_slot(&self, schema_id: u32, version: u32) -> Result<()> {
        let slot = VersionSlot::new(schema_id, version)?;
        self.set_raw_user_version(i64::from(slot.encode()))
    }

    // ---- schema ----------------------------------------------------------

    /// User tables and views, sorted by name.
    pub fn tables(&self) -> Result<Vec<String>> {
        self.query_strings(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
    }

    /// `CREATE` statements of all user tables, sorted by table name.
    pub fn schema_sql(&self) -> Result<Vec<String>> {
        self.query_strings(
            "SELECT sql FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
    }

    fn query_strings(&self, sql: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        debug!(sql = %sql, "Querying");
        let mut stmt = conn.prepare(sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Creates a table from column descriptors.
    pub fn add_table(&self, name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        self.execute(&create_table_sql(name, columns), &[])?;
        Ok(())
    }

    /// Drops a table.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.execute(&format!("DROP TABLE {}", quote_ident(name)), &[])?;
        Ok(())
    }

    /// Toggles `PRAGMA case_sensitive_like`.
    ///
    /// The setting applies to every later `LIKE` on the connection. Prefer
    /// [`Driver::like_cursor`], which switches it back off when done.
    pub fn set_case_sensitive_like(&self, enabled: bool) -> Result<()> {
        self.conn()?
            .pragma_update(None, "case_sensitive_like", enabled)?;
        Ok(())
    }

    // ---- rows ------------------------------------------------------------

    /// Inserts the assigned fields of `row` into `table` and returns the rowid.
    ///
    /// Unset fields are left out so the engine's default (or NULL) applies.
    /// A row with nothing assigned becomes `INSERT ... DEFAULT VALUES`.
    pub fn insert_row(&self, table: &str, row: &Row, or_replace: bool) -> Result<i64> {
        if table.is_empty() {
            return Err(QueryError::InvalidTable(table.to_string()).into());
        }
        if row.table() != table {
            return Err(QueryError::TableMismatch {
                row: row.table().to_string(),
                target: table.to_string(),
            }
            .into());
        }
        let pairs = row.assigned_pairs();
        let verb = if or_replace {
            "INSERT OR REPLACE"
        } else {
            "INSERT"
        };
        let sql = if pairs.is_empty() {
            format!("{verb} INTO {} DEFAULT VALUES", quote_ident(table))
        } else {
            let columns: Vec<String> = pairs.iter().map(|(k, _)| quote_ident(k)).collect();
            let placeholders: Vec<String> = (1..=pairs.len()).map(|i| format!("?{i}")).collect();
            format!(
                "{verb} INTO {} ({}) VALUES ({})",
                quote_ident(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        let conn = self.conn()?;
        debug!(sql = %sql, params = pairs.len(), "Inserting row");
        conn.execute(&sql, params_from_iter(pairs.iter().map(|(_, v)| *v)))?;
        Ok(conn.last_insert_rowid())
    }

    /// Reads one column of `table`, optionally filtered.
    pub fn single_column(
        &self,
        table: &str,
        column: &str,
        where_clause: Option<&str>,
        params: &[Value],
    ) -> Result<Vec<Value>> {
        let mut sql = format!("SELECT {} FROM {}", quote_ident(column), quote_ident(table));
        if let Some(clause) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        let mut cursor = self.cursor(&sql, params)?;
        let values = cursor
            .rows()?
            .map(|raw| raw.map(|mut raw| raw.swap_remove(0)))
            .collect::<Result<Vec<_>>>()?;
        Ok(values)
    }

    /// Prepares `sql` for lazy iteration.
    pub fn cursor(&self, sql: &str, params: &[Value]) -> Result<Cursor<'_>> {
        let conn = self.conn()?;
        debug!(sql = %sql, params = params.len(), "Preparing cursor");
        Ok(Cursor {
            stmt: conn.prepare(sql)?,
            params: params.to_vec(),
            schema: None,
            restore_like: None,
        })
    }

    /// Prepares `sql` for lazy iteration as rows of `table`.
    ///
    /// The statement must select the table's columns in declared order.
    pub fn record_cursor(&self, table: &str, sql: &str, params: &[Value]) -> Result<Cursor<'_>> {
        let schema = self.record_schema(table)?;
        let mut cursor = self.cursor(sql, params)?;
        cursor.schema = Some(schema);
        Ok(cursor)
    }

    /// Record cursor over `table` whose `LIKE`s run case sensitive or not.
    ///
    /// A case-sensitive cursor turns `PRAGMA case_sensitive_like` back off
    /// when it is dropped.
    pub fn like_cursor(
        &self,
        table: &str,
        sql: &str,
        params: &[Value],
        case_sensitive: bool,
    ) -> Result<Cursor<'_>> {
        let conn = self.conn()?;
        self.set_case_sensitive_like(case_sensitive)?;
        match self.record_cursor(table, sql, params) {
            Ok(mut cursor) => {
                if case_sensitive {
                    cursor.restore_like = Some(conn);
                }
                Ok(cursor)
            }
            Err(err) => {
                if case_sensitive {
                    reset_case_sensitive_like(conn);
                }
                Err(err)
            }
        }
    }

    /// Record cursor over `table`, optionally filtered by a parameterized
    /// WHERE clause.
    pub fn select_where(
        &self,
        table: &str,
        where_clause: Option<&str>,
        params: &[Value],
    ) -> Result<Cursor<'_>> {
        let schema = self.record_schema(table)?;
        let mut sql = select_all_sql(&schema);
        if let Some(clause) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        self.record_cursor(table, &sql, params)
    }

    fn record_schema(&self, table: &str) -> Result<Arc<RecordSchema>> {
        self.catalog
            .get(table)
            .cloned()
            .ok_or_else(|| QueryError::UnknownTable(table.to_string()).into())
    }

    // ---- catalog ---------------------------------------------------------

    /// The catalog the last migration run produced.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Installs a new catalog and returns the previous one.
    pub fn replace_catalog(&mut self, catalog: Catalog) -> Catalog {
        std::mem::replace(&mut self.catalog, catalog)
    }

    /// Builds a row for `table` through the catalog.
    pub fn build<I, K, V>(&self, table: &str, fields: I) -> Result<Row>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Ok(self.catalog.build(table, fields)?)
    }
}

/// Renders `CREATE TABLE` for `columns`. Foreign-key clauses come last.
#[must_use]
pub fn create_table_sql(name: &str, columns: &[ColumnDescriptor]) -> String {
    let (constraints, stored): (Vec<&ColumnDescriptor>, Vec<&ColumnDescriptor>) =
        columns.iter().partition(|c| c.foreign_key.is_some());
    let body: Vec<String> = stored
        .iter()
        .chain(constraints.iter())
        .map(|c| c.render())
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(name), body.join(", "))
}

pub(crate) fn select_all_sql(schema: &RecordSchema) -> String {
    let columns: Vec<String> = schema.columns().iter().map(|c| quote_ident(c)).collect();
    format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_ident(schema.table())
    )
}

fn reset_case_sensitive_like(conn: &Connection) {
    if let Err(err) = conn.pragma_update(None, "case_sensitive_like", false) {
        warn!(error = %err, "Failed to reset case_sensitive_like");
    }
}

/// A prepared statement and its parameters.
pub struct Cursor<'conn> {
    stmt: Statement<'conn>,
    params: Vec<Value>,
    schema: Option<Arc<RecordSchema>>,
    restore_like: Option<&'conn Connection>,
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.restore_like.take() {
            reset_case_sensitive_like(conn);
        }
    }
}

impl Cursor<'_> {
    /// Column names of the result set.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Record type attached to this cursor, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&Arc<RecordSchema>> {
        self.schema.as_ref()
    }

    /// Executes the statement and iterates raw tuples.
    pub fn rows(&mut self) -> Result<RowIter<'_>> {
        let rows = self.stmt.query(params_from_iter(self.params.iter()))?;
        Ok(RowIter { rows })
    }

    /// Executes the statement and iterates hydrated rows.
    pub fn records(&mut self) -> Result<RecordIter<'_>> {
        let schema = self.schema.clone().ok_or(QueryError::NoRecordSchema)?;
        Ok(RecordIter {
            inner: self.rows()?,
            schema,
        })
    }
}

/// Lazy iterator over raw result tuples.
pub struct RowIter<'stmt> {
    rows: rusqlite::Rows<'stmt>,
}

impl Iterator for RowIter<'_> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Ok(Some(row)) => Some(read_tuple(row)),
            Ok(None) => None,
            Err(err) => Some(Err(err.into())),
        }
    }
}

fn read_tuple(row: &rusqlite::Row<'_>) -> Result<Vec<Value>> {
    let count = row.as_ref().column_count();
    (0..count)
        .map(|i| row.get_ref(i).map(Value::from).map_err(Error::from))
        .collect()
}

/// Lazy iterator over hydrated [`Row`]s.
pub struct RecordIter<'stmt> {
    inner: RowIter<'stmt>,
    schema: Arc<RecordSchema>,
}

impl Iterator for RecordIter<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.inner.next()? {
            Ok(raw) => raw,
            Err(err) => return Some(Err(err)),
        };
        Some(Row::hydrate(&self.schema, raw).map_err(Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{foreign_key, integer, real, text};

    fn lot_columns() -> Vec<ColumnDescriptor> {
        vec![
            integer("id").primary_key().unique().protected(),
            foreign_key("house_id", "auction_house", "id"),
            integer("house_id"),
            text("desc"),
            real("price"),
        ]
    }

    fn driver_with_lot() -> Driver {
        let mut driver = Driver::open_in_memory().unwrap();
        driver
            .add_table("auction_house", &[integer("id").primary_key()])
            .unwrap();
        driver.add_table("lot", &lot_columns()).unwrap();
        let mut catalog = Catalog::new();
        catalog.define("lot", &lot_columns());
        driver.replace_catalog(catalog);
        driver
    }

    #[test]
    fn test_create_table_puts_foreign_keys_last() {
        assert_eq!(
            create_table_sql("lot", &lot_columns()),
            "CREATE TABLE \"lot\" (\"id\" INTEGER PRIMARY KEY UNIQUE, \"house_id\" INTEGER, \
             \"desc\" TEXT, \"price\" REAL, \
             FOREIGN KEY(\"house_id\") REFERENCES \"auction_house\"(\"id\"))"
        );
    }

    #[test]
    fn test_not_connected_after_close() {
        let mut driver = Driver::open_in_memory().unwrap();
        assert!(driver.is_open());
        driver.close().unwrap();
        assert!(!driver.is_open());
        assert!(matches!(
            driver.execute("SELECT 1", &[]),
            Err(Error::NotConnected(_))
        ));
        assert!(matches!(driver.version_slot(), Err(Error::NotConnected(_))));
        // Second close is a no-op.
        driver.close().unwrap();
    }

    #[test]
    fn test_version_slot_round_trip() {
        let driver = Driver::open_in_memory().unwrap();
        assert!(driver.version_slot().unwrap().is_blank());

        driver.set_version_slot(1, 2).unwrap();
        assert_eq!(driver.raw_user_version().unwrap(), 0x0001_0002);
        assert_eq!(
            driver.version_slot().unwrap(),
            VersionSlot {
                schema_id: 1,
                version: 2
            }
        );
    }

    #[test]
    fn test_version_slot_out_of_range() {
        let driver = Driver::open_in_memory().unwrap();
        assert!(matches!(
            driver.set_version_slot(1 << 15, 0),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            driver.set_version_slot(1, 1 << 16),
            Err(Error::OutOfRange { .. })
        ));
        assert!(driver.set_raw_user_version(-1).is_err());
        assert!(driver.set_raw_user_version(MAX_RAW + 1).is_err());
        // Failed writes leave the slot alone.
        assert_eq!(driver.raw_user_version().unwrap(), 0);
    }

    #[test]
    fn test_insert_binds_values() {
        let driver = driver_with_lot();
        let row = driver
            .build("lot", [("desc", Value::from("it's \"quoted\"")), ("price", 2.5.into())])
            .unwrap();
        let rowid = driver.insert_row("lot", &row, false).unwrap();
        assert_eq!(rowid, 1);

        let descs = driver.single_column("lot", "desc", None, &[]).unwrap();
        assert_eq!(descs, [Value::Text("it's \"quoted\"".into())]);
    }

    #[test]
    fn test_insert_with_nothing_assigned() {
        let driver = driver_with_lot();
        let row = driver.build("lot", Vec::<(&str, Value)>::new()).unwrap();
        assert!(row.assigned_pairs().is_empty());
        driver.insert_row("lot", &row, false).unwrap();

        let mut cursor = driver.select_where("lot", None, &[]).unwrap();
        let rows = cursor.records().unwrap().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap(), &Value::Integer(1));
        assert_eq!(rows[0].get("desc").unwrap(), &Value::Null);
    }

    #[test]
    fn test_insert_or_replace() {
        let driver = driver_with_lot();
        let first = driver.build("lot", [("id", Value::from(7)), ("desc", "old".into())]).unwrap();
        driver.insert_row("lot", &first, false).unwrap();
        assert!(driver.insert_row("lot", &first, false).is_err());

        let second = driver.build("lot", [("id", Value::from(7)), ("desc", "new".into())]).unwrap();
        driver.insert_row("lot", &second, true).unwrap();
        let descs = driver.single_column("lot", "desc", None, &[]).unwrap();
        assert_eq!(descs, [Value::Text("new".into())]);
    }

    #[test]
    fn test_cursor_is_lazy() {
        let driver = driver_with_lot();
        for desc in ["a", "b", "c"] {
            let row = driver.build("lot", [("desc", desc)]).unwrap();
            driver.insert_row("lot", &row, false).unwrap();
        }
        let mut cursor = driver
            .cursor("SELECT \"desc\" FROM \"lot\" ORDER BY \"id\"", &[])
            .unwrap();
        assert_eq!(cursor.column_names(), ["desc"]);
        let mut rows = cursor.rows().unwrap();
        assert_eq!(rows.next().unwrap().unwrap(), [Value::Text("a".into())]);
        assert_eq!(rows.next().unwrap().unwrap(), [Value::Text("b".into())]);
        assert_eq!(rows.next().unwrap().unwrap(), [Value::Text("c".into())]);
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_select_where_binds_params() {
        let driver = driver_with_lot();
        for (desc, price) in [("cheap", 1.0), ("dear", 100.0)] {
            let row = driver
                .build("lot", [("desc", Value::from(desc)), ("price", price.into())])
                .unwrap();
            driver.insert_row("lot", &row, false).unwrap();
        }
        let mut cursor = driver
            .select_where("lot", Some("\"price\" > ?1"), &[Value::Real(10.0)])
            .unwrap();
        let rows = cursor.records().unwrap().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("desc").unwrap().as_str(), Some("dear"));
        // Hydrated rows are locked.
        assert!(rows[0].is_locked());
    }

    #[test]
    fn test_record_cursor_requires_catalog_entry() {
        let driver = driver_with_lot();
        assert!(matches!(
            driver.select_where("auction_house", None, &[]),
            Err(Error::Query(QueryError::UnknownTable(_)))
        ));
        let mut raw = driver.cursor("SELECT 1", &[]).unwrap();
        assert!(matches!(
            raw.records(),
            Err(Error::Query(QueryError::NoRecordSchema))
        ));
    }

    #[test]
    fn test_tables_and_schema_sql() {
        let driver = driver_with_lot();
        assert_eq!(driver.tables().unwrap(), ["auction_house", "lot"]);
        let schema = driver.schema_sql().unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema[1].starts_with("CREATE TABLE \"lot\""));
        driver.drop_table("lot").unwrap();
        assert_eq!(driver.tables().unwrap(), ["auction_house"]);
    }

    #[test]
    fn test_foreign_keys_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fk.db");
        let driver = Driver::open_with(
            &path,
            &DriverConfig {
                foreign_keys: true,
                create_if_missing: true,
            },
        )
        .unwrap();
        driver
            .add_table("auction_house", &[integer("id").primary_key()])
            .unwrap();
        driver.add_table("lot", &lot_columns()).unwrap();
        let err = driver
            .execute(
                "INSERT INTO \"lot\" (\"house_id\") VALUES (?1)",
                &[Value::Integer(42)],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_missing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let config = DriverConfig {
            create_if_missing: false,
            ..DriverConfig::default()
        };
        assert!(Driver::open_with(dir.path().join("absent.db"), &config).is_err());
    }
}
