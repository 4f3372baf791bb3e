//! Free-text search over one column.
//!
//! A search combines three term groups on a single column:
//!
//! - `all`: every term must match, `(t1 AND t2 ...)`
//! - `any`: at least one term must match, `(t1 OR t2 ...)`
//! - `not`: no term may match, `NOT (t1 OR t2 ...)`
//!
//! Empty groups are left out. Each term becomes `"column" LIKE ?` with
//! `%term%` bound as the parameter.
//!
//! ```rust
//! use sitear_db::column::{integer, text};
//! use sitear_db::search::{build_search, SearchTerms};
//! use sitear_db::Catalog;
//!
//! let mut catalog = Catalog::new();
//! catalog.define("lot", &[integer("id").primary_key(), text("desc")]);
//!
//! let terms = SearchTerms::parse("red", "", "chair").unwrap();
//! let search = build_search(&catalog, "lot", "desc", &terms, false).unwrap();
//! assert_eq!(
//!     search.sql(),
//!     r#"SELECT "id", "desc" FROM "lot" WHERE ("desc" LIKE ?) AND NOT ("desc" LIKE ?) COLLATE NOCASE"#
//! );
//! ```

use crate::catalog::Catalog;
use crate::column::quote_ident;
use crate::driver::{select_all_sql, Cursor, Driver};
use crate::error::{QueryError, Result};
use crate::terms::split_terms;
use crate::value::Value;

/// Term groups for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    /// Terms that must all match.
    pub all: Vec<String>,
    /// Terms of which at least one must match.
    pub any: Vec<String>,
    /// Terms that must not match.
    pub not: Vec<String>,
}

impl SearchTerms {
    /// Tokenizes three free-text inputs.
    pub fn parse(all: &str, any: &str, not: &str) -> std::result::Result<Self, QueryError> {
        Ok(Self {
            all: split_terms(all)?,
            any: split_terms(any)?,
            not: split_terms(not)?,
        })
    }

    /// Returns true if every group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty() && self.not.is_empty()
    }
}

/// One `LIKE` fragment and the pattern bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct LikeTerm {
    /// SQL fragment with one positional placeholder.
    pub fragment: String,
    /// `%term%`.
    pub pattern: Value,
}

/// A ready-to-run search.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    table: String,
    sql: String,
    params: Vec<Value>,
    case_sensitive: bool,
}

impl Search {
    /// Table searched.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Full statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound patterns in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Returns true if matching is case sensitive.
    #[must_use]
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Prepares a record cursor for this search.
    ///
    /// Case-sensitive matching lasts as long as the cursor does.
    pub fn cursor<'d>(&self, driver: &'d Driver) -> Result<Cursor<'d>> {
        driver.like_cursor(&self.table, &self.sql, &self.params, self.case_sensitive)
    }
}

/// Builds one `LIKE` fragment per term.
#[must_use]
pub fn compose_like<S: AsRef<str>>(column: &str, terms: &[S]) -> Vec<LikeTerm> {
    let column = quote_ident(column);
    terms
        .iter()
        .map(|term| LikeTerm {
            fragment: format!("{column} LIKE ?"),
            pattern: Value::Text(format!("%{}%", term.as_ref())),
        })
        .collect()
}

fn group(
    column: &str,
    terms: &[String],
    joiner: &str,
    negate: bool,
    clauses: &mut Vec<String>,
    params: &mut Vec<Value>,
) {
    if terms.is_empty() {
        return;
    }
    let likes = compose_like(column, terms);
    let body = likes
        .iter()
        .map(|l| l.fragment.as_str())
        .collect::<Vec<_>>()
        .join(joiner);
    let prefix = if negate { "NOT " } else { "" };
    clauses.push(format!("{prefix}({body})"));
    params.extend(likes.into_iter().map(|l| l.pattern));
}

/// Composes a search over `table.column`.
///
/// Case-insensitive searches end with `COLLATE NOCASE`. With every group
/// empty the search selects the whole table.
pub fn build_search(
    catalog: &Catalog,
    table: &str,
    column: &str,
    terms: &SearchTerms,
    case_sensitive: bool,
) -> std::result::Result<Search, QueryError> {
    if table.is_empty() {
        return Err(QueryError::InvalidTable(table.to_string()));
    }
    if column.is_empty() {
        return Err(QueryError::InvalidColumn(column.to_string()));
    }
    let schema = catalog
        .get(table)
        .ok_or_else(|| QueryError::UnknownTable(table.to_string()))?;
    if !schema.has_column(column) {
        return Err(QueryError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        });
    }

    let mut clauses = Vec::new();
    let mut params = Vec::new();
    group(column, &terms.all, " AND ", false, &mut clauses, &mut params);
    group(column, &terms.any, " OR ", false, &mut clauses, &mut params);
    group(column, &terms.not, " OR ", true, &mut clauses, &mut params);

    let mut sql = select_all_sql(schema);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        if !case_sensitive {
            sql.push_str(" COLLATE NOCASE");
        }
    }

    Ok(Search {
        table: table.to_string(),
        sql,
        params,
        case_sensitive,
    })
}
