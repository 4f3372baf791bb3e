//! Migrations and version sequencing.
//!
//! A [`Migration`] is a plain record: a version number and a pair of
//! functions that describe the forward and backward change against a
//! [`SchemaBuilder`]. A schema is an ordered slice of migrations numbered
//! `1..=n` with no gaps.
//!
//! ```rust
//! use sitear_db::column::{integer, text};
//! use sitear_db::migration::{validate, Migration};
//! use sitear_db::{Result, SchemaBuilder};
//!
//! fn up(b: &mut dyn SchemaBuilder) -> Result<()> {
//!     b.add_table("note", &[integer("id").primary_key(), text("body")])
//! }
//!
//! fn down(b: &mut dyn SchemaBuilder) -> Result<()> {
//!     b.drop_table("note")
//! }
//!
//! const SCHEMA: &[Migration] = &[Migration::new(1, up, down)];
//! assert!(validate(SCHEMA).is_ok());
//! ```

use std::fmt;

use crate::builder::SchemaBuilder;
use crate::error::{Direction, Error, Result, SchemaError};

/// A schema transform.
pub type Transform = fn(&mut dyn SchemaBuilder) -> Result<()>;

/// One version's forward and backward schema change.
///
/// `up` and `down` must be structural inverses of each other.
#[derive(Clone, Copy)]
pub struct Migration {
    /// Version this migration brings the schema to.
    pub version: u16,
    /// Forward transform.
    pub up: Transform,
    /// Backward transform.
    pub down: Transform,
}

impl Migration {
    /// Creates a migration.
    #[must_use]
    pub const fn new(version: u16, up: Transform, down: Transform) -> Self {
        Self { version, up, down }
    }

    /// Runs one direction against `builder`.
    ///
    /// Failures are wrapped in [`Error::Migration`] with this version and
    /// direction attached.
    pub fn run(&self, builder: &mut dyn SchemaBuilder, direction: Direction) -> Result<()> {
        let transform = match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        };
        transform(builder).map_err(|source| Error::Migration {
            version: self.version,
            direction,
            source: Box::new(source),
        })
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Checks that versions run `1, 2, 3, ...` with no gaps.
///
/// A list that does not start at 1 and a list with a gap fail with different
/// errors. An empty list is valid.
pub fn validate(migrations: &[Migration]) -> std::result::Result<(), SchemaError> {
    let Some(first) = migrations.first() else {
        return Ok(());
    };
    if first.version != 1 {
        return Err(SchemaError::DoesNotStartAtOne {
            first: first.version,
        });
    }
    for pair in migrations.windows(2) {
        let (previous, found) = (pair[0].version, pair[1].version);
        if found <= previous {
            return Err(SchemaError::InvalidOrdering { previous, found });
        }
        if found != previous + 1 {
            return Err(SchemaError::DoesNotIncrement { previous, found });
        }
    }
    Ok(())
}

/// Highest version in a validated list, 0 if empty.
#[must_use]
pub fn latest(migrations: &[Migration]) -> u16 {
    migrations.last().map_or(0, |m| m.version)
}
