//! Migration manager.
//!
//! [`MigrationManager`] owns one schema family: a schema id and its ordered
//! migrations. [`MigrationManager::apply`] walks the database from the
//! persisted version to the target, one migration at a time, and then
//! rebuilds the driver's [`Catalog`] by replaying `up` for every migration
//! up to the target against a [`CatalogBuilder`].
//!
//! Each step runs inside a savepoint together with the version slot write,
//! so the slot always names the last step that fully completed. A failed
//! step leaves nothing behind and calling `apply` again resumes from there.

use tracing::{debug, error, info, warn};

use crate::builder::{CatalogBuilder, DdlBuilder};
use crate::catalog::Catalog;
use crate::driver::Driver;
use crate::error::{Direction, Result, SchemaError};
use crate::migration::{latest, validate, Migration};
use crate::version::{VersionSlot, MAX_SCHEMA_ID};

const SAVEPOINT: &str = "sitear_migration";

/// What a call to [`MigrationManager::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Version before the call.
    pub from: u16,
    /// Version after the call.
    pub to: u16,
    /// `None` if the database was already at the target.
    pub direction: Option<Direction>,
    /// Versions whose `up` or `down` ran, in execution order.
    pub steps: Vec<u16>,
}

impl ApplyReport {
    /// Returns true if no migration ran.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Where a database stands relative to a schema family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Persisted slot.
    pub slot: VersionSlot,
    /// Latest known version.
    pub latest: u16,
    /// Versions not yet applied, ascending.
    pub pending: Vec<u16>,
}

impl MigrationStatus {
    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.pending.is_empty()
    }
}

/// A schema family: id plus ordered migrations.
#[derive(Debug, Clone)]
pub struct MigrationManager {
    schema_id: u16,
    migrations: Vec<Migration>,
}

impl MigrationManager {
    /// Creates a manager after checking the schema id and version sequence.
    pub fn new(schema_id: u32, migrations: impl Into<Vec<Migration>>) -> Result<Self> {
        let schema_id = u16::try_from(schema_id)
            .ok()
            .filter(|id| *id != 0 && u32::from(*id) <= MAX_SCHEMA_ID)
            .ok_or(SchemaError::InvalidSchemaId(schema_id))?;
        let migrations = migrations.into();
        validate(&migrations)?;
        Ok(Self {
            schema_id,
            migrations,
        })
    }

    /// Schema family id.
    #[must_use]
    pub fn schema_id(&self) -> u16 {
        self.schema_id
    }

    /// Migrations in version order.
    #[must_use]
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Highest known version.
    #[must_use]
    pub fn latest(&self) -> u16 {
        latest(&self.migrations)
    }

    fn check_slot(&self, slot: VersionSlot) -> Result<()> {
        if !slot.is_blank() && slot.schema_id != self.schema_id {
            return Err(SchemaError::Mismatch {
                database: slot.schema_id,
                expected: self.schema_id,
            }
            .into());
        }
        if slot.version > self.latest() {
            return Err(SchemaError::UnknownDatabaseVersion {
                database: slot.version,
                latest: self.latest(),
            }
            .into());
        }
        Ok(())
    }

    fn check_target(&self, target: u16) -> Result<()> {
        if target > self.latest() {
            return Err(SchemaError::InvalidVersion {
                requested: target,
                latest: self.latest(),
            }
            .into());
        }
        Ok(())
    }

    /// Reports the persisted version and pending migrations.
    pub fn status(&self, driver: &Driver) -> Result<MigrationStatus> {
        let slot = driver.version_slot()?;
        self.check_slot(slot)?;
        Ok(MigrationStatus {
            slot,
            latest: self.latest(),
            pending: self.migrations[usize::from(slot.version)..]
                .iter()
                .map(|m| m.version)
                .collect(),
        })
    }

    /// Brings the database to `target` (latest if `None`) and rebuilds the
    /// driver's catalog.
    ///
    /// The catalog is rebuilt even if no migration had to run.
    pub fn apply(&self, driver: &mut Driver, target: Option<u16>) -> Result<ApplyReport> {
        let target = target.unwrap_or_else(|| self.latest());
        self.check_target(target)?;
        let slot = driver.version_slot()?;
        self.check_slot(slot)?;

        let from = slot.version;
        let mut report = ApplyReport {
            from,
            to: target,
            direction: None,
            steps: Vec::new(),
        };

        if from < target {
            report.direction = Some(Direction::Up);
            for migration in &self.migrations[usize::from(from)..usize::from(target)] {
                self.step(driver, migration, Direction::Up)?;
                report.steps.push(migration.version);
            }
        } else if from > target {
            report.direction = Some(Direction::Down);
            for migration in self.migrations[usize::from(target)..usize::from(from)]
                .iter()
                .rev()
            {
                self.step(driver, migration, Direction::Down)?;
                report.steps.push(migration.version);
            }
        } else {
            debug!(version = from, "Database already at target version");
        }

        let catalog = self.catalog_at(target)?;
        info!(
            version = target,
            tables = catalog.len(),
            "Rebuilt record catalog"
        );
        driver.replace_catalog(catalog);
        Ok(report)
    }

    fn step(&self, driver: &Driver, migration: &Migration, direction: Direction) -> Result<()> {
        let persisted = match direction {
            Direction::Up => migration.version,
            Direction::Down => migration.version - 1,
        };
        info!(
            schema_id = self.schema_id,
            version = migration.version,
            direction = %direction,
            "Applying migration"
        );

        driver.execute_batch(&format!("SAVEPOINT {SAVEPOINT}"))?;
        let result = migration
            .run(&mut DdlBuilder::new(driver), direction)
            .and_then(|()| {
                driver.set_version_slot(u32::from(self.schema_id), u32::from(persisted))
            });

        match result {
            Ok(()) => driver.execute_batch(&format!("RELEASE {SAVEPOINT}")),
            Err(err) => {
                abort_step(driver);
                Err(err)
            }
        }
    }

    /// Builds the catalog for `version` without touching any database.
    pub fn catalog_at(&self, version: u16) -> Result<Catalog> {
        self.check_target(version)?;
        let mut catalog = Catalog::new();
        let mut builder = CatalogBuilder::new(&mut catalog);
        for migration in &self.migrations[..usize::from(version)] {
            migration.run(&mut builder, Direction::Up)?;
        }
        Ok(catalog)
    }
}

/// Undoes a failed step. If the savepoint cannot be rolled back, the whole
/// transaction is, so the connection is back in autocommit either way.
fn abort_step(driver: &Driver) {
    let Err(err) = driver.execute_batch(&format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}"))
    else {
        return;
    };
    warn!(error = %err, "Failed to roll back migration step");
    if let Ok(false) = driver.is_autocommit() {
        if let Err(err) = driver.execute_batch("ROLLBACK") {
            error!(error = %err, "Failed to roll back transaction");
        }
    }
}

/// Validates `migrations` and applies them to `driver` up to `target`.
pub fn apply(
    driver: &mut Driver,
    schema_id: u32,
    migrations: &[Migration],
    target: Option<u16>,
) -> Result<ApplyReport> {
    MigrationManager::new(schema_id, migrations.to_vec())?.apply(driver, target)
}
