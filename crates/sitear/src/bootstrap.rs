//! Opening a site database.
//!
//! Bootstrap decides which schema family a database belongs to, then brings
//! it to the requested version before anything else touches it:
//!
//! - a new database takes the requested site type, or the default one; the
//!   generic viewer can not create a database
//! - an existing database keeps its stored site type; asking for another one
//!   fails, asking for the generic viewer opens it in view mode

use std::path::Path;

use sitear_db::{ApplyReport, Driver, DriverConfig, MigrationManager, VersionSlot};
use tracing::info;

use crate::error::{BootstrapError, Result};
use crate::site::SiteType;

/// Site type and view mode chosen for a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Schema family of the database.
    pub site_type: SiteType,
    /// Opened through the generic viewer.
    pub generic_view: bool,
}

/// An open, migrated site database.
#[derive(Debug)]
pub struct Session {
    /// Connection with a populated catalog.
    pub driver: Driver,
    /// Site type and view mode.
    pub resolution: Resolution,
    /// What the migration run did.
    pub report: ApplyReport,
}

/// Picks the site type for a database.
///
/// `existing` is `None` for a database that does not exist yet.
pub fn resolve(requested: Option<SiteType>, existing: Option<VersionSlot>) -> Result<Resolution> {
    let Some(slot) = existing else {
        return match requested.unwrap_or(SiteType::DEFAULT) {
            SiteType::Generic => Err(BootstrapError::GenericOnCreate),
            site_type => Ok(Resolution {
                site_type,
                generic_view: false,
            }),
        };
    };

    if slot.is_blank() {
        return Err(BootstrapError::BlankSchemaId);
    }
    let stored = SiteType::from_schema_id(slot.schema_id)
        .ok_or(BootstrapError::UnknownSchemaId(slot.schema_id))?;

    match requested {
        None => Ok(Resolution {
            site_type: stored,
            generic_view: false,
        }),
        Some(SiteType::Generic) => Ok(Resolution {
            site_type: stored,
            generic_view: true,
        }),
        Some(requested) if requested == stored => Ok(Resolution {
            site_type: stored,
            generic_view: false,
        }),
        Some(requested) => Err(BootstrapError::SiteTypeMismatch { requested, stored }),
    }
}

/// Migrates `driver` to `target` (latest if `None`) for `site_type`.
pub fn migrate(driver: &mut Driver, site_type: SiteType, target: Option<u16>) -> Result<ApplyReport> {
    let migrations = site_type
        .migrations()
        .ok_or(BootstrapError::GenericOnCreate)?;
    let manager = MigrationManager::new(u32::from(site_type.schema_id()), migrations)?;
    Ok(manager.apply(driver, target)?)
}

/// Opens the database at `path`, resolves its site type and migrates it.
pub fn open(
    path: &Path,
    requested: Option<SiteType>,
    config: &DriverConfig,
    target: Option<u16>,
) -> Result<Session> {
    let is_new = !path.is_file();
    if is_new {
        // Fail before the file gets created.
        resolve(requested, None)?;
    }

    let mut driver = Driver::open_with(path, config)?;
    let existing = if is_new {
        None
    } else {
        Some(driver.version_slot()?)
    };
    let resolution = resolve(requested, existing)?;
    info!(
        path = %path.display(),
        site_type = %resolution.site_type,
        generic_view = resolution.generic_view,
        new = is_new,
        "Opening site database"
    );

    let report = migrate(&mut driver, resolution.site_type, target)?;
    Ok(Session {
        driver,
        resolution,
        report,
    })
}

/// Opens an existing database and migrates it to the latest version.
///
/// Unlike [`open`], a missing file is an error instead of a new archive.
pub fn open_existing(
    path: &Path,
    requested: Option<SiteType>,
    config: &DriverConfig,
) -> Result<Session> {
    if !path.is_file() {
        return Err(BootstrapError::NotFound(path.to_path_buf()));
    }
    let config = DriverConfig {
        create_if_missing: false,
        ..*config
    };
    open(path, requested, &config, None)
}
