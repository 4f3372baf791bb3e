//! Site archiver application layer.
//!
//! Everything here sits on top of [`sitear_db`]: the concrete schema families
//! (currently only [`auction`]), the [`site::SiteType`] registry that maps
//! them to schema ids, and [`bootstrap`], which opens and migrates a database
//! before anything else runs.

pub mod auction;
pub mod bootstrap;
pub mod error;
pub mod site;

pub use bootstrap::{open, Resolution, Session};
pub use error::{BootstrapError, Result};
pub use site::SiteType;
