//! Site types.
//!
//! A site type names a schema family. Its index in [`SiteType::ALL`] is the
//! schema id written to the database, so `Generic` must stay first.

use std::fmt;

use clap::ValueEnum;
use sitear_db::Migration;

use crate::auction;

/// Kind of site a database archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SiteType {
    /// Generic viewer. Opens any known database but can not create one.
    Generic,
    /// Auction sites.
    Auction,
}

impl SiteType {
    /// Every site type, indexed by schema id.
    pub const ALL: [SiteType; 2] = [SiteType::Generic, SiteType::Auction];

    /// Site type used when a new database is created without one.
    pub const DEFAULT: SiteType = SiteType::Auction;

    /// Looks up the site type stored under `schema_id`.
    #[must_use]
    pub fn from_schema_id(schema_id: u16) -> Option<Self> {
        Self::ALL.get(usize::from(schema_id)).copied()
    }

    /// Schema id written to the database.
    #[must_use]
    pub fn schema_id(self) -> u16 {
        match self {
            Self::Generic => 0,
            Self::Auction => auction::SCHEMA_ID,
        }
    }

    /// Migrations of this site type; `None` for the generic viewer.
    #[must_use]
    pub fn migrations(self) -> Option<&'static [Migration]> {
        match self {
            Self::Generic => None,
            Self::Auction => Some(auction::MIGRATIONS),
        }
    }

    /// Short name used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Auction => "auction",
        }
    }

    /// One-line description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Generic => "Generic DB viewer (can not be used during DB creation)",
            Self::Auction => "Auction sites",
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_id_matches_index() {
        for (index, site_type) in SiteType::ALL.iter().enumerate() {
            assert_eq!(usize::from(site_type.schema_id()), index);
            assert_eq!(SiteType::from_schema_id(site_type.schema_id()), Some(*site_type));
        }
        assert_eq!(SiteType::from_schema_id(2), None);
    }

    #[test]
    fn test_generic_has_no_schema() {
        assert!(SiteType::Generic.migrations().is_none());
        assert_eq!(SiteType::Auction.migrations().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_value_enum_names() {
        for site_type in SiteType::ALL {
            let parsed = SiteType::from_str(site_type.name(), false).unwrap();
            assert_eq!(parsed, site_type);
        }
    }
}
