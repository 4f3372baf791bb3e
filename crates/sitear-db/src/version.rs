//! The persisted version slot.
//!
//! SQLite's `user_version` is a signed 32-bit integer. It is used here as an
//! unsigned bitfield: bits 16..=30 hold the schema id and bits 0..=15 hold
//! the schema version. Bit 31 is never set. A schema id of 0 means no schema
//! has ever been applied to the file.

use crate::error::{Error, Result};

/// Largest schema id (15 bits).
pub const MAX_SCHEMA_ID: u32 = (1 << 15) - 1;

/// Largest schema version (16 bits).
pub const MAX_VERSION: u32 = (1 << 16) - 1;

/// Largest raw slot value (31 bits).
pub const MAX_RAW: i64 = (1 << 31) - 1;

/// Decoded `(schema id, version)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionSlot {
    /// Schema family id.
    pub schema_id: u16,
    /// Schema version.
    pub version: u16,
}

impl VersionSlot {
    /// Creates a slot, checking both fields against their bit budgets.
    pub fn new(schema_id: u32, version: u32) -> Result<Self> {
        let schema_id = u16::try_from(schema_id)
            .ok()
            .filter(|id| u32::from(*id) <= MAX_SCHEMA_ID)
            .ok_or(Error::OutOfRange {
                what: "schema_id",
                value: i64::from(schema_id),
                max: i64::from(MAX_SCHEMA_ID),
            })?;
        let version = u16::try_from(version).map_err(|_| Error::OutOfRange {
            what: "version",
            value: i64::from(version),
            max: i64::from(MAX_VERSION),
        })?;
        Ok(Self { schema_id, version })
    }

    /// Packs the slot into its raw form.
    #[must_use]
    pub fn encode(self) -> i32 {
        (i32::from(self.schema_id) << 16) | i32::from(self.version)
    }

    /// Unpacks a raw slot.
    pub fn decode(raw: i32) -> Result<Self> {
        let raw = u32::try_from(raw).map_err(|_| Error::OutOfRange {
            what: "user_version",
            value: i64::from(raw),
            max: MAX_RAW,
        })?;
        Self::new(raw >> 16, raw & 0xFFFF)
    }

    /// Returns true if no schema was ever applied.
    #[must_use]
    pub fn is_blank(self) -> bool {
        self.schema_id == 0
    }
}

/// Encodes `(schema_id, version)` into a raw slot value.
pub fn encode(schema_id: u32, version: u32) -> Result<i32> {
    VersionSlot::new(schema_id, version).map(VersionSlot::encode)
}

/// Decodes a raw slot value into `(schema_id, version)`.
pub fn decode(raw: i32) -> Result<(u16, u16)> {
    VersionSlot::decode(raw).map(|slot| (slot.schema_id, slot.version))
}
