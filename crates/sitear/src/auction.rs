//! Auction site schema.
//!
//! Schema family 1. Version 1 holds auction houses, their auctions and the
//! lots in each auction, plus the key/value preferences table every site
//! type carries. Version 2 adds geocoded auction locations.

use sitear_db::column::{date, foreign_key, integer, real, text};
use sitear_db::{Migration, Result, SchemaBuilder};

/// Schema family id of auction databases.
pub const SCHEMA_ID: u16 = 1;

/// Auction migrations in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration::new(1, houses_auctions_lots_up, houses_auctions_lots_down),
    Migration::new(2, locations_up, locations_down),
];

/// Adds the `preferences(key, value)` table.
pub fn preferences_up(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.add_table("preferences", &[text("key").primary_key(), text("value")])
}

/// Drops the `preferences` table.
pub fn preferences_down(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.drop_table("preferences")
}

fn houses_auctions_lots_up(b: &mut dyn SchemaBuilder) -> Result<()> {
    preferences_up(b)?;

    b.add_table(
        "auction_house",
        &[
            integer("id").primary_key().unique().protected(),
            text("name"),
            text("url"),
        ],
    )?;

    b.add_table(
        "auction",
        &[
            integer("id").primary_key().unique().protected(),
            integer("house_id"),
            text("vendor_id"),
            text("name"),
            text("location"),
            date("start_date"),
            date("end_date"),
            integer("closed"),
            text("url"),
            text("status"),
            foreign_key("house_id", "auction_house", "id"),
        ],
    )?;

    b.add_table(
        "lot",
        &[
            integer("id").primary_key().unique().protected(),
            integer("house_id"),
            integer("auction_id"),
            text("vendor_id"),
            text("desc"),
            real("price"),
            text("img"),
            text("url"),
            foreign_key("house_id", "auction_house", "id"),
            foreign_key("auction_id", "auction", "id"),
        ],
    )
}

fn houses_auctions_lots_down(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.drop_table("lot")?;
    b.drop_table("auction")?;
    b.drop_table("auction_house")?;
    preferences_down(b)
}

fn locations_up(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.add_table(
        "auction_location",
        &[
            integer("id").primary_key().unique().protected(),
            text("name"),
            real("lat").default(0.0),
            real("lon").default(0.0),
        ],
    )
}

fn locations_down(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.drop_table("auction_location")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitear_db::migration::validate;
    use sitear_db::{Driver, MigrationManager, Value};

    #[test]
    fn test_sequence_is_valid() {
        assert!(validate(MIGRATIONS).is_ok());
    }

    #[test]
    fn test_catalog_shapes() {
        let manager = MigrationManager::new(u32::from(SCHEMA_ID), MIGRATIONS).unwrap();
        let v1 = manager.catalog_at(1).unwrap();
        assert_eq!(
            v1.tables().collect::<Vec<_>>(),
            ["auction", "auction_house", "lot", "preferences"]
        );
        assert_eq!(
            v1.get("lot").unwrap().columns(),
            ["id", "house_id", "auction_id", "vendor_id", "desc", "price", "img", "url"]
        );

        let v2 = manager.catalog_at(2).unwrap();
        let location = v2.build("auction_location", [("name", "Hall")]).unwrap();
        assert_eq!(location.get("lat").unwrap(), &Value::Real(0.0));
        assert!(v2.get("auction_location").unwrap().is_protected("id"));
    }

    #[test]
    fn test_foreign_keys_hold() {
        let mut driver = Driver::open_with(
            ":memory:",
            &sitear_db::DriverConfig {
                foreign_keys: true,
                ..Default::default()
            },
        )
        .unwrap();
        MigrationManager::new(u32::from(SCHEMA_ID), MIGRATIONS)
            .unwrap()
            .apply(&mut driver, None)
            .unwrap();

        let house = driver
            .build("auction_house", [("name", "Acme"), ("url", "http://acme")])
            .unwrap();
        let house_id = driver.insert_row("auction_house", &house, false).unwrap();

        let lot = driver
            .build("lot", [("house_id", Value::from(house_id)), ("desc", "chair".into())])
            .unwrap();
        driver.insert_row("lot", &lot, false).unwrap();

        let orphan = driver
            .build("lot", [("house_id", Value::from(house_id + 1))])
            .unwrap();
        assert!(driver.insert_row("lot", &orphan, false).is_err());
    }
}
