#![allow(dead_code)]

use sitear_db::prelude::*;

pub const SCHEMA_ID: u32 = 7;

fn up_house(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.add_table(
        "house",
        &[integer("id").primary_key().unique().protected(), text("name")],
    )
}

fn down_house(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.drop_table("house")
}

fn up_lot(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.add_table(
        "lot",
        &[
            integer("id").primary_key().unique().protected(),
            integer("house_id"),
            text("desc"),
            real("price").default(0.0),
            foreign_key("house_id", "house", "id"),
        ],
    )
}

fn down_lot(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.drop_table("lot")
}

fn up_note(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.add_table("note", &[integer("id").primary_key(), text("body")])
}

fn down_note(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.drop_table("note")
}

fn up_note_broken(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.add_table("note", &[integer("id").primary_key(), text("body")])?;
    // Second table collides with an existing one.
    b.add_table("house", &[integer("id")])
}

fn down_lot_broken(b: &mut dyn SchemaBuilder) -> Result<()> {
    b.drop_table("lot")?;
    b.drop_table("missing")
}

/// v1 adds `house`, v2 adds `lot`.
pub const TWO_STEP: &[Migration] = &[
    Migration::new(1, up_house, down_house),
    Migration::new(2, up_lot, down_lot),
];

/// Like [`TWO_STEP`] plus v3 adding `note`.
pub const THREE_STEP: &[Migration] = &[
    Migration::new(1, up_house, down_house),
    Migration::new(2, up_lot, down_lot),
    Migration::new(3, up_note, down_note),
];

/// v3 fails half way through its `up`.
pub const BROKEN_UP: &[Migration] = &[
    Migration::new(1, up_house, down_house),
    Migration::new(2, up_lot, down_lot),
    Migration::new(3, up_note_broken, down_note),
];

/// v2 fails half way through its `down`.
pub const BROKEN_DOWN: &[Migration] = &[
    Migration::new(1, up_house, down_house),
    Migration::new(2, up_lot, down_lot_broken),
    Migration::new(3, up_note, down_note),
];

pub fn manager(migrations: &[Migration]) -> MigrationManager {
    MigrationManager::new(SCHEMA_ID, migrations).unwrap()
}

pub fn memory() -> Driver {
    Driver::open_in_memory().unwrap()
}

/// Tables plus their `CREATE` statements.
pub fn snapshot(driver: &Driver) -> (Vec<String>, Vec<String>) {
    (driver.tables().unwrap(), driver.schema_sql().unwrap())
}

/// Inserts one lot per description.
pub fn insert_lots(driver: &Driver, descs: &[&str]) {
    for desc in descs {
        let row = driver.build("lot", [("desc", *desc)]).unwrap();
        driver.insert_row("lot", &row, false).unwrap();
    }
}

/// Reads every row of a record cursor.
pub fn collect(mut cursor: Cursor<'_>) -> Vec<Row> {
    cursor
        .records()
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap()
}
