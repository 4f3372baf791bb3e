//! Migration manager behavior against real SQLite connections.

mod common;

use common::*;
use sitear_db::prelude::*;

#[test]
fn test_structural_round_trip() {
    for migrations in [TWO_STEP, THREE_STEP] {
        let mut driver = memory();
        let manager = manager(migrations);
        manager.apply(&mut driver, None).unwrap();
        assert_eq!(driver.tables().unwrap().len(), migrations.len());

        manager.apply(&mut driver, Some(0)).unwrap();
        assert!(driver.tables().unwrap().is_empty());
        assert!(driver.catalog().is_empty());
    }
}

#[test]
fn test_stepwise_equals_direct() {
    let mut stepwise = memory();
    manager(TWO_STEP).apply(&mut stepwise, Some(1)).unwrap();
    assert_eq!(stepwise.tables().unwrap(), ["house"]);
    manager(TWO_STEP).apply(&mut stepwise, Some(2)).unwrap();

    let mut direct = memory();
    manager(TWO_STEP).apply(&mut direct, Some(2)).unwrap();

    assert_eq!(snapshot(&stepwise), snapshot(&direct));
    assert_eq!(stepwise.catalog(), direct.catalog());
    assert_eq!(
        stepwise.version_slot().unwrap(),
        direct.version_slot().unwrap()
    );
}

#[test]
fn test_catalog_matches_tables() {
    let mut driver = memory();
    manager(THREE_STEP).apply(&mut driver, Some(2)).unwrap();
    let tables = driver.tables().unwrap();
    let catalog: Vec<&str> = driver.catalog().tables().collect();
    assert_eq!(tables, catalog);

    let lot = driver.catalog().get("lot").unwrap();
    assert_eq!(lot.columns(), ["id", "house_id", "desc", "price"]);
}

#[test]
fn test_failed_up_leaves_checkpoint() {
    let mut driver = memory();
    let err = manager(BROKEN_UP).apply(&mut driver, None).unwrap_err();
    assert!(matches!(
        err,
        Error::Migration {
            version: 3,
            direction: Direction::Up,
            ..
        }
    ));

    // v1 and v2 are committed, the partial v3 is not.
    let slot = driver.version_slot().unwrap();
    assert_eq!(u32::from(slot.schema_id), SCHEMA_ID);
    assert_eq!(slot.version, 2);
    assert_eq!(driver.tables().unwrap(), ["house", "lot"]);

    let report = manager(THREE_STEP).apply(&mut driver, None).unwrap();
    assert_eq!(report.from, 2);
    assert_eq!(report.steps, [3]);
    assert_eq!(driver.tables().unwrap(), ["house", "lot", "note"]);

    // Resuming again is a no-op.
    let report = manager(THREE_STEP).apply(&mut driver, None).unwrap();
    assert!(report.is_noop());
}

#[test]
fn test_failed_down_leaves_checkpoint() {
    let mut driver = memory();
    manager(THREE_STEP).apply(&mut driver, None).unwrap();

    let err = manager(BROKEN_DOWN)
        .apply(&mut driver, Some(0))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Migration {
            version: 2,
            direction: Direction::Down,
            ..
        }
    ));
    assert_eq!(driver.version_slot().unwrap().version, 2);
    assert_eq!(driver.tables().unwrap(), ["house", "lot"]);

    let report = manager(THREE_STEP).apply(&mut driver, Some(0)).unwrap();
    assert_eq!(report.steps, [2, 1]);
    assert!(driver.tables().unwrap().is_empty());
}

#[test]
fn test_schema_family_mismatch() {
    let mut driver = memory();
    manager(TWO_STEP).apply(&mut driver, None).unwrap();

    let other = MigrationManager::new(SCHEMA_ID + 1, TWO_STEP).unwrap();
    assert!(matches!(
        other.apply(&mut driver, None),
        Err(Error::Schema(SchemaError::Mismatch { .. }))
    ));
    assert!(other.status(&driver).is_err());
}

#[test]
fn test_validate_distinct_errors() {
    fn noop(_: &mut dyn SchemaBuilder) -> Result<()> {
        Ok(())
    }
    let gap = [Migration::new(1, noop, noop), Migration::new(3, noop, noop)];
    let start = [Migration::new(2, noop, noop), Migration::new(1, noop, noop)];

    assert!(matches!(
        validate(&gap),
        Err(SchemaError::DoesNotIncrement { .. })
    ));
    assert!(matches!(
        validate(&start),
        Err(SchemaError::DoesNotStartAtOne { .. })
    ));
    assert!(MigrationManager::new(SCHEMA_ID, gap).is_err());
}

#[test]
fn test_progress_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archive.db");

    let mut driver = Driver::open(&path).unwrap();
    manager(THREE_STEP).apply(&mut driver, Some(2)).unwrap();
    insert_lots(&driver, &["red sofa"]);
    driver.close().unwrap();

    let mut driver = Driver::open(&path).unwrap();
    assert!(driver.catalog().is_empty());
    let status = manager(THREE_STEP).status(&driver).unwrap();
    assert_eq!(status.slot.version, 2);
    assert_eq!(status.pending, [3]);

    // A no-op apply still restores the catalog.
    manager(THREE_STEP).apply(&mut driver, Some(2)).unwrap();
    let rows = collect(driver.select_where("lot", None, &[]).unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("desc").unwrap().as_str(), Some("red sofa"));
}
