//! Opening site databases from disk.

use std::path::PathBuf;

use sitear::bootstrap::{open, open_existing};
use sitear::{BootstrapError, SiteType};
use sitear_db::prelude::*;
use tempfile::TempDir;

fn db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");
    (dir, path)
}

#[test]
fn test_new_database_defaults_to_auction() {
    let (_dir, path) = db_path();
    let session = open(&path, None, &DriverConfig::default(), None).unwrap();

    assert_eq!(session.resolution.site_type, SiteType::Auction);
    assert_eq!(session.report.steps, [1, 2]);
    assert_eq!(
        session.driver.version_slot().unwrap(),
        VersionSlot::new(1, 2).unwrap()
    );
    assert_eq!(
        session.driver.tables().unwrap(),
        ["auction", "auction_house", "auction_location", "lot", "preferences"]
    );
}

#[test]
fn test_generic_can_not_create() {
    let (_dir, path) = db_path();
    let err = open(&path, Some(SiteType::Generic), &DriverConfig::default(), None).unwrap_err();
    assert!(matches!(err, BootstrapError::GenericOnCreate));
    assert!(!path.exists());
}

#[test]
fn test_reopen_upgrades_and_generic_view() {
    let (_dir, path) = db_path();
    let session = open(&path, None, &DriverConfig::default(), Some(1)).unwrap();
    assert!(!session.driver.catalog().contains("auction_location"));
    drop(session);

    let session = open(&path, Some(SiteType::Generic), &DriverConfig::default(), None).unwrap();
    assert!(session.resolution.generic_view);
    assert_eq!(session.resolution.site_type, SiteType::Auction);
    assert_eq!(session.report.from, 1);
    assert_eq!(session.report.steps, [2]);
    assert!(session.driver.catalog().contains("auction_location"));
}

#[test]
fn test_blank_existing_database() {
    let (_dir, path) = db_path();
    let driver = Driver::open(&path).unwrap();
    driver.execute("CREATE TABLE stray (x INTEGER)", &[]).unwrap();
    drop(driver);

    let err = open(&path, None, &DriverConfig::default(), None).unwrap_err();
    assert!(matches!(err, BootstrapError::BlankSchemaId));
}

#[test]
fn test_unknown_schema_id() {
    let (_dir, path) = db_path();
    let driver = Driver::open(&path).unwrap();
    driver.set_version_slot(5, 1).unwrap();
    drop(driver);

    let err = open(&path, None, &DriverConfig::default(), None).unwrap_err();
    assert!(matches!(err, BootstrapError::UnknownSchemaId(5)));
}

#[test]
fn test_open_existing_does_not_create() {
    let (_dir, path) = db_path();
    let err = open_existing(&path, None, &DriverConfig::default()).unwrap_err();
    assert!(matches!(err, BootstrapError::NotFound(ref missing) if missing == &path));
    assert!(!path.exists());

    drop(open(&path, None, &DriverConfig::default(), None).unwrap());
    let session = open_existing(&path, None, &DriverConfig::default()).unwrap();
    assert_eq!(session.resolution.site_type, SiteType::Auction);
    assert!(session.report.is_noop());
}

#[test]
fn test_archive_and_search_lots() {
    let (_dir, path) = db_path();
    let session = open(&path, None, &DriverConfig::default(), None).unwrap();
    let driver = &session.driver;

    let house = driver
        .build("auction_house", [("name", "Acme Auctions")])
        .unwrap();
    let house_id = driver.insert_row("auction_house", &house, false).unwrap();
    for desc in ["red sofa", "red chair", "blue sofa"] {
        let lot = driver
            .build(
                "lot",
                [("house_id", Value::from(house_id)), ("desc", Value::from(desc))],
            )
            .unwrap();
        driver.insert_row("lot", &lot, false).unwrap();
    }

    let terms = SearchTerms::parse("red", "", "chair").unwrap();
    let search = build_search(driver.catalog(), "lot", "desc", &terms, false).unwrap();
    let mut cursor = search.cursor(driver).unwrap();
    let found = cursor.records().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("desc").unwrap().as_str(), Some("red sofa"));
    assert_eq!(found[0].get("house_id").unwrap(), &Value::Integer(house_id));
}
