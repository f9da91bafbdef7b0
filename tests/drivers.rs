use memraster::errors::RasterError;
use memraster::DriverManager;

#[test]
fn test_get_driver() {
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();
    assert_eq!(driver.short_name(), "MEM");
    assert_eq!(driver.long_name(), "In Memory Raster");

    assert!(DriverManager::count() > 0);
    assert!(DriverManager::get_driver(0).is_ok());
    assert!(DriverManager::get_driver(DriverManager::count()).is_err());
}

#[test]
fn test_unknown_driver() {
    match DriverManager::get_driver_by_name("GTiff") {
        Err(RasterError::UnknownDriver(name)) => assert_eq!(name, "GTiff"),
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_dataset_driver() {
    let driver = DriverManager::get_driver_by_name("mem").unwrap();
    let dataset = driver.create(1, 1, 1).unwrap();
    assert_eq!(dataset.driver(), driver);
}
