use memraster::config;
use memraster::errors::RasterError;
use memraster::raster::{RasterCreationOptions, MEM_MAX_ALLOCATION};
use memraster::DriverManager;

#[test]
fn test_max_allocation() {
    // The process wide option is shared by every test of this binary, so all
    // scenarios run sequentially here.
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();

    config::set_config_option(MEM_MAX_ALLOCATION, "1024").unwrap();
    assert!(driver.create(32, 32, 3).is_ok());
    assert!(matches!(
        driver.create(33, 32, 1),
        Err(RasterError::AllocationFailure { .. })
    ));

    // a pixel interleaved dataset is one allocation
    let options = RasterCreationOptions::from(&[("INTERLEAVE", "PIXEL")]);
    assert!(matches!(
        driver.create_with_band_type_with_options::<u8>(32, 32, 2, &options),
        Err(RasterError::AllocationFailure { .. })
    ));

    // thread local values win, even when they lift the limit
    config::set_thread_local_config_option(MEM_MAX_ALLOCATION, "1000000").unwrap();
    assert!(driver.create(33, 32, 1).is_ok());
    config::clear_thread_local_config_option(MEM_MAX_ALLOCATION).unwrap();

    // unparsable values are ignored
    config::set_config_option(MEM_MAX_ALLOCATION, "lots").unwrap();
    assert!(driver.create(33, 32, 1).is_ok());

    config::clear_config_option(MEM_MAX_ALLOCATION).unwrap();
    assert!(driver.create(64, 64, 1).is_ok());
}
