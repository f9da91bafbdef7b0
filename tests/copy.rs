use memraster::errors::{RasterError, Result};
use memraster::raster::{DataType, Interleave, RasterCreationOptions, RasterIoOptions, RasterSource};
use memraster::{DriverManager, Metadata};

/// Three bands of different types: a `u8` row index, a `f32` column index
/// and an `i16` negated sum of both.
struct Mixed {
    size: (usize, usize),
}

impl Mixed {
    fn value(&self, band_index: usize, x: usize, y: usize) -> f64 {
        match band_index {
            1 => y as f64,
            2 => x as f64 + 0.25,
            _ => -((x + y) as f64),
        }
    }
}

impl RasterSource for Mixed {
    fn raster_size(&self) -> (usize, usize) {
        self.size
    }

    fn raster_count(&self) -> usize {
        3
    }

    fn band_type(&self, band_index: usize) -> Result<DataType> {
        match band_index {
            1 => Ok(DataType::UInt8),
            2 => Ok(DataType::Float32),
            3 => Ok(DataType::Int16),
            index => Err(RasterError::InvalidBandIndex { index, count: 3 }),
        }
    }

    fn read_band_bytes(
        &self,
        band_index: usize,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer: &mut [u8],
    ) -> Result<()> {
        let data_type = self.band_type(band_index)?;
        let mut offset = 0;
        for y in 0..window_size.1 {
            for x in 0..window_size.0 {
                let v = self.value(band_index, window.0 as usize + x, window.1 as usize + y);
                let bytes = match data_type {
                    DataType::UInt8 => vec![v as u8],
                    DataType::Float32 => (v as f32).to_ne_bytes().to_vec(),
                    _ => (v as i16).to_ne_bytes().to_vec(),
                };
                buffer[offset..offset + bytes.len()].copy_from_slice(&bytes);
                offset += bytes.len();
            }
        }
        Ok(())
    }

    fn no_data_value(&self, band_index: usize) -> Option<f64> {
        (band_index == 3).then_some(-1.0)
    }
}

#[test]
fn test_copy_mixed_types() {
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();
    let source = Mixed { size: (6, 4) };
    for interleave in ["BAND", "PIXEL"] {
        let options = RasterCreationOptions::from(&[("INTERLEAVE", interleave)]);
        let ds = driver.create_copy(&source, &options).unwrap();
        assert_eq!(ds.raster_size(), (6, 4));
        assert_eq!(ds.interleave().as_str(), interleave);

        let types = ds.rasterbands().map(|b| b.band_type()).collect::<Vec<_>>();
        assert_eq!(types, vec![DataType::UInt8, DataType::Float32, DataType::Int16]);

        let rows = ds.rasterband(1).unwrap().read_band_as::<u8>().unwrap();
        assert_eq!(rows.get(5, 3), Some(3));
        let cols = ds.rasterband(2).unwrap().read_band_as::<f32>().unwrap();
        assert_eq!(cols.get(5, 3), Some(5.25));
        let sums = ds.rasterband(3).unwrap().read_band_as::<i16>().unwrap();
        assert_eq!(sums.get(5, 3), Some(-8));

        assert_eq!(ds.rasterband(3).unwrap().no_data_value(), Some(-1.0));
        assert_eq!(ds.rasterband(1).unwrap().no_data_value(), None);
        assert!(ds.geo_transform().is_err());
    }
}

#[test]
fn test_copy_dataset() {
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();
    let options = RasterCreationOptions::from(&[("INTERLEAVE", "PIXEL")]);
    let mut ds = driver
        .create_with_band_type_with_options::<u16>(5, 5, 2, &options)
        .unwrap();
    ds.set_projection("EPSG:3857").unwrap();
    ds.set_geo_transform(&[0.0, 10.0, 0.0, 0.0, 0.0, -10.0])
        .unwrap();
    ds.rasterband(2).unwrap().fill(1000.0).unwrap();

    // interleaving follows the source unless given
    let copy = ds.create_copy(&driver, &RasterCreationOptions::default()).unwrap();
    assert_eq!(copy.interleave(), Interleave::Pixel);
    assert_eq!(copy.projection(), "EPSG:3857");
    assert_eq!(copy.geo_transform().unwrap()[1], 10.0);
    assert_eq!(
        copy.metadata_item("INTERLEAVE", "IMAGE_STRUCTURE"),
        Some("PIXEL".to_string())
    );
    assert_eq!(copy.rasterband(2).unwrap().checksum((0, 0), (5, 5)).unwrap(), {
        ds.rasterband(2).unwrap().checksum((0, 0), (5, 5)).unwrap()
    });

    // the copy owns its pixels
    ds.rasterband(2).unwrap().fill(0.0).unwrap();
    let mut buf = vec![0u8; 5 * 5 * 2];
    copy.read_raster_bytes((0, 0), (5, 5), (5, 5), &[2], &mut buf, &RasterIoOptions::default())
        .unwrap();
    assert!(buf
        .chunks(2)
        .all(|c| u16::from_ne_bytes([c[0], c[1]]) == 1000));

    let options = RasterCreationOptions::from(&[("INTERLEAVE", "BAND")]);
    let banded = ds.create_copy(&driver, &options).unwrap();
    assert_eq!(banded.interleave(), Interleave::Band);
}
