use crate::errors::{RasterError, Result};
use crate::raster::{DataType, Interleave, RasterSource};
use crate::GeoTransform;

/// A synthetic raster where band `b` holds `(x + y * width + b) % 256` as `u8`.
///
/// Stands in for a file based dataset when testing copies.
pub struct Ramp {
    pub size: (usize, usize),
    pub bands: usize,
    pub no_data: Option<f64>,
}

impl Ramp {
    pub fn new(size: (usize, usize), bands: usize) -> Self {
        Ramp {
            size,
            bands,
            no_data: None,
        }
    }

    pub fn value(&self, band_index: usize, x: usize, y: usize) -> u8 {
        ((x + y * self.size.0 + band_index) % 256) as u8
    }
}

impl RasterSource for Ramp {
    fn raster_size(&self) -> (usize, usize) {
        self.size
    }

    fn raster_count(&self) -> usize {
        self.bands
    }

    fn band_type(&self, band_index: usize) -> Result<DataType> {
        if band_index == 0 || band_index > self.bands {
            return Err(RasterError::InvalidBandIndex {
                index: band_index,
                count: self.bands,
            });
        }
        Ok(DataType::UInt8)
    }

    fn read_band_bytes(
        &self,
        band_index: usize,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer: &mut [u8],
    ) -> Result<()> {
        self.band_type(band_index)?;
        let (x0, y0) = (window.0 as usize, window.1 as usize);
        for y in 0..window_size.1 {
            for x in 0..window_size.0 {
                buffer[y * window_size.0 + x] = self.value(band_index, x0 + x, y0 + y);
            }
        }
        Ok(())
    }

    fn interleave(&self) -> Option<Interleave> {
        Some(Interleave::Pixel)
    }

    fn projection(&self) -> Option<String> {
        Some("EPSG:4326".to_string())
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        Some([-180.0, 0.5, 0.0, 90.0, 0.0, -0.5])
    }

    fn no_data_value(&self, _band_index: usize) -> Option<f64> {
        self.no_data
    }
}

/// Assert numerical difference between two expressions is less than
/// 64-bit machine epsilon or a specified epsilon.
///
/// # Examples:
/// ```rust, no_run
/// use memraster::assert_near;
/// use std::f64::consts::{PI, E};
/// assert_near!(PI / E, 1.1557273497909217);
/// // with specified epsilon
/// assert_near!(PI / E, 1.15572734, epsilon = 1e-8);
/// ```
#[macro_export]
macro_rules! assert_near {
    ($left:expr, $right:expr) => {
        $crate::assert_near!($left, $right, epsilon = f64::EPSILON)
    };
    ($left:expr, $right:expr, epsilon = $ep:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "|{} - {}| = {} is greater than epsilon {:.4e}",
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
}
