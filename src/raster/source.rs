use crate::dataset::GeoTransform;
use crate::errors::Result;
use crate::raster::{DataType, Interleave};

/// A raster that can be copied with [`Driver::create_copy`](crate::Driver::create_copy).
///
/// Band indices are 1-based. Only the size, the band types and the pixels are
/// required; the georeferencing methods default to "not set".
pub trait RasterSource {
    /// Raster dimensions: (width, height).
    fn raster_size(&self) -> (usize, usize);

    fn raster_count(&self) -> usize;

    fn band_type(&self, band_index: usize) -> Result<DataType>;

    /// Read `window_size` pixels at `window` of a band, packed, in the band's own type.
    fn read_band_bytes(
        &self,
        band_index: usize,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer: &mut [u8],
    ) -> Result<()>;

    fn interleave(&self) -> Option<Interleave> {
        None
    }

    fn projection(&self) -> Option<String> {
        None
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        None
    }

    fn no_data_value(&self, _band_index: usize) -> Option<f64> {
        None
    }
}
