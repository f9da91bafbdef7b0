use crate::dataset::Dataset;
use crate::errors::{RasterError, Result};
use crate::raster::storage::DatasetState;
use crate::raster::{
    BufferDescriptor, DataType, Interleave, RasterCreationOptions, RasterIoOptions, RasterSource,
    RasterType,
};

const MEM_SHORT_NAME: &str = "MEM";
const MEM_LONG_NAME: &str = "In Memory Raster";

/// Creates datasets.
///
/// The only driver is `MEM`, which keeps every dataset in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Driver {
    short_name: &'static str,
    long_name: &'static str,
}

impl Driver {
    pub(crate) fn mem() -> Self {
        Driver {
            short_name: MEM_SHORT_NAME,
            long_name: MEM_LONG_NAME,
        }
    }

    /// Return the short name of a driver.
    ///
    /// For the in-memory driver, this is "MEM".
    pub fn short_name(&self) -> String {
        self.short_name.to_string()
    }

    /// Return the long name of a driver.
    pub fn long_name(&self) -> String {
        self.long_name.to_string()
    }

    /// Create a new dataset of size (`size_x`, `size_y`) and `bands` band count,
    /// and [`u8`] as the cell data type.
    ///
    /// To specify an alternative data type (e.g. [`f32`]), use [`Driver::create_with_band_type`].
    ///
    /// # Example
    ///
    /// ```
    /// # fn main() -> memraster::errors::Result<()> {
    /// use memraster::DriverManager;
    /// use memraster::raster::DataType;
    /// let d = DriverManager::get_driver_by_name("MEM")?;
    /// let ds = d.create(300, 400, 3)?;
    /// assert_eq!(ds.raster_count(), 3);
    /// assert_eq!(ds.raster_size(), (300, 400));
    /// assert_eq!(ds.rasterband(1)?.band_type(), DataType::UInt8);
    /// # Ok(())
    /// # }
    /// ```
    pub fn create(&self, size_x: usize, size_y: usize, bands: usize) -> Result<Dataset> {
        self.create_with_band_type::<u8>(size_x, size_y, bands)
    }

    /// Create a new dataset of size (`size_x`, `size_y`) and `bands` band count,
    /// with cell data type specified by `T`.
    pub fn create_with_band_type<T: RasterType>(
        &self,
        size_x: usize,
        size_y: usize,
        bands: usize,
    ) -> Result<Dataset> {
        let options = Default::default();
        self.create_with_band_type_with_options::<T>(size_x, size_y, bands, &options)
    }

    /// Create a new dataset of size (`size_x`, `size_y`) and `bands` band count,
    /// with cell data type specified by `T` and extended options specified via `options`.
    ///
    /// See [`RasterCreationOptions`] for the recognized options.
    pub fn create_with_band_type_with_options<T: RasterType>(
        &self,
        size_x: usize,
        size_y: usize,
        bands: usize,
        options: &RasterCreationOptions,
    ) -> Result<Dataset> {
        self.create_with_data_type(size_x, size_y, bands, T::datatype(), options)
    }

    /// Create a new dataset with the cell data type given at runtime.
    ///
    /// Fails with [`RasterError::AllocationFailure`] if the pixel storage
    /// cannot be allocated or its size overflows.
    pub fn create_with_data_type(
        &self,
        size_x: usize,
        size_y: usize,
        bands: usize,
        data_type: DataType,
        options: &RasterCreationOptions,
    ) -> Result<Dataset> {
        let interleave = Interleave::from_options(options)?;
        let types = std::iter::repeat(data_type).take(bands);
        let state = DatasetState::new((size_x, size_y), types, interleave)?;
        Ok(Dataset::from_state(state))
    }

    /// Create a dataset whose bands live in `buffer`, laid out as `descriptor` says.
    ///
    /// Nothing is copied: writes through the dataset land in the buffer,
    /// which [`Dataset::into_buffer`] gives back.
    ///
    /// # Example
    ///
    /// ```
    /// # fn main() -> memraster::errors::Result<()> {
    /// use memraster::raster::BufferDescriptor;
    /// use memraster::DriverManager;
    ///
    /// let driver = DriverManager::get_driver_by_name("MEM")?;
    /// let descriptor = BufferDescriptor::from_name("MEM:::PIXELS=2,LINES=2")?;
    /// let dataset = driver.create_from_buffer(vec![0u8; 4], &descriptor)?;
    /// dataset.rasterband(1)?.fill(7.0)?;
    /// assert_eq!(dataset.into_buffer(), vec![7u8; 4]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_from_buffer(
        &self,
        buffer: Vec<u8>,
        descriptor: &BufferDescriptor,
    ) -> Result<Dataset> {
        Ok(Dataset::from_state(DatasetState::wrap(buffer, descriptor)?))
    }

    /// Create a new dataset with the size, band types and pixels of `source`.
    ///
    /// The interleaving is taken from `options`, or else from `source`.
    /// Projection, geo transform and no-data values are carried over when the source has them.
    pub fn create_copy(
        &self,
        source: &impl RasterSource,
        options: &RasterCreationOptions,
    ) -> Result<Dataset> {
        let size = source.raster_size();
        let count = source.raster_count();
        let types = (1..=count)
            .map(|band| source.band_type(band))
            .collect::<Result<Vec<_>>>()?;
        let mut interleave = Interleave::from_options(options)?;
        if options.fetch_name_value("INTERLEAVE").is_none() {
            interleave = source.interleave().unwrap_or_default();
        }
        let mut dataset = Dataset::from_state(DatasetState::new(size, types.iter().copied(), interleave)?);

        for (band_index, data_type) in (1..=count).zip(types) {
            let mut band = dataset.rasterband(band_index)?;
            let mut row = vec![0u8; size.0 * data_type.bytes()];
            for y in 0..size.1 {
                let y = isize::try_from(y)
                    .map_err(|_| RasterError::BadArgument(format!("row {y} overflows")))?;
                source.read_band_bytes(band_index, (0, y), (size.0, 1), &mut row)?;
                band.write_raster_bytes(
                    (0, y),
                    (size.0, 1),
                    (size.0, 1),
                    &row,
                    &RasterIoOptions::default(),
                )?;
            }
            if let Some(no_data) = source.no_data_value(band_index) {
                band.set_no_data_value(Some(no_data))?;
            }
        }
        if let Some(projection) = source.projection() {
            dataset.set_projection(&projection)?;
        }
        if let Some(transform) = source.geo_transform() {
            dataset.set_geo_transform(&transform)?;
        }
        log::debug!(
            "copied {}x{} raster of {count} band(s) into {}",
            size.0,
            size.1,
            self.short_name
        );
        Ok(dataset)
    }
}

/// Raster drivers, looked up by name.
pub struct DriverManager;

impl DriverManager {
    /// Returns the number of registered drivers.
    pub fn count() -> usize {
        1
    }

    /// Returns the driver at `index`, 0-based.
    pub fn get_driver(index: usize) -> Result<Driver> {
        match index {
            0 => Ok(Driver::mem()),
            _ => Err(RasterError::UnknownDriver(format!("#{index}"))),
        }
    }

    /// Get one [`Driver`] by name, compared case-insensitively.
    pub fn get_driver_by_name(name: &str) -> Result<Driver> {
        if name.eq_ignore_ascii_case(MEM_SHORT_NAME) {
            Ok(Driver::mem())
        } else {
            Err(RasterError::UnknownDriver(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_lookup() {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        assert_eq!(driver.short_name(), "MEM");
        assert_eq!(driver.long_name(), "In Memory Raster");
        assert_eq!(DriverManager::get_driver_by_name("mem").unwrap(), driver);
        assert_eq!(DriverManager::get_driver(0).unwrap(), driver);
        assert_eq!(DriverManager::count(), 1);
        assert!(matches!(
            DriverManager::get_driver_by_name("GTiff"),
            Err(RasterError::UnknownDriver(_))
        ));
    }

    #[test]
    fn test_create_rejects_empty_raster() {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        assert!(matches!(
            driver.create(0, 10, 1),
            Err(RasterError::BadArgument(_))
        ));
        let ds = driver.create(10, 10, 0).unwrap();
        assert_eq!(ds.raster_count(), 0);
    }
}
