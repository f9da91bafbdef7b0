use std::cell::RefCell;
use std::fmt::{Debug, Formatter};

use crate::driver::Driver;
use crate::errors::{RasterError, Result};
use crate::metadata::sealed::MetadataAccess;
use crate::metadata::{Metadata, MetadataStore};
use crate::raster::rasterio::{read_window, write_window, BufferLayout, ByteSink, ByteSource, Window};
use crate::raster::storage::{BandPath, DatasetState, Target};
use crate::raster::{
    DataType, Interleave, MaskFlags, OverviewResampling, RasterBand, RasterCreationOptions,
    RasterIoOptions, RasterSource, RasterType,
};

/// An affine transform.
///
/// A six-element array storing the coefficients of an affine transform
/// used in mapping coordinates between pixel/line `(P, L)` (raster) space,
/// and `(Xp,Yp)` (projection) space.
///
/// # Interpretation
///
/// A `GeoTransform`'s components have the following meanings:
///
///   * `GeoTransform[0]`: x-coordinate of the upper-left corner of the upper-left pixel.
///   * `GeoTransform[1]`: W-E pixel resolution (pixel width).
///   * `GeoTransform[2]`: row rotation (typically zero).
///   * `GeoTransform[3]`: y-coordinate of the upper-left corner of the upper-left pixel.
///   * `GeoTransform[4]`: column rotation (typically zero).
///   * `GeoTransform[5]`: N-S pixel resolution (pixel height), negative value for a North-up image.
///
/// The dataset only stores it.
pub type GeoTransform = [f64; 6];

/// An in-memory raster dataset: equally sized bands plus the metadata attached to them.
///
/// Datasets are created through a [`Driver`]:
///
/// ```
/// use memraster::DriverManager;
///
/// let driver = DriverManager::get_driver_by_name("MEM").unwrap();
/// let dataset = driver.create_with_band_type::<u16>(64, 32, 3).unwrap();
/// assert_eq!(dataset.raster_size(), (64, 32));
/// assert_eq!(dataset.raster_count(), 3);
/// ```
pub struct Dataset {
    pub(crate) state: RefCell<DatasetState>,
}

impl Dataset {
    pub(crate) fn from_state(state: DatasetState) -> Self {
        Dataset {
            state: RefCell::new(state),
        }
    }

    /// The driver that created this dataset.
    pub fn driver(&self) -> Driver {
        Driver::mem()
    }

    /// Fetch a band object for a dataset.
    ///
    /// Applies to raster datasets, and fetches the
    /// rasterband at the given _1-based_ index.
    pub fn rasterband(&self, band_index: usize) -> Result<RasterBand<'_>> {
        let count = self.raster_count();
        if band_index == 0 || band_index > count {
            return Err(RasterError::InvalidBandIndex {
                index: band_index,
                count,
            });
        }
        Ok(RasterBand::new(self, BandPath::Band(band_index - 1)))
    }

    /// Iterate over all bands, in index order.
    pub fn rasterbands(&self) -> impl Iterator<Item = RasterBand<'_>> {
        (0..self.raster_count()).map(move |band| RasterBand::new(self, BandPath::Band(band)))
    }

    /// Fetch the number of raster bands on this dataset.
    pub fn raster_count(&self) -> usize {
        self.state.borrow().bands.len()
    }

    /// Returns the raster dimensions: (width, height).
    pub fn raster_size(&self) -> (usize, usize) {
        self.state.borrow().size
    }

    /// Storage layout of the bands created with the dataset.
    pub fn interleave(&self) -> Interleave {
        self.state.borrow().interleave
    }

    /// Consume the dataset and return its shared pixel buffer.
    ///
    /// This is the buffer given to [`Driver::create_from_buffer`], or the
    /// storage of a pixel interleaved dataset. It is empty when every band
    /// owns its pixels.
    pub fn into_buffer(self) -> Vec<u8> {
        self.state.into_inner().into_shared()
    }

    /// Append a band of type `T`.
    ///
    /// Added bands always own their storage, whatever the dataset interleaving.
    pub fn add_band<T: RasterType>(&mut self, options: &RasterCreationOptions) -> Result<()> {
        self.add_band_with_data_type(T::datatype(), options)
    }

    /// Append a band of `data_type`.
    pub fn add_band_with_data_type(
        &mut self,
        data_type: DataType,
        options: &RasterCreationOptions,
    ) -> Result<()> {
        for (key, value) in options.iter() {
            log::warn!("band option {key}={value} is not supported and was ignored");
        }
        self.state.get_mut().add_band(data_type)
    }

    /// Fetch the projection definition string for this dataset.
    ///
    /// Empty if none was set.
    pub fn projection(&self) -> String {
        self.state.borrow().projection.clone()
    }

    /// Set the projection reference string for this dataset.
    pub fn set_projection(&mut self, projection: &str) -> Result<()> {
        self.state.get_mut().projection = projection.to_string();
        Ok(())
    }

    /// Affine transformation coefficients of the dataset.
    ///
    /// Fails if no transform was set.
    pub fn geo_transform(&self) -> Result<GeoTransform> {
        self.state.borrow().geo_transform.ok_or_else(|| {
            RasterError::unsupported("geo_transform", "no geo transform has been set")
        })
    }

    /// Set the affine transformation coefficients.
    pub fn set_geo_transform(&mut self, transformation: &GeoTransform) -> Result<()> {
        self.state.get_mut().geo_transform = Some(*transformation);
        Ok(())
    }

    /// Create a mask shared by all bands, initialized to all valid (255).
    ///
    /// Only [`MaskFlags::PER_DATASET`] masks can be created at dataset level.
    pub fn create_mask_band(&mut self, flags: MaskFlags) -> Result<()> {
        if !flags.contains(MaskFlags::PER_DATASET) {
            return Err(RasterError::unsupported(
                "create_mask_band",
                "dataset masks must be created with MaskFlags::PER_DATASET",
            ));
        }
        self.state.get_mut().create_dataset_mask()
    }

    /// Builds overviews for the current `Dataset`. See [`GDALBuildOverviews`].
    ///
    /// # Arguments
    /// * `resampling` - resampling method, one of `NEAREST`, `AVERAGE` or `NONE`
    /// * `overviews` - list of overview decimation factors, e.g. `&[2, 4, 8, 16, 32]`
    /// * `bands` - list of bands to build the overviews for, or empty for all bands
    ///
    /// `NONE` removes the existing overviews. An overview whose size matches
    /// an existing one replaces its pixels; all are computed from full resolution.
    ///
    /// [`GDALBuildOverviews`]: https://gdal.org/doxygen/gdal_8h.html#a767f4456a6249594ee18ea53f68b7e80
    pub fn build_overviews(
        &mut self,
        resampling: &str,
        overviews: &[usize],
        bands: &[usize],
    ) -> Result<()> {
        let resampling = resampling.parse::<OverviewResampling>()?;
        let state = self.state.get_mut();
        let bands = if bands.is_empty() {
            Vec::new()
        } else {
            band_indices(state, bands)?
        };
        state.build_overviews(resampling, overviews, &bands)
    }

    /// Read a window of several bands into a byte buffer in one call.
    ///
    /// `bands` are 1-based. `options.data_type` defaults to the type of the
    /// first band; `options.band_stride` separates the planes of successive bands.
    pub fn read_raster_bytes(
        &self,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer_size: (usize, usize),
        bands: &[usize],
        buffer: &mut [u8],
        options: &RasterIoOptions,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let bands = band_indices(&state, bands)?;
        let window = Window::checked(window, window_size, state.size)?;
        let data_type = options.data_type.unwrap_or(state.bands[bands[0]].data_type);
        let layout =
            BufferLayout::bytes(buffer_size, bands.len(), data_type, options, buffer.len())?;
        let mut sink = ByteSink {
            data: buffer,
            data_type,
        };
        for (slot, band) in bands.into_iter().enumerate() {
            let target = state.target(BandPath::Band(band))?;
            read_window(
                target.source(),
                &window,
                &mut sink,
                &layout,
                slot,
                options.resample_alg,
            );
        }
        Ok(())
    }

    /// Write a window of several bands from a byte buffer in one call.
    ///
    /// See [`read_raster_bytes`](Self::read_raster_bytes) for the layout.
    /// Nothing is written unless the whole request is valid.
    pub fn write_raster_bytes(
        &mut self,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer_size: (usize, usize),
        bands: &[usize],
        buffer: &[u8],
        options: &RasterIoOptions,
    ) -> Result<()> {
        let state = self.state.get_mut();
        let bands = band_indices(state, bands)?;
        let window = Window::checked(window, window_size, state.size)?;
        let data_type = options.data_type.unwrap_or(state.bands[bands[0]].data_type);
        let layout =
            BufferLayout::bytes(buffer_size, bands.len(), data_type, options, buffer.len())?;
        let source = ByteSource {
            data: buffer,
            data_type,
        };
        for (slot, band) in bands.into_iter().enumerate() {
            if let Target::Stored { mut view, .. } = state.target(BandPath::Band(band))? {
                write_window(&mut view, &window, &source, &layout, slot);
            }
        }
        Ok(())
    }

    /// Copy this dataset into a new one created by `driver`.
    pub fn create_copy(&self, driver: &Driver, options: &RasterCreationOptions) -> Result<Dataset> {
        driver.create_copy(self, options)
    }
}

/// Validate 1-based band indices, returning them 0-based.
fn band_indices(state: &DatasetState, bands: &[usize]) -> Result<Vec<usize>> {
    if bands.is_empty() {
        return Err(RasterError::BadArgument(
            "at least one band must be given".to_string(),
        ));
    }
    let count = state.bands.len();
    bands
        .iter()
        .map(|&band| {
            band.checked_sub(1)
                .filter(|&b| b < count)
                .ok_or(RasterError::InvalidBandIndex { index: band, count })
        })
        .collect()
}

impl Debug for Dataset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("size", &self.raster_size())
            .field("bands", &self.raster_count())
            .field("interleave", &self.interleave())
            .finish()
    }
}

impl MetadataAccess for Dataset {
    fn with_metadata<R>(&self, f: impl FnOnce(&MetadataStore) -> R) -> Result<R> {
        Ok(f(&self.state.borrow().metadata))
    }

    fn with_metadata_mut<R>(&mut self, f: impl FnOnce(&mut MetadataStore) -> R) -> Result<R> {
        Ok(f(&mut self.state.get_mut().metadata))
    }
}

impl Metadata for Dataset {}

impl RasterSource for Dataset {
    fn raster_size(&self) -> (usize, usize) {
        Dataset::raster_size(self)
    }

    fn raster_count(&self) -> usize {
        Dataset::raster_count(self)
    }

    fn band_type(&self, band_index: usize) -> Result<DataType> {
        Ok(self.rasterband(band_index)?.band_type())
    }

    fn read_band_bytes(
        &self,
        band_index: usize,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer: &mut [u8],
    ) -> Result<()> {
        self.rasterband(band_index)?.read_raster_bytes(
            window,
            window_size,
            window_size,
            buffer,
            &RasterIoOptions::default(),
        )
    }

    fn interleave(&self) -> Option<Interleave> {
        Some(Dataset::interleave(self))
    }

    fn projection(&self) -> Option<String> {
        Some(Dataset::projection(self)).filter(|p| !p.is_empty())
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        Dataset::geo_transform(self).ok()
    }

    fn no_data_value(&self, band_index: usize) -> Option<f64> {
        self.rasterband(band_index).ok()?.no_data_value()
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::RasterError;
    use crate::metadata::Metadata;
    use crate::raster::{Interleave, RasterCreationOptions};
    use crate::DriverManager;

    #[test]
    fn test_band_index_is_one_based() {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        let dataset = driver.create(4, 4, 2).unwrap();
        assert!(dataset.rasterband(1).is_ok());
        assert!(dataset.rasterband(2).is_ok());
        assert!(matches!(
            dataset.rasterband(0),
            Err(RasterError::InvalidBandIndex { index: 0, count: 2 })
        ));
        assert!(dataset.rasterband(3).is_err());
        assert_eq!(dataset.rasterbands().count(), 2);
    }

    #[test]
    fn test_georeferencing_is_stored() {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        let mut dataset = driver.create(4, 4, 1).unwrap();
        assert!(dataset.projection().is_empty());
        assert!(dataset.geo_transform().is_err());

        let transform = [440720.0, 60.0, 0.0, 3751320.0, 0.0, -60.0];
        dataset.set_geo_transform(&transform).unwrap();
        dataset.set_projection("EPSG:26711").unwrap();
        assert_eq!(dataset.geo_transform().unwrap(), transform);
        assert_eq!(dataset.projection(), "EPSG:26711");
    }

    #[test]
    fn test_interleave_metadata() {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        let options = RasterCreationOptions::from(&[("INTERLEAVE", "PIXEL")]);
        let mut dataset = driver
            .create_with_band_type_with_options::<u8>(4, 4, 3, &options)
            .unwrap();
        assert_eq!(dataset.interleave(), Interleave::Pixel);
        assert_eq!(
            dataset.metadata_item("INTERLEAVE", "IMAGE_STRUCTURE"),
            Some("PIXEL".to_string())
        );

        dataset.set_metadata_item("AREA_OR_POINT", "Point", "").unwrap();
        dataset.set_description("scratch").unwrap();
        assert_eq!(
            dataset.metadata_domain("").unwrap(),
            vec!["AREA_OR_POINT=Point".to_string()]
        );
        assert_eq!(dataset.description().unwrap(), "scratch");
    }
}
