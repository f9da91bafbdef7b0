use std::fmt::{Debug, Formatter};

use crate::dataset::Dataset;
use crate::errors::{RasterError, Result};
use crate::metadata::sealed::MetadataAccess;
use crate::metadata::{Metadata, MetadataStore};
use crate::raster::checksum::checksum;
use crate::raster::color_table::ColorTable;
use crate::raster::histogram::Histogram;
use crate::raster::mask::MaskFlags;
use crate::raster::rasterio::{
    read_window, write_window, BufferLayout, ByteSink, ByteSource, RasterIoOptions, ResampleAlg,
    TypedSink, TypedSource, Window,
};
use crate::raster::rat::RasterAttributeTable;
use crate::raster::storage::{BandInfo, BandPath, BandState, Target};
use crate::raster::types::{DataType, RasterType, Sample};
use crate::raster::Buffer;

#[cfg(feature = "ndarray")]
use ndarray::Array2;

/// Represents a single band of a dataset, one of its overviews, or a mask.
///
/// A `RasterBand` is a handle borrowed from its [`Dataset`]; the pixels and the
/// band's metadata live in the dataset.
pub struct RasterBand<'a> {
    dataset: &'a Dataset,
    path: BandPath,
}

impl<'a> RasterBand<'a> {
    pub(crate) fn new(dataset: &'a Dataset, path: BandPath) -> Self {
        RasterBand { dataset, path }
    }

    /// The dataset owning this band.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    fn with_target<R>(&self, f: impl FnOnce(Target<'_>) -> Result<R>) -> Result<R> {
        let mut state = self.dataset.state.borrow_mut();
        let target = state.target(self.path)?;
        f(target)
    }

    fn with_info<R>(&self, method_name: &'static str, f: impl FnOnce(&mut BandInfo) -> R) -> Result<R> {
        self.with_target(|target| match target {
            Target::Stored { info, .. } => Ok(f(info)),
            Target::AllValid(_) | Target::NoData(_) => Err(RasterError::unsupported(
                method_name,
                "derived mask bands are read-only",
            )),
        })
    }

    fn with_state<R>(&self, f: impl FnOnce(Option<&BandState>) -> R) -> Result<R> {
        let state = self.dataset.state.borrow();
        let band = state.state(self.path)?;
        Ok(f(band))
    }

    /// Get block size from a 'Dataset'.
    ///
    /// Blocks are always full rows.
    pub fn block_size(&self) -> (usize, usize) {
        (self.x_size(), 1)
    }

    /// Get x-size of the band
    pub fn x_size(&self) -> usize {
        self.size().0
    }

    /// Get y-size of the band
    pub fn y_size(&self) -> usize {
        self.size().1
    }

    /// Get dimensions of the band.
    /// Note that this may not be the same as `size` on the `owning_dataset` due to scale.
    ///
    /// A handle that no longer addresses a band reports `(0, 0)`.
    pub fn size(&self) -> (usize, usize) {
        self.with_target(|target| Ok(target.source().size()))
            .unwrap_or_else(|e| {
                log::debug!("reporting size (0, 0) for unresolved {:?}: {e}", self.path);
                (0, 0)
            })
    }

    /// The data type of this band's pixels.
    ///
    /// A handle that no longer addresses a band reports [`DataType::UInt8`].
    pub fn band_type(&self) -> DataType {
        self.with_target(|target| Ok(target.source().data_type()))
            .unwrap_or_else(|e| {
                log::debug!("reporting UInt8 for unresolved {:?}: {e}", self.path);
                DataType::UInt8
            })
    }

    /// Read data from this band into a slice, where `T` implements [`RasterType`]
    ///
    /// # Arguments
    /// * `window` - the window position from top left
    /// * `window_size` - the window size (band space)
    /// * `size` - the desired size to read (buffer space)
    /// * `buffer` - a slice to hold the data (length must equal product of size parameter)
    /// * `e_resample_alg` - the resample algorithm used for the interpolation. Default: `NearestNeighbor`.
    pub fn read_into_slice<T: RasterType>(
        &self,
        window: (isize, isize),
        window_size: (usize, usize),
        size: (usize, usize),
        buffer: &mut [T],
        e_resample_alg: Option<ResampleAlg>,
    ) -> Result<()> {
        check_buffer_len(size, buffer.len())?;
        let layout = BufferLayout::packed(size, 1, buffer.len())?;
        self.with_target(|target| {
            let source = target.source();
            let window = Window::checked(window, window_size, source.size())?;
            read_window(
                source,
                &window,
                &mut TypedSink(buffer),
                &layout,
                0,
                e_resample_alg.unwrap_or_default(),
            );
            Ok(())
        })
    }

    /// Read a [`Buffer<T>`] from this band, where `T` implements [`RasterType`].
    ///
    /// # Arguments
    /// * `window` - the window position from top left
    /// * `window_size` - the window size (band space)
    /// * `size` - the desired size of the 'Buffer' (buffer space)
    /// * `e_resample_alg` - the resample algorithm used for the interpolation. Default: `NearestNeighbor`.
    pub fn read_as<T: RasterType>(
        &self,
        window: (isize, isize),
        window_size: (usize, usize),
        size: (usize, usize),
        e_resample_alg: Option<ResampleAlg>,
    ) -> Result<Buffer<T>> {
        let len = size
            .0
            .checked_mul(size.1)
            .ok_or_else(|| RasterError::BadArgument(format!("buffer size {size:?} overflows")))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| RasterError::AllocationFailure {
                what: "read buffer",
                msg: e.to_string(),
            })?;
        data.resize(len, T::default());
        self.read_into_slice(window, window_size, size, &mut data, e_resample_alg)?;
        Ok(Buffer { size, data })
    }

    #[cfg(feature = "ndarray")]
    /// Read a [`Array2<T>`] from this band, where `T` implements [`RasterType`].
    ///
    /// The returned array has shape `(rows, cols)`.
    pub fn read_as_array<T: RasterType>(
        &self,
        window: (isize, isize),
        window_size: (usize, usize),
        array_size: (usize, usize),
        e_resample_alg: Option<ResampleAlg>,
    ) -> Result<Array2<T>> {
        self.read_as::<T>(window, window_size, array_size, e_resample_alg)?
            .to_array()
    }

    /// Read the full band as a [`Buffer<T>`], where `T` implements [`RasterType`].
    pub fn read_band_as<T: RasterType>(&self) -> Result<Buffer<T>> {
        let size = self.size();
        self.read_as::<T>((0, 0), size, size, None)
    }

    /// Read a full block, a single row of pixels.
    pub fn read_block<T: RasterType>(&self, block_index: (usize, usize)) -> Result<Buffer<T>> {
        let (window, size) = self.block_window(block_index)?;
        self.read_as::<T>(window, size, size, None)
    }

    /// Write a full block, a single row of pixels.
    pub fn write_block<T: RasterType>(
        &mut self,
        block_index: (usize, usize),
        block: &Buffer<T>,
    ) -> Result<()> {
        let (window, size) = self.block_window(block_index)?;
        self.write(window, size, block)
    }

    fn block_window(&self, block_index: (usize, usize)) -> Result<((isize, isize), (usize, usize))> {
        let block_size = self.block_size();
        let offset = |index: usize, extent: usize| {
            index
                .checked_mul(extent)
                .and_then(|o| isize::try_from(o).ok())
                .ok_or_else(|| {
                    RasterError::BadArgument(format!("block index {block_index:?} overflows"))
                })
        };
        Ok((
            (offset(block_index.0, block_size.0)?, offset(block_index.1, block_size.1)?),
            block_size,
        ))
    }

    /// Write a [`Buffer<T>`] into this band, where `T` implements [`RasterType`].
    ///
    /// # Arguments
    /// * `window` - the window position from top left
    /// * `window_size` - the window size (band space)
    /// * `buffer` - the data to write; its size may differ from `window_size`
    pub fn write<T: RasterType>(
        &mut self,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer: &Buffer<T>,
    ) -> Result<()> {
        check_buffer_len(buffer.size, buffer.data.len())?;
        let layout = BufferLayout::packed(buffer.size, 1, buffer.data.len())?;
        self.with_target(|target| match target {
            Target::Stored { mut view, .. } => {
                let window = Window::checked(window, window_size, view.layout.size)?;
                write_window(&mut view, &window, &TypedSource(&buffer.data), &layout, 0);
                Ok(())
            }
            _ => Err(RasterError::unsupported("write", "derived mask bands are read-only")),
        })
    }

    /// Read raw bytes, with an explicit buffer element type and strides.
    ///
    /// `options.data_type` defaults to the band type; unset strides default to
    /// a packed layout of `buffer_size` pixels.
    pub fn read_raster_bytes(
        &self,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer_size: (usize, usize),
        buffer: &mut [u8],
        options: &RasterIoOptions,
    ) -> Result<()> {
        self.with_target(|target| {
            let source = target.source();
            let window = Window::checked(window, window_size, source.size())?;
            let data_type = options.data_type.unwrap_or(source.data_type());
            let layout = BufferLayout::bytes(buffer_size, 1, data_type, options, buffer.len())?;
            let mut sink = ByteSink {
                data: buffer,
                data_type,
            };
            read_window(source, &window, &mut sink, &layout, 0, options.resample_alg);
            Ok(())
        })
    }

    /// Write raw bytes, with an explicit buffer element type and strides.
    ///
    /// See [`read_raster_bytes`](Self::read_raster_bytes) for the layout.
    pub fn write_raster_bytes(
        &mut self,
        window: (isize, isize),
        window_size: (usize, usize),
        buffer_size: (usize, usize),
        buffer: &[u8],
        options: &RasterIoOptions,
    ) -> Result<()> {
        self.with_target(|target| match target {
            Target::Stored { mut view, .. } => {
                let window = Window::checked(window, window_size, view.layout.size)?;
                let data_type = options.data_type.unwrap_or(view.layout.data_type);
                let layout =
                    BufferLayout::bytes(buffer_size, 1, data_type, options, buffer.len())?;
                let source = ByteSource {
                    data: buffer,
                    data_type,
                };
                write_window(&mut view, &window, &source, &layout, 0);
                Ok(())
            }
            _ => Err(RasterError::unsupported(
                "write_raster_bytes",
                "derived mask bands are read-only",
            )),
        })
    }

    /// Set every pixel of the band to `value`, converted to the band type.
    pub fn fill(&mut self, value: f64) -> Result<()> {
        self.with_target(|target| match target {
            Target::Stored { mut view, .. } => {
                view.fill(Sample::Float(value));
                Ok(())
            }
            _ => Err(RasterError::unsupported("fill", "derived mask bands are read-only")),
        })
    }

    /// GDAL compatible checksum of a window of the band.
    pub fn checksum(&self, window: (isize, isize), window_size: (usize, usize)) -> Result<u16> {
        self.with_target(|target| {
            let source = target.source();
            let window = Window::checked(window, window_size, source.size())?;
            Ok(checksum(source, &window))
        })
    }

    /// Fetch the no-data value for this band.
    pub fn no_data_value(&self) -> Option<f64> {
        self.with_info("no_data_value", |info| info.no_data)
            .ok()
            .flatten()
    }

    /// Set the no-data value of this band.
    ///
    /// If `no_data` is `None`, any existing no-data value is deleted.
    pub fn set_no_data_value(&mut self, no_data: Option<f64>) -> Result<()> {
        self.with_info("set_no_data_value", |info| info.no_data = no_data)
    }

    pub fn delete_no_data_value(&mut self) -> Result<()> {
        self.set_no_data_value(None)
    }

    /// Returns the color interpretation of this band.
    ///
    /// A band with a color table is always [`ColorInterpretation::PaletteIndex`].
    pub fn color_interpretation(&self) -> ColorInterpretation {
        self.with_info("color_interpretation", |info| {
            if info.color_table.is_some() {
                ColorInterpretation::PaletteIndex
            } else {
                info.color_interpretation
            }
        })
        .unwrap_or(ColorInterpretation::Undefined)
    }

    /// Set the color interpretation for this band.
    pub fn set_color_interpretation(&mut self, interp: ColorInterpretation) -> Result<()> {
        self.with_info("set_color_interpretation", |info| {
            info.color_interpretation = interp
        })
    }

    /// Get the color table for this band if it has one.
    pub fn color_table(&self) -> Option<ColorTable> {
        self.with_info("color_table", |info| info.color_table.clone())
            .ok()
            .flatten()
    }

    /// Set the color table for this band.
    pub fn set_color_table(&mut self, colors: &ColorTable) -> Result<()> {
        self.with_info("set_color_table", |info| {
            info.color_table = Some(colors.clone())
        })
    }

    pub fn clear_color_table(&mut self) -> Result<()> {
        self.with_info("clear_color_table", |info| info.color_table = None)
    }

    /// Names of the pixel value categories, if any were set.
    pub fn category_names(&self) -> Option<Vec<String>> {
        self.with_info("category_names", |info| info.category_names.clone())
            .ok()
            .flatten()
    }

    /// Set the category names; an empty list removes them.
    pub fn set_category_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let names = (!names.is_empty())
            .then(|| names.iter().map(|n| n.as_ref().to_string()).collect());
        self.with_info("set_category_names", |info| info.category_names = names)
    }

    /// The default raster attribute table, if one was set.
    pub fn default_rat(&self) -> Option<RasterAttributeTable> {
        self.with_info("default_rat", |info| info.rat.clone())
            .ok()
            .flatten()
    }

    pub fn set_default_rat(&mut self, rat: &RasterAttributeTable) -> Result<()> {
        self.with_info("set_default_rat", |info| info.rat = Some(rat.clone()))
    }

    pub fn clear_default_rat(&mut self) -> Result<()> {
        self.with_info("clear_default_rat", |info| info.rat = None)
    }

    /// Fetch the default histogram for this band.
    ///
    /// Returns the histogram stored with
    /// [`set_default_histogram`](Self::set_default_histogram), or `None` when
    /// there is none and `force` is `false`. Histograms are never computed, so
    /// `force = true` without a stored histogram fails.
    pub fn default_histogram(&self, force: bool) -> Result<Option<Histogram>> {
        let stored = self.with_info("default_histogram", |info| info.histogram.clone())?;
        match stored {
            None if force => Err(RasterError::unsupported(
                "default_histogram",
                "histogram computation is not supported",
            )),
            stored => Ok(stored),
        }
    }

    pub fn set_default_histogram(&mut self, min: f64, max: f64, counts: &[u64]) -> Result<()> {
        let histogram = Histogram::new(min, max, counts.to_vec());
        self.with_info("set_default_histogram", |info| {
            info.histogram = Some(histogram)
        })
    }

    /// Get actual scale factor of this band.
    pub fn scale(&self) -> Option<f64> {
        self.with_info("scale", |info| info.scale).ok().flatten()
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.with_info("set_scale", |info| info.scale = Some(scale))
    }

    /// Get actual offset of this band.
    pub fn offset(&self) -> Option<f64> {
        self.with_info("offset", |info| info.offset).ok().flatten()
    }

    pub fn set_offset(&mut self, offset: f64) -> Result<()> {
        self.with_info("set_offset", |info| info.offset = Some(offset))
    }

    /// Unit of the pixel values, empty if unknown.
    pub fn unit(&self) -> String {
        self.with_info("unit", |info| info.unit.clone())
            .unwrap_or_default()
    }

    pub fn set_unit(&mut self, unit: &str) -> Result<()> {
        self.with_info("set_unit", |info| info.unit = unit.to_string())
    }

    /// Flags describing the band's mask.
    pub fn mask_flags(&self) -> Result<MaskFlags> {
        self.with_state(|state| match state {
            Some(state) => state.mask.flags(state.info.no_data),
            None => MaskFlags::ALL_VALID,
        })
    }

    /// Create a mask for this band, initialized to all valid (255).
    ///
    /// With [`MaskFlags::PER_DATASET`] the mask is shared by all bands of the
    /// dataset and replaces their own masks.
    pub fn create_mask_band(&mut self, flags: MaskFlags) -> Result<()> {
        let mut state = self.dataset.state.borrow_mut();
        if flags.contains(MaskFlags::PER_DATASET) {
            if !matches!(self.path, BandPath::Band(_)) {
                return Err(RasterError::unsupported(
                    "create_mask_band",
                    "per-dataset masks can only be created from a full resolution band",
                ));
            }
            state.create_dataset_mask()
        } else {
            state.create_band_mask(self.path)
        }
    }

    /// Open the mask band of this band.
    ///
    /// Bands without a stored mask expose a read-only mask derived from their
    /// no-data value, or one where every pixel is valid.
    pub fn open_mask_band(&self) -> Result<RasterBand<'a>> {
        let path = match self.path {
            BandPath::Band(band) => BandPath::Mask(band, None),
            BandPath::Overview(band, overview) => BandPath::Mask(band, Some(overview)),
            BandPath::Mask(..) | BandPath::AllValid(_) => BandPath::AllValid(self.size()),
        };
        Ok(RasterBand::new(self.dataset, path))
    }

    /// Returns the number of overviews of this band.
    pub fn overview_count(&self) -> Result<usize> {
        self.with_state(|state| state.map_or(0, |s| s.overviews.len()))
    }

    /// Returns the overview at `overview_index`, 0-based.
    pub fn overview(&self, overview_index: usize) -> Result<RasterBand<'a>> {
        let count = self.overview_count()?;
        match self.path {
            BandPath::Band(band) if overview_index < count => Ok(RasterBand::new(
                self.dataset,
                BandPath::Overview(band, overview_index),
            )),
            _ => Err(RasterError::InvalidOverviewIndex {
                index: overview_index,
                count,
            }),
        }
    }
}

fn check_buffer_len(size: (usize, usize), len: usize) -> Result<()> {
    if size.0.checked_mul(size.1) != Some(len) {
        return Err(RasterError::BadArgument(format!(
            "buffer of length {len} does not hold {}x{} pixels",
            size.0, size.1
        )));
    }
    Ok(())
}

impl Debug for RasterBand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBand")
            .field("path", &self.path)
            .field("size", &self.size())
            .field("band_type", &self.band_type())
            .finish()
    }
}

impl MetadataAccess for RasterBand<'_> {
    fn with_metadata<R>(&self, f: impl FnOnce(&MetadataStore) -> R) -> Result<R> {
        self.with_info("metadata", |info| f(&info.metadata))
    }

    fn with_metadata_mut<R>(&mut self, f: impl FnOnce(&mut MetadataStore) -> R) -> Result<R> {
        self.with_info("set_metadata", |info| f(&mut info.metadata))
    }
}

impl Metadata for RasterBand<'_> {}

/// Color interpretation of a band's pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ColorInterpretation {
    /// Undefined
    #[default]
    Undefined,
    /// Grayscale
    GrayIndex,
    /// Paletted (see associated color table)
    PaletteIndex,
    /// Red band of RGBA image
    RedBand,
    /// Green band of RGBA image
    GreenBand,
    /// Blue band of RGBA image
    BlueBand,
    /// Alpha (0=transparent, 255=opaque)
    AlphaBand,
    /// Hue band of HLS image
    HueBand,
    /// Saturation band of HLS image
    SaturationBand,
    /// Lightness band of HLS image
    LightnessBand,
    /// Cyan band of CMYK image
    CyanBand,
    /// Magenta band of CMYK image
    MagentaBand,
    /// Yellow band of CMYK image
    YellowBand,
    /// Black band of CMYK image
    BlackBand,
    /// Y Luminance
    YCbCrSpaceYBand,
    /// Cb Chroma
    YCbCrSpaceCbBand,
    /// Cr Chroma
    YCbCrSpaceCrBand,
}

impl ColorInterpretation {
    fn iter() -> impl Iterator<Item = ColorInterpretation> {
        use ColorInterpretation::*;
        [
            Undefined,
            GrayIndex,
            PaletteIndex,
            RedBand,
            GreenBand,
            BlueBand,
            AlphaBand,
            HueBand,
            SaturationBand,
            LightnessBand,
            CyanBand,
            MagentaBand,
            YellowBand,
            BlackBand,
            YCbCrSpaceYBand,
            YCbCrSpaceCbBand,
            YCbCrSpaceCrBand,
        ]
        .into_iter()
    }

    /// Creates a new `ColorInterpretation` from a string name.
    ///
    /// Unknown names map to [`ColorInterpretation::Undefined`].
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .unwrap_or(ColorInterpretation::Undefined))
    }

    /// Returns the name of this color interpretation.
    pub fn name(&self) -> &'static str {
        match self {
            ColorInterpretation::Undefined => "Undefined",
            ColorInterpretation::GrayIndex => "Gray",
            ColorInterpretation::PaletteIndex => "Palette",
            ColorInterpretation::RedBand => "Red",
            ColorInterpretation::GreenBand => "Green",
            ColorInterpretation::BlueBand => "Blue",
            ColorInterpretation::AlphaBand => "Alpha",
            ColorInterpretation::HueBand => "Hue",
            ColorInterpretation::SaturationBand => "Saturation",
            ColorInterpretation::LightnessBand => "Lightness",
            ColorInterpretation::CyanBand => "Cyan",
            ColorInterpretation::MagentaBand => "Magenta",
            ColorInterpretation::YellowBand => "Yellow",
            ColorInterpretation::BlackBand => "Black",
            ColorInterpretation::YCbCrSpaceYBand => "YCbCr_Y",
            ColorInterpretation::YCbCrSpaceCbBand => "YCbCr_Cb",
            ColorInterpretation::YCbCrSpaceCrBand => "YCbCr_Cr",
        }
    }
}
