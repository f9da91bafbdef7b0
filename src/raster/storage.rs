//! Pixel storage of in-memory bands and the per-band state that surrounds it.
//!
//! A band either owns its pixels or views the buffer the dataset shares
//! between the bands created with it: a pixel-interleaved allocation, or a
//! buffer handed over by the caller.

use crate::config;
use crate::dataset::GeoTransform;
use crate::errors::{RasterError, Result};
use crate::gcp::Gcp;
use crate::metadata::MetadataStore;
use crate::raster::color_table::ColorTable;
use crate::raster::create_options::Interleave;
use crate::raster::descriptor::BufferDescriptor;
use crate::raster::histogram::Histogram;
use crate::raster::mask::{AllValidMask, MaskBand, NoDataMask};
use crate::raster::overview::{self, OverviewResampling};
use crate::raster::rasterband::ColorInterpretation;
use crate::raster::rat::RasterAttributeTable;
use crate::raster::types::{DataType, Sample};

/// Config option capping the size, in bytes, of any single pixel allocation.
pub const MEM_MAX_ALLOCATION: &str = "MEM_MAX_ALLOCATION";

/// Fallible, zero-initialized allocation of `len` bytes.
pub(crate) fn allocate(len: usize, what: &'static str) -> Result<Vec<u8>> {
    if len > isize::MAX as usize {
        return Err(RasterError::AllocationFailure {
            what,
            msg: format!("{len} bytes exceeds the addressable size"),
        });
    }
    if let Some(limit) = allocation_limit() {
        if len > limit {
            log::debug!("refusing {len} byte allocation for {what}, limit is {limit}");
            return Err(RasterError::AllocationFailure {
                what,
                msg: format!("{len} bytes exceeds {MEM_MAX_ALLOCATION}={limit}"),
            });
        }
    }
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| RasterError::AllocationFailure {
            what,
            msg: format!("{len} bytes: {e}"),
        })?;
    data.resize(len, 0);
    Ok(data)
}

/// Fallible growth of `list` by `additional` entries.
pub(crate) fn reserve<T>(list: &mut Vec<T>, additional: usize, what: &'static str) -> Result<()> {
    list.try_reserve_exact(additional)
        .map_err(|e| RasterError::AllocationFailure {
            what,
            msg: format!("{additional} more entries: {e}"),
        })
}

fn allocation_limit() -> Option<usize> {
    let value = config::get_config_option(MEM_MAX_ALLOCATION, "").ok()?;
    if value.is_empty() {
        return None;
    }
    match value.trim().parse::<usize>() {
        Ok(limit) => Some(limit),
        Err(_) => {
            log::warn!("ignoring invalid {MEM_MAX_ALLOCATION} value '{value}'");
            None
        }
    }
}

/// Byte size of `count` planes of `size` pixels of `data_type`, checked for overflow.
pub(crate) fn plane_bytes(size: (usize, usize), count: usize, data_type: DataType) -> Result<usize> {
    size.0
        .checked_mul(size.1)
        .and_then(|pixels| pixels.checked_mul(count))
        .and_then(|elements| elements.checked_mul(data_type.bytes()))
        .ok_or_else(|| RasterError::AllocationFailure {
            what: "raster",
            msg: format!(
                "{}x{}x{} {} elements overflow the addressable size",
                size.0, size.1, count, data_type
            ),
        })
}

/// How to address one band inside a byte slice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub data_type: DataType,
    pub size: (usize, usize),
    pub offset: usize,
    pub pixel_stride: usize,
    pub line_stride: usize,
}

impl Layout {
    pub(crate) fn packed(data_type: DataType, size: (usize, usize)) -> Self {
        Layout {
            data_type,
            size,
            offset: 0,
            pixel_stride: data_type.bytes(),
            line_stride: data_type.bytes() * size.0,
        }
    }

    fn byte_offset(&self, x: usize, y: usize) -> usize {
        self.offset + y * self.line_stride + x * self.pixel_stride
    }
}

/// Something pixels can be sampled from, real or synthetic.
pub(crate) trait PixelSource {
    fn size(&self) -> (usize, usize);
    fn data_type(&self) -> DataType;
    fn sample(&self, x: usize, y: usize) -> Sample;
}

pub(crate) struct RasterView<'a> {
    pub data: &'a [u8],
    pub layout: Layout,
}

impl PixelSource for RasterView<'_> {
    fn size(&self) -> (usize, usize) {
        self.layout.size
    }

    fn data_type(&self) -> DataType {
        self.layout.data_type
    }

    fn sample(&self, x: usize, y: usize) -> Sample {
        let offset = self.layout.byte_offset(x, y);
        self.layout.data_type.read_sample(&self.data[offset..])
    }
}

pub(crate) struct RasterViewMut<'a> {
    pub data: &'a mut [u8],
    pub layout: Layout,
}

impl RasterViewMut<'_> {
    pub(crate) fn put(&mut self, x: usize, y: usize, sample: Sample) {
        let offset = self.layout.byte_offset(x, y);
        self.layout
            .data_type
            .write_sample(sample, &mut self.data[offset..]);
    }

    pub(crate) fn fill(&mut self, value: Sample) {
        let (width, height) = self.layout.size;
        let value = self.layout.data_type.convert(value);
        for y in 0..height {
            for x in 0..width {
                self.put(x, y, value);
            }
        }
    }
}

impl PixelSource for RasterViewMut<'_> {
    fn size(&self) -> (usize, usize) {
        self.layout.size
    }

    fn data_type(&self) -> DataType {
        self.layout.data_type
    }

    fn sample(&self, x: usize, y: usize) -> Sample {
        let offset = self.layout.byte_offset(x, y);
        self.layout.data_type.read_sample(&self.data[offset..])
    }
}

pub(crate) enum Pixels {
    Owned(Vec<u8>),
    /// A view into the dataset's shared buffer.
    Shared {
        offset: usize,
        pixel_stride: usize,
        line_stride: usize,
    },
}

/// Descriptive state of a band; none of it is interpreted by pixel I/O.
#[derive(Default)]
pub(crate) struct BandInfo {
    pub no_data: Option<f64>,
    pub category_names: Option<Vec<String>>,
    pub color_table: Option<ColorTable>,
    pub rat: Option<RasterAttributeTable>,
    pub histogram: Option<Histogram>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub unit: String,
    pub color_interpretation: ColorInterpretation,
    pub metadata: MetadataStore,
}

pub(crate) struct BandState {
    pub data_type: DataType,
    pub size: (usize, usize),
    pub info: BandInfo,
    pub pixels: Pixels,
    pub mask: MaskBand,
    pub overviews: Vec<BandState>,
}

impl BandState {
    pub(crate) fn owned(data_type: DataType, size: (usize, usize), data: Vec<u8>) -> Self {
        BandState {
            data_type,
            size,
            info: BandInfo::default(),
            pixels: Pixels::Owned(data),
            mask: MaskBand::AllValid,
            overviews: Vec::new(),
        }
    }

    /// A band addressing the dataset's shared buffer.
    pub(crate) fn shared(
        data_type: DataType,
        size: (usize, usize),
        offset: usize,
        pixel_stride: usize,
        line_stride: usize,
    ) -> Self {
        let mut band = Self::owned(data_type, size, Vec::new());
        band.pixels = Pixels::Shared {
            offset,
            pixel_stride,
            line_stride,
        };
        band
    }

    /// A new zeroed band owning its storage.
    pub(crate) fn allocate(data_type: DataType, size: (usize, usize)) -> Result<Self> {
        let len = plane_bytes(size, 1, data_type)?;
        Ok(Self::owned(data_type, size, allocate(len, "band")?))
    }

    /// A new `u8` band with every pixel valid.
    pub(crate) fn valid_mask(size: (usize, usize)) -> Result<Self> {
        let len = plane_bytes(size, 1, DataType::UInt8)?;
        let mut data = allocate(len, "mask band")?;
        data.fill(255);
        Ok(Self::owned(DataType::UInt8, size, data))
    }

    pub(crate) fn layout(&self) -> Layout {
        match self.pixels {
            Pixels::Owned(_) => Layout::packed(self.data_type, self.size),
            Pixels::Shared {
                offset,
                pixel_stride,
                line_stride,
            } => Layout {
                data_type: self.data_type,
                size: self.size,
                offset,
                pixel_stride,
                line_stride,
            },
        }
    }

    pub(crate) fn view<'s>(&'s self, shared: &'s [u8]) -> RasterView<'s> {
        let data = match &self.pixels {
            Pixels::Owned(data) => data.as_slice(),
            Pixels::Shared { .. } => shared,
        };
        RasterView {
            data,
            layout: self.layout(),
        }
    }

    fn stored<'s>(&'s mut self, shared: &'s mut [u8]) -> Target<'s> {
        let layout = self.layout();
        let BandState { info, pixels, .. } = self;
        let data = match pixels {
            Pixels::Owned(data) => data.as_mut_slice(),
            Pixels::Shared { .. } => shared,
        };
        Target::Stored {
            info,
            view: RasterViewMut { data, layout },
        }
    }

    fn mask_target<'s>(
        &'s mut self,
        dataset_mask: &'s mut Option<Box<BandState>>,
        shared: &'s mut [u8],
    ) -> Target<'s> {
        match self.mask {
            MaskBand::Private(ref mut mask) => mask.stored(shared),
            MaskBand::PerDataset => match dataset_mask {
                Some(mask) => mask.stored(shared),
                None => Target::AllValid(AllValidMask { size: self.size }),
            },
            MaskBand::AllValid => match self.info.no_data {
                Some(no_data) => {
                    let shared: &'s [u8] = shared;
                    Target::NoData(NoDataMask {
                        view: self.view(shared),
                        no_data,
                    })
                }
                None => Target::AllValid(AllValidMask { size: self.size }),
            },
        }
    }
}

/// Address of a band reachable from a dataset. Band indices are 0-based here.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BandPath {
    Band(usize),
    Overview(usize, usize),
    /// Mask of a band, or of one of its overviews.
    Mask(usize, Option<usize>),
    /// Mask of a mask, always valid.
    AllValid((usize, usize)),
}

/// A band resolved for one operation.
pub(crate) enum Target<'s> {
    Stored {
        info: &'s mut BandInfo,
        view: RasterViewMut<'s>,
    },
    AllValid(AllValidMask),
    NoData(NoDataMask<'s>),
}

impl Target<'_> {
    pub(crate) fn source(&self) -> &dyn PixelSource {
        match self {
            Target::Stored { view, .. } => view,
            Target::AllValid(mask) => mask,
            Target::NoData(mask) => mask,
        }
    }
}

pub(crate) struct DatasetState {
    pub size: (usize, usize),
    pub interleave: Interleave,
    /// Storage of the bands created with a pixel-interleaved dataset.
    pub shared: Vec<u8>,
    pub bands: Vec<BandState>,
    pub mask: Option<Box<BandState>>,
    pub metadata: MetadataStore,
    pub projection: String,
    pub geo_transform: Option<GeoTransform>,
    pub gcps: Vec<Gcp>,
    pub gcp_projection: Option<String>,
}

impl DatasetState {
    /// Allocate a dataset with one band per entry of `band_types`.
    ///
    /// Pixel interleaved bands share one buffer; a pixel holds the samples of
    /// all bands in band order.
    ///
    /// The band list is reserved up front, so a huge band count fails with
    /// [`RasterError::AllocationFailure`] before any pixel is allocated.
    pub(crate) fn new<I>(size: (usize, usize), band_types: I, interleave: Interleave) -> Result<Self>
    where
        I: IntoIterator<Item = DataType>,
        I::IntoIter: Clone,
    {
        let band_types = band_types.into_iter();
        let mut state = Self::empty(size, interleave)?;
        reserve(&mut state.bands, band_types.size_hint().0, "band list")?;
        let pixel_stride = band_types
            .clone()
            .try_fold(0usize, |stride, dt| stride.checked_add(dt.bytes()))
            .ok_or_else(|| RasterError::AllocationFailure {
                what: "raster",
                msg: "the bands overflow the pixel size".to_string(),
            })?;
        let len = plane_bytes(size, pixel_stride, DataType::UInt8)?;
        match interleave {
            Interleave::Band => {
                for data_type in band_types {
                    state.bands.push(BandState::allocate(data_type, size)?);
                }
            }
            Interleave::Pixel => {
                state.shared = allocate(len, "pixel interleaved raster")?;
                let line_stride = pixel_stride * size.0;
                let mut offset = 0;
                for data_type in band_types {
                    state.bands.push(BandState::shared(
                        data_type,
                        size,
                        offset,
                        pixel_stride,
                        line_stride,
                    ));
                    offset += data_type.bytes();
                }
            }
        }
        state.set_interleave(interleave)?;
        log::debug!(
            "allocated {}x{} raster of {} band(s), {interleave} interleaved",
            size.0,
            size.1,
            state.bands.len(),
        );
        Ok(state)
    }

    /// Adopt `buffer` as the storage of the bands `descriptor` lays out in it.
    ///
    /// Writes to the bands land in `buffer`, which
    /// [`DatasetState::into_shared`] hands back.
    pub(crate) fn wrap(buffer: Vec<u8>, descriptor: &BufferDescriptor) -> Result<Self> {
        let required = descriptor.required_len()?;
        if buffer.len() < required {
            return Err(RasterError::BadArgument(format!(
                "buffer of {} bytes is smaller than the {required} bytes its layout addresses",
                buffer.len()
            )));
        }
        let (pixel_offset, line_offset, band_offset) = descriptor.offsets()?;
        let interleave = if descriptor.bands > 1 && band_offset < pixel_offset {
            Interleave::Pixel
        } else {
            Interleave::Band
        };
        let mut state = Self::empty(descriptor.size, interleave)?;
        reserve(&mut state.bands, descriptor.bands, "band list")?;
        for band in 0..descriptor.bands {
            state.bands.push(BandState::shared(
                descriptor.data_type,
                descriptor.size,
                band * band_offset,
                pixel_offset,
                line_offset,
            ));
        }
        state.shared = buffer;
        state.set_interleave(interleave)?;
        log::debug!(
            "wrapped {} byte buffer as {}x{} raster of {} band(s)",
            state.shared.len(),
            descriptor.size.0,
            descriptor.size.1,
            descriptor.bands
        );
        Ok(state)
    }

    fn empty(size: (usize, usize), interleave: Interleave) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(RasterError::BadArgument(format!(
                "raster size {}x{} must be positive",
                size.0, size.1
            )));
        }
        Ok(DatasetState {
            size,
            interleave,
            shared: Vec::new(),
            bands: Vec::new(),
            mask: None,
            metadata: MetadataStore::default(),
            projection: String::new(),
            geo_transform: None,
            gcps: Vec::new(),
            gcp_projection: None,
        })
    }

    fn set_interleave(&mut self, interleave: Interleave) -> Result<()> {
        self.interleave = interleave;
        self.metadata
            .set_item("INTERLEAVE", interleave.as_str(), "IMAGE_STRUCTURE")
    }

    /// The shared buffer; empty when every band owns its storage.
    pub(crate) fn into_shared(self) -> Vec<u8> {
        self.shared
    }

    /// Append a band owning its storage; it shares the dataset mask if there is one.
    pub(crate) fn add_band(&mut self, data_type: DataType) -> Result<()> {
        reserve(&mut self.bands, 1, "band list")?;
        let mut band = BandState::allocate(data_type, self.size)?;
        if self.mask.is_some() {
            band.mask = MaskBand::PerDataset;
        }
        self.bands.push(band);
        Ok(())
    }

    /// Create the dataset-wide mask, replacing the masks of every band.
    pub(crate) fn create_dataset_mask(&mut self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(RasterError::unsupported(
                "create_mask_band",
                "a per-dataset mask needs at least one band",
            ));
        }
        self.mask = Some(Box::new(BandState::valid_mask(self.size)?));
        for band in &mut self.bands {
            band.mask = MaskBand::PerDataset;
        }
        Ok(())
    }

    /// Create a mask owned by the band or overview at `path`.
    pub(crate) fn create_band_mask(&mut self, path: BandPath) -> Result<()> {
        if matches!(path, BandPath::Band(_)) && self.mask.is_some() {
            return Err(RasterError::unsupported(
                "create_mask_band",
                "the dataset already has a per-dataset mask",
            ));
        }
        let state = self.state_mut(path)?.ok_or_else(|| {
            RasterError::unsupported("create_mask_band", "mask bands cannot have masks")
        })?;
        state.mask = MaskBand::Private(Box::new(BandState::valid_mask(state.size)?));
        Ok(())
    }

    /// Build or clear overviews of `bands` (0-based, all bands when empty).
    ///
    /// Every overview is computed from full resolution before any is attached.
    pub(crate) fn build_overviews(
        &mut self,
        resampling: OverviewResampling,
        levels: &[usize],
        bands: &[usize],
    ) -> Result<()> {
        overview::check_levels(levels)?;
        let bands = if bands.is_empty() {
            (0..self.bands.len()).collect()
        } else {
            for &band in bands {
                self.band(band)?;
            }
            bands.to_vec()
        };
        if resampling == OverviewResampling::None {
            for &band in &bands {
                self.bands[band].overviews.clear();
            }
            return Ok(());
        }
        if self.bands.is_empty() {
            return Err(RasterError::unsupported(
                "build_overviews",
                "the dataset has no bands",
            ));
        }
        let pending = bands
            .iter()
            .map(|&band| {
                let state = &self.bands[band];
                let view = state.view(&self.shared);
                let mask = match &state.mask {
                    MaskBand::Private(mask) => Some(mask.view(&self.shared)),
                    MaskBand::PerDataset => self.mask.as_ref().map(|m| m.view(&self.shared)),
                    MaskBand::AllValid => None,
                };
                overview::compute(
                    &view,
                    mask.as_ref().map(|m| m as &dyn PixelSource),
                    resampling,
                    levels,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        for (&band, overviews) in bands.iter().zip(pending) {
            overviews.commit(&mut self.bands[band]);
        }
        log::debug!(
            "built {resampling} overviews {levels:?} for {} band(s)",
            bands.len()
        );
        Ok(())
    }

    pub(crate) fn band(&self, band: usize) -> Result<&BandState> {
        let count = self.bands.len();
        self.bands
            .get(band)
            .ok_or(RasterError::InvalidBandIndex {
                index: band + 1,
                count,
            })
    }

    pub(crate) fn band_mut(&mut self, band: usize) -> Result<&mut BandState> {
        let count = self.bands.len();
        self.bands
            .get_mut(band)
            .ok_or(RasterError::InvalidBandIndex {
                index: band + 1,
                count,
            })
    }

    /// The band state at `path`, if `path` addresses a stored band or overview.
    pub(crate) fn state(&self, path: BandPath) -> Result<Option<&BandState>> {
        match path {
            BandPath::Band(band) => self.band(band).map(Some),
            BandPath::Overview(band, overview) => overview_of(self.band(band)?, overview).map(Some),
            BandPath::Mask(..) | BandPath::AllValid(_) => Ok(None),
        }
    }

    pub(crate) fn state_mut(&mut self, path: BandPath) -> Result<Option<&mut BandState>> {
        match path {
            BandPath::Band(band) => self.band_mut(band).map(Some),
            BandPath::Overview(band, overview) => {
                let state = self.band_mut(band)?;
                let count = state.overviews.len();
                state
                    .overviews
                    .get_mut(overview)
                    .map(Some)
                    .ok_or(RasterError::InvalidOverviewIndex {
                        index: overview,
                        count,
                    })
            }
            BandPath::Mask(..) | BandPath::AllValid(_) => Ok(None),
        }
    }

    /// Resolve `path` for a single operation.
    pub(crate) fn target(&mut self, path: BandPath) -> Result<Target<'_>> {
        let count = self.bands.len();
        let DatasetState {
            shared,
            bands,
            mask,
            ..
        } = self;
        let invalid_band = |band: usize| RasterError::InvalidBandIndex {
            index: band + 1,
            count,
        };
        match path {
            BandPath::Band(band) => {
                let state = bands.get_mut(band).ok_or_else(|| invalid_band(band))?;
                Ok(state.stored(shared))
            }
            BandPath::Overview(band, overview) => {
                let state = bands.get_mut(band).ok_or_else(|| invalid_band(band))?;
                let overview = overview_of_mut(state, overview)?;
                Ok(overview.stored(shared))
            }
            BandPath::Mask(band, overview) => {
                let state = bands.get_mut(band).ok_or_else(|| invalid_band(band))?;
                let state = match overview {
                    Some(overview) => overview_of_mut(state, overview)?,
                    None => state,
                };
                Ok(state.mask_target(mask, shared))
            }
            BandPath::AllValid(size) => Ok(Target::AllValid(AllValidMask { size })),
        }
    }
}

fn overview_of(state: &BandState, overview: usize) -> Result<&BandState> {
    state
        .overviews
        .get(overview)
        .ok_or(RasterError::InvalidOverviewIndex {
            index: overview,
            count: state.overviews.len(),
        })
}

fn overview_of_mut(state: &mut BandState, overview: usize) -> Result<&mut BandState> {
    let count = state.overviews.len();
    state
        .overviews
        .get_mut(overview)
        .ok_or(RasterError::InvalidOverviewIndex {
            index: overview,
            count,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_bytes_overflow() {
        assert_eq!(plane_bytes((10, 20), 3, DataType::Int16).unwrap(), 1200);
        assert!(matches!(
            plane_bytes((usize::MAX, 2), 1, DataType::UInt8),
            Err(RasterError::AllocationFailure { .. })
        ));
        assert!(matches!(
            plane_bytes((1, 1), usize::MAX, DataType::Float64),
            Err(RasterError::AllocationFailure { .. })
        ));
    }

    #[test]
    fn test_interleaved_layout() {
        let state = DatasetState::new((4, 3), [DataType::Int16; 3], Interleave::Pixel).unwrap();
        assert_eq!(state.shared.len(), 4 * 3 * 3 * 2);
        let layout = state.bands[1].layout();
        assert_eq!(layout.offset, 2);
        assert_eq!(layout.pixel_stride, 6);
        assert_eq!(layout.line_stride, 24);
        assert_eq!(
            state.metadata.item("INTERLEAVE", "IMAGE_STRUCTURE"),
            Some("PIXEL")
        );
    }

    #[test]
    fn test_interleaved_write_through() {
        let mut state = DatasetState::new((2, 2), [DataType::UInt8; 2], Interleave::Pixel).unwrap();
        if let Target::Stored { mut view, .. } = state.target(BandPath::Band(1)).unwrap() {
            view.put(1, 0, Sample::Int(9));
        } else {
            panic!("band 2 is stored");
        }
        assert_eq!(state.shared, vec![0, 0, 0, 9, 0, 0, 0, 0]);
        let view = state.bands[1].view(&state.shared);
        assert_eq!(view.sample(1, 0), Sample::Int(9));
        assert_eq!(state.bands[0].view(&state.shared).sample(1, 0), Sample::Int(0));
    }

    #[test]
    fn test_no_data_mask_target() {
        let mut state = DatasetState::new((2, 1), [DataType::UInt8], Interleave::Band).unwrap();
        state.bands[0].info.no_data = Some(0.0);
        let target = state.target(BandPath::Mask(0, None)).unwrap();
        let source = target.source();
        assert_eq!(source.sample(0, 0), Sample::Int(0));
    }
}
