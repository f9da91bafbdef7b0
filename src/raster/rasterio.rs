//! Windowed pixel transfer between bands and caller buffers.
//!
//! Every transfer is described by a source window on the raster, a buffer
//! size, and a [`BufferLayout`] locating each buffer element. When window
//! and buffer sizes differ, samples are resampled per axis.

use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::str::FromStr;

use crate::errors::{RasterError, Result};
use crate::raster::storage::{PixelSource, RasterViewMut};
use crate::raster::types::{DataType, RasterType, Sample};

/// Resampling applied when a read window and buffer differ in size.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ResampleAlg {
    /// Nearest neighbour
    #[default]
    NearestNeighbour,
    /// Average of all contributing non-empty pixels
    Average,
}

impl ResampleAlg {
    pub fn to_gdal_str(&self) -> &'static str {
        match self {
            ResampleAlg::NearestNeighbour => "NearestNeighbour",
            ResampleAlg::Average => "Average",
        }
    }

    pub fn iter() -> impl Iterator<Item = ResampleAlg> {
        [ResampleAlg::NearestNeighbour, ResampleAlg::Average].into_iter()
    }
}

impl Display for ResampleAlg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_gdal_str())
    }
}

impl FromStr for ResampleAlg {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearestneighbour" | "nearest" | "near" => Ok(ResampleAlg::NearestNeighbour),
            "average" => Ok(ResampleAlg::Average),
            _ => Err(RasterError::BadArgument(format!(
                "{s} is not a valid resampling algorithm"
            ))),
        }
    }
}

/// Extra arguments to the byte level read and write methods.
///
/// Strides are in bytes. Unset strides default to a packed layout: one element
/// per pixel, `buffer width` pixels per line and `buffer height` lines per band.
/// Negative strides walk the buffer backwards.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RasterIoOptions {
    /// Element type of the caller's buffer; defaults to the band type.
    pub data_type: Option<DataType>,
    pub pixel_stride: Option<isize>,
    pub line_stride: Option<isize>,
    pub band_stride: Option<isize>,
    pub resample_alg: ResampleAlg,
}

impl RasterIoOptions {
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_strides(mut self, pixel: isize, line: isize) -> Self {
        self.pixel_stride = Some(pixel);
        self.line_stride = Some(line);
        self
    }

    pub fn with_band_stride(mut self, band: isize) -> Self {
        self.band_stride = Some(band);
        self
    }

    pub fn with_resample_alg(mut self, resample_alg: ResampleAlg) -> Self {
        self.resample_alg = resample_alg;
        self
    }
}

/// A validated window on a raster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Window {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub(crate) fn full(size: (usize, usize)) -> Self {
        Window {
            x: 0,
            y: 0,
            width: size.0,
            height: size.1,
        }
    }

    pub(crate) fn checked(
        offset: (isize, isize),
        size: (usize, usize),
        raster: (usize, usize),
    ) -> Result<Self> {
        let out_of_bounds = || RasterError::OutOfBounds {
            x_off: offset.0,
            y_off: offset.1,
            x_size: size.0,
            y_size: size.1,
            raster_x: raster.0,
            raster_y: raster.1,
        };
        if size.0 == 0 || size.1 == 0 {
            return Err(RasterError::BadArgument(format!(
                "empty window of size {}x{}",
                size.0, size.1
            )));
        }
        if offset.0 < 0 || offset.1 < 0 {
            return Err(out_of_bounds());
        }
        let (x, y) = (offset.0 as usize, offset.1 as usize);
        let fits = |origin: usize, len: usize, total: usize| {
            origin.checked_add(len).is_some_and(|end| end <= total)
        };
        if !fits(x, size.0, raster.0) || !fits(y, size.1, raster.1) {
            return Err(out_of_bounds());
        }
        Ok(Window {
            x,
            y,
            width: size.0,
            height: size.1,
        })
    }
}

/// Location of every element of a caller buffer, in units of the buffer slice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct BufferLayout {
    pub size: (usize, usize),
    origin: isize,
    pixel: isize,
    line: isize,
    band: isize,
}

impl BufferLayout {
    /// Packed layout of a typed buffer holding `band_count` planes.
    pub(crate) fn packed(
        size: (usize, usize),
        band_count: usize,
        buffer_len: usize,
    ) -> Result<Self> {
        let line = size.0 as isize;
        let band = line.saturating_mul(size.1 as isize);
        Self::new(size, band_count, 1, (1, line, band), buffer_len)
    }

    /// Layout of a byte buffer holding `band_count` planes of `data_type`.
    pub(crate) fn bytes(
        size: (usize, usize),
        band_count: usize,
        data_type: DataType,
        options: &RasterIoOptions,
        buffer_len: usize,
    ) -> Result<Self> {
        let elem = data_type.bytes() as isize;
        let pixel = options.pixel_stride.unwrap_or(elem);
        let line = options
            .line_stride
            .unwrap_or_else(|| pixel.saturating_mul(size.0 as isize));
        let band = options
            .band_stride
            .unwrap_or_else(|| line.saturating_mul(size.1 as isize));
        Self::new(
            size,
            band_count,
            data_type.bytes(),
            (pixel, line, band),
            buffer_len,
        )
    }

    fn new(
        size: (usize, usize),
        band_count: usize,
        elem: usize,
        (pixel, line, band): (isize, isize, isize),
        buffer_len: usize,
    ) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(RasterError::BadArgument(format!(
                "empty buffer of size {}x{}",
                size.0, size.1
            )));
        }
        let axes = [
            ("pixel", pixel, size.0),
            ("line", line, size.1),
            ("band", band, band_count.max(1)),
        ];
        let (mut low, mut high) = (0i128, 0i128);
        for (name, stride, count) in axes {
            if count > 1 && stride != 0 && (stride.unsigned_abs()) < elem {
                return Err(RasterError::BadArgument(format!(
                    "{name} stride {stride} is smaller than the element size {elem}"
                )));
            }
            let extent = (count as i128 - 1) * stride as i128;
            low += extent.min(0);
            high += extent.max(0);
        }
        let needed = high - low + elem as i128;
        if needed > buffer_len as i128 {
            return Err(RasterError::BadArgument(format!(
                "buffer of {buffer_len} units is too small, the layout spans {needed}"
            )));
        }
        Ok(BufferLayout {
            size,
            origin: (-low) as isize,
            pixel,
            line,
            band,
        })
    }

    fn address(&self, band: usize, x: usize, y: usize) -> usize {
        (self.origin + band as isize * self.band + y as isize * self.line + x as isize * self.pixel)
            as usize
    }
}

/// A caller buffer being written by a read.
pub(crate) trait BufferSink {
    fn data_type(&self) -> DataType;
    fn put(&mut self, address: usize, sample: Sample);
}

/// A caller buffer being read by a write.
pub(crate) trait BufferSource {
    fn get(&self, address: usize) -> Sample;
}

pub(crate) struct TypedSink<'a, T>(pub &'a mut [T]);

impl<T: RasterType> BufferSink for TypedSink<'_, T> {
    fn data_type(&self) -> DataType {
        T::datatype()
    }

    fn put(&mut self, address: usize, sample: Sample) {
        self.0[address] = T::from_sample(sample);
    }
}

pub(crate) struct TypedSource<'a, T>(pub &'a [T]);

impl<T: RasterType> BufferSource for TypedSource<'_, T> {
    fn get(&self, address: usize) -> Sample {
        self.0[address].to_sample()
    }
}

pub(crate) struct ByteSink<'a> {
    pub data: &'a mut [u8],
    pub data_type: DataType,
}

impl BufferSink for ByteSink<'_> {
    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn put(&mut self, address: usize, sample: Sample) {
        self.data_type.write_sample(sample, &mut self.data[address..]);
    }
}

pub(crate) struct ByteSource<'a> {
    pub data: &'a [u8],
    pub data_type: DataType,
}

impl BufferSource for ByteSource<'_> {
    fn get(&self, address: usize) -> Sample {
        self.data_type.read_sample(&self.data[address..])
    }
}

/// For each buffer index along one axis, the raster indices it samples.
pub(crate) fn source_spans(
    origin: usize,
    window: usize,
    buffer: usize,
    alg: ResampleAlg,
) -> Vec<Range<usize>> {
    if window == buffer {
        return (origin..origin + window).map(|i| i..i + 1).collect();
    }
    let ratio = window as f64 / buffer as f64;
    (0..buffer)
        .map(|i| {
            if alg == ResampleAlg::Average && buffer < window {
                let start = ((i as f64 * ratio).round() as usize).min(window - 1);
                let end = (((i + 1) as f64 * ratio).round() as usize)
                    .min(window)
                    .max(start + 1);
                origin + start..origin + end
            } else {
                let src = nearest(i, ratio, window);
                origin + src..origin + src + 1
            }
        })
        .collect()
}

/// For each raster index along one axis of a written window, the buffer
/// indices that land on it.
fn buffer_spans(window: usize, buffer: usize) -> Vec<Range<usize>> {
    if window == buffer {
        return (0..window).map(|i| i..i + 1).collect();
    }
    if buffer < window {
        let ratio = buffer as f64 / window as f64;
        return (0..window)
            .map(|d| {
                let src = nearest(d, ratio, buffer);
                src..src + 1
            })
            .collect();
    }
    let ratio = window as f64 / buffer as f64;
    let mut spans = vec![usize::MAX..0; window];
    for e in 0..buffer {
        let span = &mut spans[nearest(e, ratio, window)];
        span.start = span.start.min(e);
        span.end = span.end.max(e + 1);
    }
    spans
}

fn nearest(index: usize, ratio: f64, len: usize) -> usize {
    (((index as f64 + 0.5) * ratio) as usize).min(len - 1)
}

fn mean(samples: impl Iterator<Item = Sample>, dest: DataType) -> Sample {
    let (sum, count) = samples.fold((0.0, 0usize), |(sum, count), s| (sum + s.as_f64(), count + 1));
    let mean = if count == 0 { 0.0 } else { sum / count as f64 };
    if dest.is_integer() {
        Sample::Float(mean.round())
    } else {
        Sample::Float(mean)
    }
}

/// Copy `window` of `source` into plane `band` of a caller buffer.
pub(crate) fn read_window(
    source: &dyn PixelSource,
    window: &Window,
    sink: &mut dyn BufferSink,
    layout: &BufferLayout,
    band: usize,
    alg: ResampleAlg,
) {
    let xs = source_spans(window.x, window.width, layout.size.0, alg);
    let ys = source_spans(window.y, window.height, layout.size.1, alg);
    let dest = sink.data_type();
    for (by, rows) in ys.iter().enumerate() {
        for (bx, cols) in xs.iter().enumerate() {
            let sample = if rows.len() == 1 && cols.len() == 1 {
                source.sample(cols.start, rows.start)
            } else {
                let samples = rows
                    .clone()
                    .flat_map(|y| cols.clone().map(move |x| (x, y)))
                    .map(|(x, y)| source.sample(x, y));
                mean(samples, dest)
            };
            sink.put(layout.address(band, bx, by), sample);
        }
    }
}

/// Copy plane `band` of a caller buffer into `window` of `dest`.
pub(crate) fn write_window(
    dest: &mut RasterViewMut<'_>,
    window: &Window,
    source: &dyn BufferSource,
    layout: &BufferLayout,
    band: usize,
) {
    let xs = buffer_spans(window.width, layout.size.0);
    let ys = buffer_spans(window.height, layout.size.1);
    let dest_type = dest.layout.data_type;
    for (wy, rows) in ys.iter().enumerate() {
        for (wx, cols) in xs.iter().enumerate() {
            let sample = if rows.len() == 1 && cols.len() == 1 {
                source.get(layout.address(band, cols.start, rows.start))
            } else {
                let samples = rows
                    .clone()
                    .flat_map(|y| cols.clone().map(move |x| (x, y)))
                    .map(|(x, y)| source.get(layout.address(band, x, y)));
                mean(samples, dest_type)
            };
            dest.put(window.x + wx, window.y + wy, sample);
        }
    }
}
