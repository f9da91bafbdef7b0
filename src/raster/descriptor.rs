//! Layout of a caller supplied pixel buffer.

use crate::cpl::NameValueList;
use crate::errors::{RasterError, Result};
use crate::raster::types::DataType;

/// Prefix of dataset names that describe a caller supplied buffer.
pub const MEM_BUFFER_PREFIX: &str = "MEM:::";

/// Where the samples of each band sit inside a caller supplied buffer.
///
/// Offsets are in bytes. Unset offsets default to band sequential storage:
/// samples packed along a line, lines packed in a band, bands one after the other.
///
/// ```
/// use memraster::raster::{BufferDescriptor, DataType};
///
/// let descriptor = BufferDescriptor::from_name("MEM:::PIXELS=50,LINES=3,DATATYPE=Float32").unwrap();
/// assert_eq!(descriptor.size, (50, 3));
/// assert_eq!(descriptor.data_type, DataType::Float32);
/// assert_eq!(descriptor.required_len().unwrap(), 600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub size: (usize, usize),
    pub bands: usize,
    pub data_type: DataType,
    pub pixel_offset: Option<usize>,
    pub line_offset: Option<usize>,
    pub band_offset: Option<usize>,
}

impl BufferDescriptor {
    /// A single band of `data_type` samples, packed.
    pub fn new(size: (usize, usize), data_type: DataType) -> Self {
        BufferDescriptor {
            size,
            bands: 1,
            data_type,
            pixel_offset: None,
            line_offset: None,
            band_offset: None,
        }
    }

    pub fn with_bands(mut self, bands: usize) -> Self {
        self.bands = bands;
        self
    }

    /// Set the byte distance between neighbouring pixels, lines and bands.
    pub fn with_offsets(mut self, pixel: usize, line: usize, band: usize) -> Self {
        self.pixel_offset = Some(pixel);
        self.line_offset = Some(line);
        self.band_offset = Some(band);
        self
    }

    /// Parse a `MEM:::KEY=VALUE,...` dataset name.
    ///
    /// `PIXELS` and `LINES` are required. `BANDS`, `DATATYPE`, `PIXELOFFSET`,
    /// `LINEOFFSET` and `BANDOFFSET` are optional. Raw addresses
    /// (`DATAPOINTER`) are refused: the buffer itself is handed to
    /// [`Driver::create_from_buffer`](crate::Driver::create_from_buffer).
    pub fn from_name(name: &str) -> Result<Self> {
        let items = name
            .get(..MEM_BUFFER_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(MEM_BUFFER_PREFIX))
            .map(|_| &name[MEM_BUFFER_PREFIX.len()..])
            .ok_or_else(|| {
                RasterError::BadArgument(format!(
                    "'{name}' does not start with {MEM_BUFFER_PREFIX}"
                ))
            })?;
        let mut options = NameValueList::new();
        for item in items.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let (key, value) = item.split_once('=').ok_or_else(|| {
                RasterError::BadArgument(format!("'{item}' is not a KEY=VALUE pair"))
            })?;
            options.set_name_value(key.trim(), value.trim())?;
        }
        if options.fetch_name_value("DATAPOINTER").is_some() {
            return Err(RasterError::unsupported(
                "BufferDescriptor::from_name",
                "DATAPOINTER is not accepted, pass the buffer to create_from_buffer",
            ));
        }

        let required = |key: &str| {
            options
                .fetch_name_value(key)
                .ok_or_else(|| RasterError::BadArgument(format!("missing {key} in '{name}'")))
                .and_then(|value| parse_count(key, value))
        };
        let optional = |key: &str| {
            options
                .fetch_name_value(key)
                .map(|value| parse_count(key, value))
                .transpose()
        };
        let data_type = match options.fetch_name_value("DATATYPE") {
            Some(name) => name.parse()?,
            None => DataType::UInt8,
        };
        Ok(BufferDescriptor {
            size: (required("PIXELS")?, required("LINES")?),
            bands: optional("BANDS")?.unwrap_or(1),
            data_type,
            pixel_offset: optional("PIXELOFFSET")?,
            line_offset: optional("LINEOFFSET")?,
            band_offset: optional("BANDOFFSET")?,
        })
    }

    /// The pixel, line and band offsets with their defaults filled in.
    pub fn offsets(&self) -> Result<(usize, usize, usize)> {
        let pixel = self.pixel_offset.unwrap_or(self.data_type.bytes());
        let line = match self.line_offset {
            Some(line) => line,
            None => pixel.checked_mul(self.size.0).ok_or_else(|| self.overflow())?,
        };
        let band = match self.band_offset {
            Some(band) => band,
            None => line.checked_mul(self.size.1).ok_or_else(|| self.overflow())?,
        };
        Ok((pixel, line, band))
    }

    /// Smallest buffer length, in bytes, that holds every addressed sample.
    pub fn required_len(&self) -> Result<usize> {
        if self.bands == 0 || self.size.0 == 0 || self.size.1 == 0 {
            return Ok(0);
        }
        let (pixel, line, band) = self.offsets()?;
        let last = |count: usize, stride: usize| (count - 1).checked_mul(stride);
        last(self.bands, band)
            .zip(last(self.size.1, line))
            .zip(last(self.size.0, pixel))
            .and_then(|((b, l), p)| b.checked_add(l)?.checked_add(p))
            .and_then(|end| end.checked_add(self.data_type.bytes()))
            .ok_or_else(|| self.overflow())
    }

    fn overflow(&self) -> RasterError {
        RasterError::BadArgument(format!(
            "{}x{}x{} buffer layout overflows the addressable size",
            self.size.0, self.size.1, self.bands
        ))
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| RasterError::BadArgument(format!("invalid {key} value '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        let descriptor = BufferDescriptor::from_name(
            "MEM:::PIXELS=50,LINES=3,BANDS=1,DATATYPE=Float32,PIXELOFFSET=4,LINEOFFSET=200,BANDOFFSET=0",
        )
        .unwrap();
        assert_eq!(
            descriptor,
            BufferDescriptor::new((50, 3), DataType::Float32).with_offsets(4, 200, 0)
        );
        assert_eq!(descriptor.required_len().unwrap(), 600);

        let descriptor = BufferDescriptor::from_name("mem:::pixels=4,lines=2,bands=3").unwrap();
        assert_eq!(descriptor.data_type, DataType::UInt8);
        assert_eq!(descriptor.offsets().unwrap(), (1, 4, 8));
        assert_eq!(descriptor.required_len().unwrap(), 24);
    }

    #[test]
    fn test_reject_malformed_names() {
        for name in [
            "MEM:::",
            "MEM:::PIXELS=10",
            "MEM::PIXELS=10,LINES=10",
            "MEM:::PIXELS=10,LINES=-1",
            "MEM:::PIXELS=10,LINES=10,DATATYPE=Complex",
            "MEM:::PIXELS=10,LINES",
        ] {
            assert!(BufferDescriptor::from_name(name).is_err(), "{name}");
        }
        assert!(matches!(
            BufferDescriptor::from_name("MEM:::DATAPOINTER=0x1000,PIXELS=1,LINES=1"),
            Err(RasterError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_required_len() {
        // two interleaved u16 bands
        let descriptor = BufferDescriptor::new((3, 2), DataType::UInt16)
            .with_bands(2)
            .with_offsets(4, 12, 2);
        assert_eq!(descriptor.required_len().unwrap(), 24);

        let descriptor = BufferDescriptor::new((usize::MAX, 2), DataType::Float64);
        assert!(matches!(
            descriptor.required_len(),
            Err(RasterError::BadArgument(_))
        ));
    }
}
