//! In-memory raster data

mod buffer;
mod checksum;
mod color_table;
mod create_options;
mod descriptor;
mod histogram;
mod mask;
mod overview;
mod rasterband;
pub(crate) mod rasterio;
mod rat;
mod source;
pub(crate) mod storage;
mod types;

pub use buffer::{Buffer, ByteBuffer};
pub use color_table::{
    CmykEntry, ColorEntry, ColorTable, GrayEntry, HlsEntry, PaletteInterpretation, RgbaEntry,
};
pub use create_options::{Interleave, RasterCreationOptions};
pub use descriptor::{BufferDescriptor, MEM_BUFFER_PREFIX};
pub use histogram::Histogram;
pub use mask::MaskFlags;
pub use overview::OverviewResampling;
pub use rasterband::{ColorInterpretation, RasterBand};
pub use rasterio::{RasterIoOptions, ResampleAlg};
pub use rat::{RasterAttributeTable, RatFieldType, RatFieldUsage};
pub use source::RasterSource;
pub use storage::MEM_MAX_ALLOCATION;
pub use types::{DataType, RasterType, Sample};
