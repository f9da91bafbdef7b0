#![crate_name = "memraster"]
#![crate_type = "lib"]

//! In-memory raster datasets.
//!
//! A [`Dataset`] holds equally sized bands of one of the [`DataType`](raster::DataType)s,
//! each with optional no-data value, color table, attribute table, histogram
//! and descriptive metadata. Bands may carry a validity mask and a pyramid of
//! reduced resolution overviews. Pixels are read and written through windowed
//! I/O with type conversion, strides and resampling.
//!
//! Datasets are created by the `MEM` [`Driver`]:
//!
//! ```
//! # fn main() -> memraster::errors::Result<()> {
//! use memraster::raster::{Buffer, MaskFlags, ResampleAlg};
//! use memraster::DriverManager;
//!
//! let driver = DriverManager::get_driver_by_name("MEM")?;
//! let dataset = driver.create_with_band_type::<u16>(20, 10, 1)?;
//!
//! let mut band = dataset.rasterband(1)?;
//! band.write((0, 0), (2, 2), &Buffer::new((2, 2), vec![1u16, 2, 3, 4]))?;
//! let data = band.read_as::<f64>((0, 0), (2, 2), (1, 1), Some(ResampleAlg::Average))?;
//! assert_eq!(data.data, vec![2.5]);
//! assert_eq!(band.mask_flags()?, MaskFlags::ALL_VALID);
//! # Ok(())
//! # }
//! ```
//!
//! ### Data type support
//!
//! Raster reading and writing is supported for the Rust numeric types
//! implementing [`RasterType`](raster::RasterType):
//! `u8`, `i8`, `u16`, `i16`, `u32`, `i32`, `u64`, `i64`, `f32` and `f64`.
//! Out of range values saturate when converted to a narrower type.
//!
//! ### Feature flags
//!
//! * `array`: read bands as [ndarray](https://docs.rs/ndarray) arrays.

pub mod config;
pub mod cpl;
mod dataset;
mod driver;
pub mod errors;
mod gcp;
pub mod metadata;
pub mod raster;

pub use dataset::{Dataset, GeoTransform};
pub use driver::{Driver, DriverManager};
pub use gcp::Gcp;
pub use metadata::Metadata;

#[cfg(test)]
mod test_utils;
