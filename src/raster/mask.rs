use bitflags::bitflags;

use crate::raster::storage::{BandState, PixelSource, RasterView};
use crate::raster::types::{DataType, Sample};

bitflags! {
    /// Represents the flags of a band's mask, as returned by
    /// [`RasterBand::mask_flags`](crate::raster::RasterBand::mask_flags).
    ///
    /// An empty value means the band has a mask of its own.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaskFlags: i32 {
        /// Every pixel is valid.
        const ALL_VALID = 0x01;
        /// The mask is shared between all bands of the dataset.
        const PER_DATASET = 0x02;
        /// The mask is an alpha band.
        const ALPHA = 0x04;
        /// The mask is derived from the band's nodata value.
        const NODATA = 0x08;
    }
}

impl MaskFlags {
    pub fn is_all_valid(&self) -> bool {
        self.contains(MaskFlags::ALL_VALID)
    }

    pub fn is_per_dataset(&self) -> bool {
        self.contains(MaskFlags::PER_DATASET)
    }

    pub fn is_alpha(&self) -> bool {
        self.contains(MaskFlags::ALPHA)
    }

    pub fn is_nodata(&self) -> bool {
        self.contains(MaskFlags::NODATA)
    }
}

/// Which mask a band currently exposes.
pub(crate) enum MaskBand {
    /// No stored mask; synthesized from nodata, or all valid.
    AllValid,
    /// The dataset-wide mask.
    PerDataset,
    Private(Box<BandState>),
}

impl MaskBand {
    pub(crate) fn flags(&self, no_data: Option<f64>) -> MaskFlags {
        match self {
            MaskBand::PerDataset => MaskFlags::PER_DATASET,
            MaskBand::Private(_) => MaskFlags::empty(),
            MaskBand::AllValid if no_data.is_some() => MaskFlags::NODATA,
            MaskBand::AllValid => MaskFlags::ALL_VALID,
        }
    }
}

/// A read-only mask where every pixel is 255.
pub(crate) struct AllValidMask {
    pub size: (usize, usize),
}

impl PixelSource for AllValidMask {
    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn data_type(&self) -> DataType {
        DataType::UInt8
    }

    fn sample(&self, _x: usize, _y: usize) -> Sample {
        Sample::Int(255)
    }
}

/// A read-only mask that is 0 where a band equals its nodata value, 255 elsewhere.
pub(crate) struct NoDataMask<'a> {
    pub view: RasterView<'a>,
    pub no_data: f64,
}

impl PixelSource for NoDataMask<'_> {
    fn size(&self) -> (usize, usize) {
        self.view.size()
    }

    fn data_type(&self) -> DataType {
        DataType::UInt8
    }

    fn sample(&self, x: usize, y: usize) -> Sample {
        let value = self.view.sample(x, y).as_f64();
        let is_no_data = if self.no_data.is_nan() {
            value.is_nan()
        } else {
            value == self.no_data
        };
        Sample::Int(if is_no_data { 0 } else { 255 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::storage::Layout;

    #[test]
    fn test_flags() {
        assert_eq!(MaskBand::AllValid.flags(None), MaskFlags::ALL_VALID);
        assert!(MaskBand::AllValid.flags(Some(0.0)).is_nodata());
        assert!(MaskBand::PerDataset.flags(Some(0.0)).is_per_dataset());
        assert_eq!(MaskFlags::NODATA.bits(), 8);
    }

    #[test]
    fn test_no_data_mask() {
        let data = [0.0f32, f32::NAN, 3.0]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect::<Vec<u8>>();
        let view = RasterView {
            data: &data,
            layout: Layout::packed(DataType::Float32, (3, 1)),
        };
        let mask = NoDataMask { view, no_data: 3.0 };
        assert_eq!(mask.sample(0, 0), Sample::Int(255));
        assert_eq!(mask.sample(2, 0), Sample::Int(0));

        let view = RasterView {
            data: &data,
            layout: Layout::packed(DataType::Float32, (3, 1)),
        };
        let mask = NoDataMask {
            view,
            no_data: f64::NAN,
        };
        assert_eq!(mask.sample(1, 0), Sample::Int(0));
        assert_eq!(mask.sample(2, 0), Sample::Int(255));
    }
}
