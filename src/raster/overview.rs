use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::{RasterError, Result};
use crate::raster::mask::MaskBand;
use crate::raster::rasterio::{read_window, BufferLayout, ByteSink, RasterIoOptions, ResampleAlg, Window};
use crate::raster::storage::{plane_bytes, BandState, PixelSource, Pixels};

/// Resampling used by [`Dataset::build_overviews`](crate::Dataset::build_overviews).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverviewResampling {
    Nearest,
    Average,
    /// Remove all overviews.
    None,
}

impl OverviewResampling {
    pub fn to_gdal_str(&self) -> &'static str {
        match self {
            OverviewResampling::Nearest => "NEAREST",
            OverviewResampling::Average => "AVERAGE",
            OverviewResampling::None => "NONE",
        }
    }

    pub fn iter() -> impl Iterator<Item = OverviewResampling> {
        [
            OverviewResampling::Nearest,
            OverviewResampling::Average,
            OverviewResampling::None,
        ]
        .into_iter()
    }

    fn resample_alg(&self) -> Option<ResampleAlg> {
        match self {
            OverviewResampling::Nearest => Some(ResampleAlg::NearestNeighbour),
            OverviewResampling::Average => Some(ResampleAlg::Average),
            OverviewResampling::None => None,
        }
    }
}

impl Display for OverviewResampling {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_gdal_str())
    }
}

impl FromStr for OverviewResampling {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NEAR" | "NEAREST" => Ok(OverviewResampling::Nearest),
            "AVERAGE" => Ok(OverviewResampling::Average),
            "NONE" => Ok(OverviewResampling::None),
            _ => Err(RasterError::BadArgument(format!(
                "{s} is not a supported overview resampling"
            ))),
        }
    }
}

/// Size of the overview of a `size` raster at decimation `level`.
pub(crate) fn overview_size(size: (usize, usize), level: usize) -> (usize, usize) {
    (size.0.div_ceil(level), size.1.div_ceil(level))
}

pub(crate) fn check_levels(levels: &[usize]) -> Result<()> {
    if let Some(level) = levels.iter().find(|&&l| l == 0) {
        return Err(RasterError::BadArgument(format!(
            "overview level {level} is not a positive integer"
        )));
    }
    Ok(())
}

/// Decimate `source` by `level` into a new owned band.
fn resample(source: &dyn PixelSource, level: usize, alg: ResampleAlg) -> Result<BandState> {
    let data_type = source.data_type();
    let size = overview_size(source.size(), level);
    let mut band = BandState::allocate(data_type, size)?;
    let len = plane_bytes(size, 1, data_type)?;
    let layout = BufferLayout::bytes(size, 1, data_type, &RasterIoOptions::default(), len)?;
    if let Pixels::Owned(data) = &mut band.pixels {
        let mut sink = ByteSink {
            data: data.as_mut_slice(),
            data_type,
        };
        read_window(
            source,
            &Window::full(source.size()),
            &mut sink,
            &layout,
            0,
            alg,
        );
    }
    Ok(band)
}

/// Overviews of one band, computed but not yet attached.
pub(crate) struct PendingOverviews {
    overviews: Vec<BandState>,
}

/// Compute the overviews of `band` for every level, from full resolution.
///
/// `mask` is the band's stored mask, if any; each overview then carries a
/// private mask decimated the same way.
pub(crate) fn compute(
    band: &dyn PixelSource,
    mask: Option<&dyn PixelSource>,
    resampling: OverviewResampling,
    levels: &[usize],
) -> Result<PendingOverviews> {
    let Some(alg) = resampling.resample_alg() else {
        return Ok(PendingOverviews {
            overviews: Vec::new(),
        });
    };
    let mut overviews = Vec::with_capacity(levels.len());
    for &level in levels {
        let mut overview = resample(band, level, alg)?;
        if let Some(mask) = mask {
            overview.mask = MaskBand::Private(Box::new(resample(mask, level, alg)?));
        }
        overviews.push(overview);
    }
    Ok(PendingOverviews { overviews })
}

impl PendingOverviews {
    /// Attach to `band`, replacing the pixels of existing overviews of the same size.
    pub(crate) fn commit(self, band: &mut BandState) {
        for computed in self.overviews {
            match band
                .overviews
                .iter_mut()
                .find(|existing| existing.size == computed.size)
            {
                Some(existing) => {
                    existing.pixels = computed.pixels;
                    existing.mask = computed.mask;
                }
                None => band.overviews.push(computed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::storage::Layout;
    use crate::raster::storage::RasterView;
    use crate::raster::types::{DataType, Sample};

    #[test]
    fn test_resampling_from_str() {
        for r in OverviewResampling::iter() {
            assert_eq!(r.to_string().parse::<OverviewResampling>().unwrap(), r);
        }
        assert_eq!(
            "near".parse::<OverviewResampling>().unwrap(),
            OverviewResampling::Nearest
        );
        assert!("CUBIC".parse::<OverviewResampling>().is_err());
    }

    #[test]
    fn test_overview_size() {
        assert_eq!(overview_size((100, 50), 2), (50, 25));
        assert_eq!(overview_size((100, 50), 4), (25, 13));
        assert_eq!(overview_size((1, 1), 8), (1, 1));
        assert!(check_levels(&[2, 0]).is_err());
    }

    #[test]
    fn test_average_level() {
        let data: Vec<u8> = (0..16).collect();
        let view = RasterView {
            data: &data,
            layout: Layout::packed(DataType::UInt8, (4, 4)),
        };
        let pending = compute(&view, None, OverviewResampling::Average, &[2]).unwrap();
        let overview = &pending.overviews[0];
        assert_eq!(overview.size, (2, 2));
        let ov = overview.view(&[]);
        // (0+1+4+5)/4 = 2.5 rounds to 3
        assert_eq!(ov.sample(0, 0), Sample::Int(3));
        assert_eq!(ov.sample(1, 1), Sample::Int(13));
    }

    #[test]
    fn test_commit_replaces_same_size() {
        let data = vec![7u8; 16];
        let view = RasterView {
            data: &data,
            layout: Layout::packed(DataType::UInt8, (4, 4)),
        };
        let mut band = BandState::allocate(DataType::UInt8, (4, 4)).unwrap();
        compute(&view, None, OverviewResampling::Nearest, &[2])
            .unwrap()
            .commit(&mut band);
        compute(&view, None, OverviewResampling::Nearest, &[2, 4])
            .unwrap()
            .commit(&mut band);
        assert_eq!(band.overviews.len(), 2);
        assert_eq!(band.overviews[0].size, (2, 2));
        assert_eq!(band.overviews[1].size, (1, 1));
        assert_eq!(band.overviews[1].view(&[]).sample(0, 0), Sample::Int(7));
    }
}
