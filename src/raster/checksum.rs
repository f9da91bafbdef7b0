use crate::raster::rasterio::Window;
use crate::raster::storage::PixelSource;
use crate::raster::types::Sample;

const PRIMES: [i32; 11] = [7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43];

/// GDAL compatible 16 bit checksum of `window` of `source`.
///
/// Each pixel is taken as a 32 bit integer (floats rounded to nearest,
/// saturating, NaN as zero) and reduced modulo a rotating prime.
pub(crate) fn checksum(source: &dyn PixelSource, window: &Window) -> u16 {
    let mut sum: i32 = 0;
    let mut prime = 0;
    for y in window.y..window.y + window.height {
        for x in window.x..window.x + window.width {
            let value = as_i32(source.sample(x, y));
            sum = sum.wrapping_add(value % PRIMES[prime]);
            sum &= 0xffff;
            prime = (prime + 1) % PRIMES.len();
        }
    }
    sum as u16
}

fn as_i32(sample: Sample) -> i32 {
    match sample {
        Sample::Int(v) => v.clamp(i32::MIN as i128, i32::MAX as i128) as i32,
        Sample::Float(v) if v.is_nan() => 0,
        Sample::Float(v) => (v + 0.5).floor() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::mask::AllValidMask;

    #[test]
    fn test_constant_sources() {
        // every pixel is 255: 255 % p summed over the prime cycle
        let mask = AllValidMask { size: (1, 1) };
        assert_eq!(checksum(&mask, &Window::full((1, 1))), 3);
    }

    #[test]
    fn test_float_rounding() {
        assert_eq!(as_i32(Sample::Float(2.5)), 3);
        assert_eq!(as_i32(Sample::Float(-2.5)), -2);
        assert_eq!(as_i32(Sample::Float(f64::NAN)), 0);
        assert_eq!(as_i32(Sample::Float(1e20)), i32::MAX);
        assert_eq!(as_i32(Sample::Int(u64::MAX as i128)), i32::MAX);
    }
}
