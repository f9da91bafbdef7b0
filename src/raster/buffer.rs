use crate::raster::RasterType;

#[cfg(feature = "ndarray")]
use ndarray::Array2;

/// A 2-D array backed by it's `size` (cols, rows) and a row-major `Vec<T>` and it's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T> {
    pub size: (usize, usize),
    pub data: Vec<T>,
}

impl<T: RasterType> Buffer<T> {
    /// Construct a new buffer from `size` (`(cols, rows)`) and `Vec<T>`.
    ///
    /// # Panic
    /// Will panic if `size.0 * size.1 != data.len()`.
    pub fn new(size: (usize, usize), data: Vec<T>) -> Self {
        assert_eq!(
            size.0 * size.1,
            data.len(),
            "size {:?} does not match length {}",
            size,
            data.len()
        );
        Buffer { size, data }
    }

    /// A buffer of `size` where every element is `value`.
    pub fn filled(size: (usize, usize), value: T) -> Self {
        Buffer {
            size,
            data: vec![value; size.0 * size.1],
        }
    }

    /// Element at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x >= self.size.0 || y >= self.size.1 {
            return None;
        }
        self.data.get(y * self.size.0 + x).copied()
    }

    #[cfg(feature = "ndarray")]
    /// Convert `self` into an [`ndarray::Array2`].
    pub fn to_array(self) -> crate::errors::Result<Array2<T>> {
        // Array2 shape is (rows, cols) and Buffer shape is (cols in x-axis, rows in y-axis)
        Ok(Array2::from_shape_vec(
            (self.size.1, self.size.0),
            self.data,
        )?)
    }
}

pub type ByteBuffer = Buffer<u8>;

#[cfg(feature = "ndarray")]
impl<T: RasterType> TryFrom<Buffer<T>> for Array2<T> {
    type Error = crate::errors::RasterError;

    fn try_from(value: Buffer<T>) -> Result<Self, Self::Error> {
        value.to_array()
    }
}

#[cfg(feature = "ndarray")]
impl<T: RasterType> From<Array2<T>> for Buffer<T> {
    fn from(value: Array2<T>) -> Self {
        // Array2 shape is (rows, cols) and Buffer shape is (cols in x-axis, rows in y-axis)
        let shape = value.shape();
        let (rows, cols) = (shape[0], shape[1]);
        let data = value
            .as_standard_layout()
            .iter()
            .copied()
            .collect::<Vec<T>>();
        Buffer::new((cols, rows), data)
    }
}

#[cfg(test)]
mod tests {
    use crate::raster::Buffer;

    #[test]
    fn get_by_position() {
        let b = Buffer::new((3, 2), vec![1u8, 2, 3, 4, 5, 6]);
        assert_eq!(b.get(0, 0), Some(1));
        assert_eq!(b.get(2, 1), Some(6));
        assert_eq!(b.get(3, 0), None);
        assert_eq!(Buffer::filled((2, 2), 7i16).data, vec![7; 4]);
    }

    #[test]
    #[should_panic]
    fn size_mismatch_panics() {
        let _ = Buffer::new((3, 3), vec![0u8; 4]);
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn convert_to() {
        let b = Buffer::new((5, 10), (0..5 * 10).collect::<Vec<i32>>());
        let a = b.clone().to_array().unwrap();
        let b2: Buffer<_> = a.into();
        assert_eq!(b, b2);
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn convert_from() {
        use ndarray::Array2;
        let a = Array2::from_shape_fn((10, 5), |(y, x)| y as i32 * 10 + x as i32);
        let b: Buffer<_> = a.clone().into();
        let a2 = b.to_array().unwrap();
        assert_eq!(a, a2);
    }
}
