use thiserror::Error;

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Bad argument: {0}")]
    BadArgument(String),
    #[error(
        "Window at ({x_off}, {y_off}) of size {x_size}x{y_size} exceeds raster of size {raster_x}x{raster_y}"
    )]
    OutOfBounds {
        x_off: isize,
        y_off: isize,
        x_size: usize,
        y_size: usize,
        raster_x: usize,
        raster_y: usize,
    },
    #[error("Cannot allocate {what}: {msg}")]
    AllocationFailure { what: &'static str, msg: String },
    #[error("Unsupported operation '{method_name}': {msg}")]
    UnsupportedOperation {
        method_name: &'static str,
        msg: String,
    },
    #[error("Invalid band index {index}, dataset has {count} band(s)")]
    InvalidBandIndex { index: usize, count: usize },
    #[error("Invalid overview index {index}, band has {count} overview(s)")]
    InvalidOverviewIndex { index: usize, count: usize },
    #[error("Unknown driver '{0}'")]
    UnknownDriver(String),
    #[error("Unknown data type '{0}'")]
    UnknownDataType(String),
    #[cfg(feature = "ndarray")]
    #[error(transparent)]
    NdarrayShapeError(#[from] ndarray::ShapeError),
}

impl RasterError {
    pub(crate) fn unsupported(method_name: &'static str, msg: impl Into<String>) -> Self {
        RasterError::UnsupportedOperation {
            method_name,
            msg: msg.into(),
        }
    }
}
