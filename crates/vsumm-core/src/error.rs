use crate::shape::Shape;

/// Errors raised by tensor construction and manipulation.
///
/// Data-loading failures live in `vsumm-data`; this enum only covers what can
/// go wrong while building or combining tensors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two tensors that must agree in shape do not.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Dimension index out of range for the tensor's rank.
    #[error("dimension out of range: dim {dim} for tensor with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Row or element index past the end of a dimension.
    #[error("index {index} out of range for dimension of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Element count mismatch when creating from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Raw buffer length is not a multiple of the element size.
    #[error("byte length {len} is not a multiple of {dtype} element size {elem_size}")]
    MisalignedBytes {
        dtype: crate::DType,
        len: usize,
        elem_size: usize,
    },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout vsumm-core.
pub type Result<T> = std::result::Result<T, Error>;

/// Early return with a formatted error message.
/// Usage: `bail!("cannot stack {} tensors", n)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
