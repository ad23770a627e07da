//! Error types for boundary crossings

use crate::encoding::Encoding;
use thiserror::Error;

/// Result type alias for marshaling operations
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Error type for marshaling operations
///
/// Every failure at the boundary is reported as one of these values. None of
/// them is ever raised as a panic across the native/managed call edge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    /// A required pointer was null
    #[error("null pointer passed across the boundary")]
    NullPointer,

    /// Destination buffer cannot hold the encoded text plus terminator
    #[error("buffer too small: {required} bytes required, capacity is {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },

    /// Bytes are not representable in the declared encoding
    #[error("invalid {encoding} sequence at byte {position}")]
    InvalidEncoding { encoding: Encoding, position: usize },

    /// Text contains a NUL byte and cannot become a null-terminated string
    #[error("interior NUL byte at position {position}")]
    InteriorNul { position: usize },

    /// Pointer was already released or never allocated by this boundary
    #[error("pointer was already released or not allocated by this boundary")]
    DoubleRelease,

    /// Destination capacity is zero or negative
    #[error("invalid destination capacity: {0}")]
    InvalidCapacity(i32),

    /// Unknown context handle
    #[error("invalid context handle: {0}")]
    InvalidHandle(u64),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (including caught panics)
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarshalError {
    /// Returns an error code suitable for FFI
    pub fn error_code(&self) -> u32 {
        match self {
            MarshalError::NullPointer => 1,
            MarshalError::BufferTooSmall { .. } => 2,
            MarshalError::InvalidEncoding { .. } => 3,
            MarshalError::InteriorNul { .. } => 4,
            MarshalError::DoubleRelease => 5,
            MarshalError::InvalidCapacity(_) => 6,
            MarshalError::InvalidHandle(_) => 7,
            MarshalError::Config(_) => 8,
            MarshalError::Internal(_) => 9,
        }
    }

    /// Status value returned by C ABI functions (`-error_code`)
    pub fn status(&self) -> i32 {
        -(self.error_code() as i32)
    }

    /// Create an error from an error code and message (for FFI status decoding)
    ///
    /// Structured details that do not survive the trip through a status code
    /// are reset to zero.
    pub fn from_code(code: u32, message: String) -> Self {
        match code {
            1 => MarshalError::NullPointer,
            2 => MarshalError::BufferTooSmall {
                required: 0,
                capacity: 0,
            },
            3 => MarshalError::InvalidEncoding {
                encoding: Encoding::default(),
                position: 0,
            },
            4 => MarshalError::InteriorNul { position: 0 },
            5 => MarshalError::DoubleRelease,
            6 => MarshalError::InvalidCapacity(0),
            7 => MarshalError::InvalidHandle(0),
            8 => MarshalError::Config(message),
            _ => MarshalError::Internal(message),
        }
    }
}

impl From<serde_json::Error> for MarshalError {
    fn from(err: serde_json::Error) -> Self {
        MarshalError::Config(err.to_string())
    }
}
