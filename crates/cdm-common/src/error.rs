//! Error types for variable access and enhancement.

use thiserror::Error;

/// Result type alias using CdmError.
pub type CdmResult<T> = Result<T, CdmError>;

/// Errors raised while reading or enhancing variables.
///
/// Missing or malformed optional metadata is never an error: the affected
/// conversion is skipped instead.
#[derive(Debug, Error)]
pub enum CdmError {
    /// Device or format failure reported by the I/O source.
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed or out-of-bounds section request.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Structural misuse, e.g. wrapping a composite variable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A handle that does not refer to a variable in the dataset.
    #[error("unknown variable handle: {0}")]
    UnknownVariable(usize),

    /// Array storage inconsistent with its shape or type.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl CdmError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Whether this error came from the I/O source.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<std::io::Error> for CdmError {
    fn from(err: std::io::Error) -> Self {
        CdmError::Io(err.to_string())
    }
}
