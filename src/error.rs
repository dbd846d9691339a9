//! Error types for photo generation

use std::fmt;
use whereat::At;

/// Result type for generation operations, with error location tracking.
///
/// Errors carry a trace of where they were created and propagated,
/// accessible via [`At::full_trace()`] or [`At::last_error_trace()`].
pub type Result<T> = core::result::Result<T, At<GenError>>;

/// Errors that can occur while generating a photo or planning a batch
#[derive(Debug)]
#[non_exhaustive]
pub enum GenError {
    /// Filesystem read/write failure
    Io(std::io::Error),
    /// Image encoding failure
    Encode(image::ImageError),
    /// A generation request that cannot be satisfied as stated
    InvalidRequest(&'static str),
    /// Size distribution parameters that cannot be sampled
    InvalidDistribution(&'static str),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::Encode(e) => write!(f, "encode error: {e}"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::InvalidDistribution(msg) => write!(f, "invalid distribution: {msg}"),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            _ => None,
        }
    }
}

// Foreign errors are wrapped into GenError at the call site (map_err);
// the ? operator then lifts GenError into At<GenError>.
impl From<std::io::Error> for GenError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for GenError {
    fn from(e: image::ImageError) -> Self {
        Self::Encode(e)
    }
}
