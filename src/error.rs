//! Error types for skyforest-geotiff

use std::fmt;
use std::io;

/// Result type for skyforest-geotiff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while producing a GeoTIFF
#[derive(Debug)]
pub enum Error {
    /// I/O error from a disk-backed session
    Io(io::Error),

    /// Virtual or physical file could not be initialized
    OpenFailed(String),

    /// Buffer growth failed for the requested length
    AllocationFailed(usize),

    /// Bad input: null buffer, negative seek, pixel size mismatch
    InvalidArgument(String),

    /// The TIFF client rejected a field, strip or directory write
    UnderlyingWriteFailed(String),

    /// The image source could not produce pixels
    ImageSource(String),
}

impl Error {
    /// Returns whether this error was caused by the caller's input
    /// rather than by the storage underneath.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::ImageSource(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::OpenFailed(msg) => write!(f, "Open failed: {}", msg),
            Error::AllocationFailed(len) => write!(f, "Allocation failed: could not grow buffer to {} bytes", len),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::UnderlyingWriteFailed(msg) => write!(f, "Underlying write failed: {}", msg),
            Error::ImageSource(msg) => write!(f, "Image source error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("test".to_string());
        assert_eq!(err.to_string(), "Invalid argument: test");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_allocation_failed_mentions_length() {
        let err = Error::AllocationFailed(4096);
        assert!(err.to_string().contains("4096"));
    }

    #[test]
    fn test_invalid_input_classification() {
        assert!(Error::InvalidArgument("x".into()).is_invalid_input());
        assert!(!Error::UnderlyingWriteFailed("x".into()).is_invalid_input());
        assert!(!Error::OpenFailed("x".into()).is_invalid_input());
    }
}
