//! Error types for resource streams.

use std::io;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Coarse error category, independent of the carried cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OpenFailed,
    InvalidHandle,
    InvalidArgument,
    Unsupported,
    SizeUnknown,
}

/// Main error type for stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("open({resource}): {source}")]
    OpenFailed {
        resource: String,
        #[source]
        source: io::Error,
    },

    #[error("{operation}: stream has no usable handle")]
    InvalidHandle {
        operation: &'static str,
        #[source]
        source: Option<io::Error>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{operation} not supported: {reason}")]
    Unsupported {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("stream size is unknown")]
    SizeUnknown,
}

impl StreamError {
    pub(crate) fn open_failed(resource: impl Into<String>, source: io::Error) -> Self {
        StreamError::OpenFailed {
            resource: resource.into(),
            source,
        }
    }

    /// No handle is owned, or the handle is no longer live.
    pub(crate) fn no_handle(operation: &'static str) -> Self {
        StreamError::InvalidHandle {
            operation,
            source: None,
        }
    }

    /// The handle is live but the underlying call failed.
    pub(crate) fn handle_io(operation: &'static str, source: io::Error) -> Self {
        StreamError::InvalidHandle {
            operation,
            source: Some(source),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::OpenFailed { .. } => ErrorKind::OpenFailed,
            StreamError::InvalidHandle { .. } => ErrorKind::InvalidHandle,
            StreamError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StreamError::Unsupported { .. } => ErrorKind::Unsupported,
            StreamError::SizeUnknown => ErrorKind::SizeUnknown,
        }
    }

    /// Whether the stream was closed, detached or its handle failed.
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, StreamError::InvalidHandle { .. })
    }

    /// Stable error code string
    pub fn to_error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::OpenFailed => "OPEN_FAILED",
            ErrorKind::InvalidHandle => "INVALID_HANDLE",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Unsupported => "UNSUPPORTED_OPERATION",
            ErrorKind::SizeUnknown => "SIZE_UNKNOWN",
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::OpenFailed { source, .. }
            | StreamError::InvalidHandle {
                source: Some(source),
                ..
            } => source.kind(),
            StreamError::InvalidHandle { source: None, .. } => io::ErrorKind::NotConnected,
            StreamError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            StreamError::Unsupported { .. } => io::ErrorKind::Unsupported,
            StreamError::SizeUnknown => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_open_failed_keeps_cause() {
        let err = StreamError::open_failed(
            "missing.txt",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(err.kind(), ErrorKind::OpenFailed);
        assert!(err.to_string().starts_with("open(missing.txt):"));

        let source = err.source().unwrap().downcast_ref::<io::Error>().unwrap();
        assert_eq!(source.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(StreamError::no_handle("tell").to_error_code(), "INVALID_HANDLE");
        assert_eq!(StreamError::SizeUnknown.to_error_code(), "SIZE_UNKNOWN");
        assert_eq!(
            StreamError::InvalidArgument("x".into()).to_error_code(),
            "INVALID_ARGUMENT"
        );
    }

    #[test]
    fn test_into_io_error() {
        let err: io::Error = StreamError::no_handle("read").into();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        let err: io::Error = StreamError::InvalidArgument("bad".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
