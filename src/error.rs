//! Error types for archive parsing and entry access.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Archive error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error on the underlying byte source
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive file could not be opened
    #[error("cannot open archive {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A frame holding a fixed-size value had the wrong length
    #[error("frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    /// The source ended before a frame's declared length was read
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame { expected: u64, actual: u64 },

    /// The header payload declares more text than the frame holds
    #[error("header declares {declared} bytes but frame holds {available}")]
    HeaderLength { declared: u64, available: u64 },

    /// The header text failed structural decoding
    #[error("malformed header at '{path}': {reason}")]
    MalformedHeader { path: String, reason: String },

    /// Path resolution failed
    #[error("can't find '{path}' in archive")]
    NotFound { path: String },

    /// Seek or position outside an entry's bounds
    #[error("position {position} is outside entry bounds [0, {size}]")]
    OutOfRange { position: i64, size: u64 },

    /// An entry's absolute offset does not fit a signed 64-bit offset
    #[error("offset {offset} of '{path}' overflows the archive address range")]
    OffsetOverflow { path: String, offset: u64 },

    /// The archive was released while a stream was still in use
    #[error("archive has been closed")]
    Closed,
}

impl Error {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedHeader {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error comes from the container framing rather than the header text.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::FrameSizeMismatch { .. }
                | Error::TruncatedFrame { .. }
                | Error::HeaderLength { .. }
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::OutOfRange { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::TruncatedFrame { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            other => io::Error::other(other),
        }
    }
}
