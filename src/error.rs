//! Error types for document operations
//!
//! Every failure a document operation can report falls into one of three
//! kinds. Transports never see anything else from the operation layer.

use thiserror::Error;

/// Result alias used throughout the operation layer
pub type Result<T> = std::result::Result<T, DocError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocError {
    /// File missing, unreadable, unwritable or permission denied
    #[error("io error: {0}")]
    Io(String),

    /// Container bytes malformed or not a Word document
    #[error("decode error: {0}")]
    Decode(String),

    /// Malformed pattern, negative dimension or margin, bad parameter shape
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DocError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Stable tag for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DocError::Io(_) => "io_error",
            DocError::Decode(_) => "decode_error",
            DocError::InvalidArgument(_) => "invalid_argument",
        }
    }
}

impl From<std::io::Error> for DocError {
    fn from(err: std::io::Error) -> Self {
        DocError::Io(err.to_string())
    }
}

impl From<zip::result::ZipError> for DocError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => DocError::Io(io.to_string()),
            other => DocError::Decode(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for DocError {
    fn from(err: quick_xml::Error) -> Self {
        DocError::Decode(err.to_string())
    }
}

impl From<regex::Error> for DocError {
    fn from(err: regex::Error) -> Self {
        DocError::InvalidArgument(format!("invalid search pattern: {err}"))
    }
}
