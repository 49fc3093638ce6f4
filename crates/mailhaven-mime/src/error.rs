//! Error types for MIME parsing.

use thiserror::Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME parsing errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed content type value.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// A transfer encoding could not be decoded.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 payload did not decode.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A multipart message announced no boundary.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// General structural problem.
    #[error("Parse error: {0}")]
    Parse(String),
}
