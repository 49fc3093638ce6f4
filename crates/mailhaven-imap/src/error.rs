//! Error types for the IMAP protocol engine.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to an IMAP server.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Proxy tunnel could not be established.
    #[error("Proxy error: {0}")]
    Proxy(String),

    /// Response parsing error.
    #[error("Parse error at byte {position}: {message}")]
    Parse {
        /// Byte offset where parsing failed.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Authentication was rejected by the server.
    ///
    /// Carries only the server text, never the credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server answered the tagged command with NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server answered the tagged command with BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE and is closing the connection.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// A read or the connection handshake exceeded its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The peer closed the connection mid-session.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// The requested operation is not valid in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Protocol violation or data the engine cannot make sense of.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
