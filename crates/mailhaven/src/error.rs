//! Client-level error taxonomy.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the client library.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport setup or handshake failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer closed the connection mid-session.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A read or the handshake exceeded its deadline.
    #[error("Connection timed out after {0:?}")]
    ConnectionTimedOut(Duration),

    /// Authentication rejected; carries server text only.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The configured protocol variant is unavailable.
    #[error("Protocol not supported: {0}")]
    ProtocolNotSupported(String),

    /// An IMAP command completed with NO or BAD.
    #[error("Command failed: {0}")]
    Runtime(String),

    /// Folder enumeration failed.
    #[error("Folder fetching failed: {0}")]
    FolderFetchingFailed(String),

    /// A search could not be built or executed.
    #[error("Search validation failed: {0}")]
    SearchValidation(String),

    /// Message population aborted; the map carries per-identifier reasons.
    #[error("Fetching messages failed for {} identifier(s)", errors.len())]
    GetMessagesFailed {
        /// Identifier (UID or MSN) to failure reason.
        errors: BTreeMap<u32, String>,
    },

    /// A message body or part could not be fetched.
    #[error("Message content fetching failed: {0}")]
    MessageContentFetching(String),

    /// A Date header was present but unusable in strict mode.
    #[error("Invalid message date: {0}")]
    InvalidMessageDate(String),

    /// MIME parsing failed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailhaven_mime::Error),

    /// The named account does not exist in the configuration.
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// The configuration is incomplete.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<mailhaven_imap::Error> for Error {
    fn from(err: mailhaven_imap::Error) -> Self {
        use mailhaven_imap::Error as Imap;
        match err {
            Imap::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            Imap::ConnectionClosed => Self::ConnectionClosed,
            Imap::Timeout(d) => Self::ConnectionTimedOut(d),
            Imap::Auth(text) => Self::AuthFailed(text),
            Imap::No(text) | Imap::Bad(text) => Self::Runtime(text),
            Imap::Io(e) => Self::ConnectionFailed(e.to_string()),
            Imap::Tls(e) => Self::ConnectionFailed(e.to_string()),
            Imap::InvalidDnsName(e) => Self::ConnectionFailed(e.to_string()),
            Imap::Proxy(text) => Self::ConnectionFailed(text),
            Imap::Bye(text) => Self::Runtime(format!("server closed the session: {text}")),
            Imap::Parse { position, message } => {
                Self::Runtime(format!("response parse error at byte {position}: {message}"))
            }
            Imap::InvalidState(text) | Imap::Protocol(text) => Self::Runtime(text),
        }
    }
}

/// Result type alias using the client [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imap_errors_map_to_kinds() {
        let err: Error = mailhaven_imap::Error::No("denied".to_string()).into();
        assert!(matches!(err, Error::Runtime(_)));

        let err: Error = mailhaven_imap::Error::Auth("bad creds".to_string()).into();
        assert!(matches!(err, Error::AuthFailed(_)));

        let err: Error = mailhaven_imap::Error::ConnectionClosed.into();
        assert!(matches!(err, Error::ConnectionClosed));

        let err: Error =
            mailhaven_imap::Error::Timeout(Duration::from_secs(30)).into();
        assert!(matches!(err, Error::ConnectionTimedOut(_)));
    }

    #[test]
    fn get_messages_failed_counts() {
        let mut errors = BTreeMap::new();
        errors.insert(7, "gone".to_string());
        errors.insert(9, "broken".to_string());
        let err = Error::GetMessagesFailed { errors };
        assert!(err.to_string().contains('2'));
    }
}
