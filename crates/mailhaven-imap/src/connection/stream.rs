//! Socket and TLS plumbing for IMAP connections.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::config::{ConnectConfig, Encryption};
use super::proxy;
use crate::{Error, Result};

/// A byte stream that supports both async reads and async writes.
pub trait AsyncIo: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncIo for T {}

/// Boxed byte stream so direct and proxied sockets share one type.
pub type BoxedIo = Box<dyn AsyncIo>;

/// A connection that is either plaintext or TLS.
pub enum ImapStream {
    /// Plaintext connection.
    Plain(BoxedIo),
    /// TLS connection.
    Tls(Box<TlsStream<BoxedIo>>),
}

impl ImapStream {
    /// Returns true when the stream is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Upgrades a plaintext stream to TLS in place (STARTTLS).
    pub async fn upgrade_to_tls(self, host: &str, validate_cert: bool) -> Result<Self> {
        match self {
            Self::Plain(io) => {
                let connector = tls_connector(validate_cert);
                let server_name = ServerName::try_from(host.to_string())?;
                let tls = connector.connect(server_name, io).await?;
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) => Err(Error::InvalidState(
                "stream is already encrypted".to_string(),
            )),
        }
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Builds a TLS connector, optionally skipping certificate validation.
#[must_use]
pub fn tls_connector(validate_cert: bool) -> TlsConnector {
    let config = if validate_cert {
        let root_store = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    } else {
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
            .with_no_client_auth()
    };

    TlsConnector::from(Arc::new(config))
}

/// Certificate verifier that accepts any chain.
///
/// Installed only when `validate_cert` is off; intended for test servers
/// and bridge daemons with self-signed certificates.
#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

/// Dials the server, honouring proxy and encryption settings.
///
/// For [`Encryption::StartTls`] the returned stream is still plaintext;
/// the session performs the upgrade after reading the greeting.
/// The whole dial is bounded by `connect_timeout`.
pub async fn open(config: &ConnectConfig) -> Result<ImapStream> {
    let deadline = config.connect_timeout;
    tokio::time::timeout(deadline, dial(config))
        .await
        .map_err(|_| Error::Timeout(deadline))?
}

async fn dial(config: &ConnectConfig) -> Result<ImapStream> {
    let io: BoxedIo = match &config.proxy {
        Some(proxy) => proxy::connect_via(proxy, &config.host, config.port).await?,
        None => Box::new(TcpStream::connect((config.host.as_str(), config.port)).await?),
    };

    match config.encryption {
        Encryption::Tls => {
            let connector = tls_connector(config.validate_cert);
            let server_name = ServerName::try_from(config.host.clone())?;
            let tls = connector.connect(server_name, io).await?;
            Ok(ImapStream::Tls(Box::new(tls)))
        }
        Encryption::None | Encryption::StartTls => Ok(ImapStream::Plain(io)),
    }
}

/// Wraps an already-established stream for tests.
#[must_use]
pub fn from_io(io: impl AsyncRead + AsyncWrite + Send + Unpin + 'static) -> ImapStream {
    ImapStream::Plain(Box::new(io))
}
