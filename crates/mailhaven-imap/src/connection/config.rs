//! Transport configuration.

use std::time::Duration;

/// How the connection is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encryption {
    /// No encryption at all (port 143).
    None,
    /// Plaintext greeting, then upgrade via STARTTLS (port 143).
    StartTls,
    /// TLS from the first byte (port 993).
    #[default]
    Tls,
}

impl Encryption {
    /// Default port for the mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Tls => 993,
        }
    }

    /// Parses the configuration names used by account files.
    ///
    /// `ssl` and `tls` both mean implicit TLS; `notls` and `none` disable
    /// encryption; `starttls` upgrades after the greeting.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "notls" | "false" => Some(Self::None),
            "starttls" => Some(Self::StartTls),
            "ssl" | "tls" | "true" => Some(Self::Tls),
            _ => None,
        }
    }
}

/// A proxy hop between the client and the IMAP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proxy {
    /// HTTP CONNECT tunnel.
    HttpConnect {
        /// Proxy host.
        host: String,
        /// Proxy port.
        port: u16,
    },
    /// SOCKS5 without authentication.
    Socks5 {
        /// Proxy host.
        host: String,
        /// Proxy port.
        port: u16,
    },
}

/// Transport configuration for one connection.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Encryption mode.
    pub encryption: Encryption,
    /// Verify the server certificate chain.
    pub validate_cert: bool,
    /// Optional proxy hop.
    pub proxy: Option<Proxy>,
    /// Bound on TCP connect + TLS handshake + greeting.
    pub connect_timeout: Duration,
    /// Bound on any single read.
    pub stream_timeout: Duration,
}

impl ConnectConfig {
    /// Creates a configuration with implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 993,
            encryption: Encryption::Tls,
            validate_cert: true,
            proxy: None,
            connect_timeout: Duration::from_secs(30),
            stream_timeout: Duration::from_secs(60),
        }
    }

    /// Starts a builder for the given host.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConnectConfigBuilder {
        ConnectConfigBuilder::new(host)
    }
}

/// Builder for [`ConnectConfig`].
#[derive(Debug, Clone)]
pub struct ConnectConfigBuilder {
    host: String,
    port: Option<u16>,
    encryption: Encryption,
    validate_cert: bool,
    proxy: Option<Proxy>,
    connect_timeout: Duration,
    stream_timeout: Duration,
}

impl ConnectConfigBuilder {
    /// Creates a builder with TLS defaults.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            encryption: Encryption::Tls,
            validate_cert: true,
            proxy: None,
            connect_timeout: Duration::from_secs(30),
            stream_timeout: Duration::from_secs(60),
        }
    }

    /// Sets an explicit port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the encryption mode.
    #[must_use]
    pub const fn encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }

    /// Enables or disables certificate validation.
    #[must_use]
    pub const fn validate_cert(mut self, validate: bool) -> Self {
        self.validate_cert = validate;
        self
    }

    /// Routes the connection through a proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-read stream timeout.
    #[must_use]
    pub const fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Finalizes the configuration.
    #[must_use]
    pub fn build(self) -> ConnectConfig {
        ConnectConfig {
            port: self.port.unwrap_or_else(|| self.encryption.default_port()),
            host: self.host,
            encryption: self.encryption,
            validate_cert: self.validate_cert,
            proxy: self.proxy,
            connect_timeout: self.connect_timeout,
            stream_timeout: self.stream_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports() {
        assert_eq!(Encryption::None.default_port(), 143);
        assert_eq!(Encryption::StartTls.default_port(), 143);
        assert_eq!(Encryption::Tls.default_port(), 993);
    }

    #[test]
    fn encryption_names() {
        assert_eq!(Encryption::parse("ssl"), Some(Encryption::Tls));
        assert_eq!(Encryption::parse("TLS"), Some(Encryption::Tls));
        assert_eq!(Encryption::parse("starttls"), Some(Encryption::StartTls));
        assert_eq!(Encryption::parse("notls"), Some(Encryption::None));
        assert_eq!(Encryption::parse("quantum"), None);
    }

    #[test]
    fn builder_falls_back_to_mode_port() {
        let config = ConnectConfig::builder("imap.example.com")
            .encryption(Encryption::StartTls)
            .build();
        assert_eq!(config.port, 143);

        let config = ConnectConfig::builder("imap.example.com")
            .port(1993)
            .build();
        assert_eq!(config.port, 1993);
    }

    #[test]
    fn builder_carries_proxy() {
        let config = ConnectConfig::builder("imap.example.com")
            .proxy(Proxy::Socks5 {
                host: "127.0.0.1".to_string(),
                port: 1080,
            })
            .validate_cert(false)
            .build();
        assert!(!config.validate_cert);
        assert!(matches!(config.proxy, Some(Proxy::Socks5 { .. })));
    }
}
