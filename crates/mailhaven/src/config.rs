//! Account and option configuration.
//!
//! The configuration is a plain serde tree so callers can load it from
//! any format they like; file loading itself is out of scope. A
//! [`ClientManager`] resolves named accounts (overrides layered onto the
//! default account) into ready-to-connect [`Client`]s.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::{Error, Result};
use mailhaven_imap::{Encryption, Proxy};

/// How the client should authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// LOGIN with username and password.
    #[default]
    Login,
    /// XOAUTH2 with an access token in the password slot.
    Oauth,
    /// SASL PLAIN via AUTHENTICATE.
    #[serde(alias = "sasl")]
    Plain,
}

/// Proxy settings in configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ProxyConfig {
    /// HTTP CONNECT tunnel.
    Http {
        /// Proxy host.
        host: String,
        /// Proxy port.
        port: u16,
    },
    /// SOCKS5 proxy.
    Socks5 {
        /// Proxy host.
        host: String,
        /// Proxy port.
        port: u16,
    },
}

impl ProxyConfig {
    pub(crate) fn to_proxy(&self) -> Proxy {
        match self {
            Self::Http { host, port } => Proxy::HttpConnect {
                host: host.clone(),
                port: *port,
            },
            Self::Socks5 { host, port } => Proxy::Socks5 {
                host: host.clone(),
                port: *port,
            },
        }
    }
}

/// A fully resolved account.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Server hostname.
    pub host: String,
    /// Server port; defaults from the encryption mode.
    pub port: u16,
    /// Encryption mode.
    pub encryption: Encryption,
    /// Verify the server certificate chain.
    pub validate_cert: bool,
    /// Account name.
    pub username: String,
    /// Password, or access token for OAuth accounts.
    pub password: String,
    /// Authentication method.
    pub authentication: AuthMethod,
    /// Optional proxy hop.
    pub proxy: Option<ProxyConfig>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Per-read stream timeout.
    pub stream_timeout: Duration,
}

impl AccountConfig {
    /// Minimal account for the given host with TLS defaults.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Encryption::Tls.default_port(),
            encryption: Encryption::Tls,
            validate_cert: true,
            username: String::new(),
            password: String::new(),
            authentication: AuthMethod::Login,
            proxy: None,
            connect_timeout: Duration::from_secs(30),
            stream_timeout: Duration::from_secs(60),
        }
    }

    /// Sets credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub(crate) fn connect_config(&self) -> mailhaven_imap::ConnectConfig {
        let mut builder = mailhaven_imap::ConnectConfig::builder(self.host.clone())
            .port(self.port)
            .encryption(self.encryption)
            .validate_cert(self.validate_cert)
            .connect_timeout(self.connect_timeout)
            .stream_timeout(self.stream_timeout);
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(proxy.to_proxy());
        }
        builder.build()
    }
}

/// Per-account keys as they appear in configuration; unset keys fall
/// back to the default account, then to package defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountOverrides {
    /// Server hostname.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// `ssl` | `tls` | `starttls` | `notls` | `none`.
    pub encryption: Option<String>,
    /// Verify the certificate chain.
    pub validate_cert: Option<bool>,
    /// Account name.
    pub username: Option<String>,
    /// Password or access token.
    pub password: Option<String>,
    /// `login` | `oauth` | `sasl`.
    pub authentication: Option<AuthMethod>,
    /// Protocol selector; only `imap` is supported.
    pub protocol: Option<String>,
    /// Proxy hop.
    pub proxy: Option<ProxyConfig>,
    /// Connection timeout in seconds.
    pub timeout: Option<u64>,
    /// Per-read timeout in seconds.
    pub stream_timeout: Option<u64>,
    /// Extension hints (e.g. force-enable QUOTA probing).
    pub extensions: Option<Vec<String>>,
}

impl AccountOverrides {
    fn layered_onto(&self, base: &Self) -> Self {
        macro_rules! pick {
            ($field:ident) => {
                self.$field.clone().or_else(|| base.$field.clone())
            };
        }
        Self {
            host: pick!(host),
            port: pick!(port),
            encryption: pick!(encryption),
            validate_cert: pick!(validate_cert),
            username: pick!(username),
            password: pick!(password),
            authentication: pick!(authentication),
            protocol: pick!(protocol),
            proxy: pick!(proxy),
            timeout: pick!(timeout),
            stream_timeout: pick!(stream_timeout),
            extensions: pick!(extensions),
        }
    }

    fn resolve(&self) -> Result<AccountConfig> {
        if let Some(protocol) = &self.protocol
            && !protocol.eq_ignore_ascii_case("imap")
        {
            return Err(Error::ProtocolNotSupported(protocol.clone()));
        }

        let host = self
            .host
            .clone()
            .ok_or_else(|| Error::InvalidConfig("account is missing a host".to_string()))?;

        let encryption = match &self.encryption {
            Some(name) => Encryption::parse(name).ok_or_else(|| {
                Error::InvalidConfig(format!("unknown encryption mode: {name}"))
            })?,
            None => Encryption::Tls,
        };

        Ok(AccountConfig {
            port: self.port.unwrap_or_else(|| encryption.default_port()),
            host,
            encryption,
            validate_cert: self.validate_cert.unwrap_or(true),
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            authentication: self.authentication.unwrap_or_default(),
            proxy: self.proxy.clone(),
            connect_timeout: Duration::from_secs(self.timeout.unwrap_or(30)),
            stream_timeout: Duration::from_secs(self.stream_timeout.unwrap_or(60)),
        })
    }
}

/// Direction of message population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchOrder {
    /// Server order.
    #[default]
    Asc,
    /// Reversed before paging.
    Desc,
}

/// Whether body fetches mark messages seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FetchMode {
    /// `BODY.PEEK[...]`: leave `\Seen` untouched.
    #[default]
    Peek,
    /// `BODY[...]`: let the server set `\Seen`.
    #[serde(alias = "NIL")]
    Plain,
}

/// Which numbering scheme queries address messages by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SequenceKind {
    /// Stable UIDs (within a UIDVALIDITY epoch).
    #[default]
    Uid,
    /// Dense 1-based message sequence numbers.
    Msn,
}

/// Key used for the materialised message collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKey {
    /// Keyed by UID.
    #[default]
    Uid,
    /// Keyed by message sequence number.
    Number,
    /// Keyed by list position.
    List,
    /// Keyed by Message-ID header.
    Id,
}

/// Library behaviour switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Body fetch flavour.
    pub fetch: FetchMode,
    /// Population order.
    pub fetch_order: FetchOrder,
    /// Numbering scheme for queries.
    pub sequence: SequenceKind,
    /// Collection key for populated messages.
    pub message_key: MessageKey,
    /// Record per-message errors instead of aborting the batch.
    pub soft_fail: bool,
    /// Keep a per-session MSN↔UID map.
    pub uid_cache: bool,
    /// Fallback hierarchy delimiter.
    pub delimiter: char,
    /// Verbose wire logging via `tracing`.
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fetch: FetchMode::Peek,
            fetch_order: FetchOrder::Asc,
            sequence: SequenceKind::Uid,
            message_key: MessageKey::Uid,
            soft_fail: false,
            uid_cache: true,
            delimiter: '/',
            debug: false,
        }
    }
}

fn default_account_name() -> String {
    "default".to_string()
}

/// The whole configuration tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Name of the account used by [`ClientManager::default_account`].
    #[serde(default = "default_account_name")]
    pub default: String,
    /// Named accounts.
    #[serde(default)]
    pub accounts: HashMap<String, AccountOverrides>,
    /// Library options.
    #[serde(default)]
    pub options: Options,
}

/// Resolves accounts from a configuration tree into clients.
///
/// The manager is an explicit value, not process-global state; tests and
/// concurrent use each build their own.
#[derive(Debug, Clone)]
pub struct ClientManager {
    config: ManagerConfig,
}

impl ClientManager {
    /// Wraps a configuration tree.
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        Self { config }
    }

    /// The configured options.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.config.options
    }

    /// Builds a client for the named account.
    ///
    /// Keys the account leaves unset are taken from the default account.
    pub fn account(&self, name: &str) -> Result<Client> {
        let overrides = self
            .config
            .accounts
            .get(name)
            .ok_or_else(|| Error::UnknownAccount(name.to_string()))?;

        let base = self
            .config
            .accounts
            .get(&self.config.default)
            .cloned()
            .unwrap_or_default();

        let account = overrides.layered_onto(&base).resolve()?;
        Ok(Client::new(account, self.config.options.clone()))
    }

    /// Builds a client for the default account.
    pub fn default_account(&self) -> Result<Client> {
        self.account(&self.config.default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager_from_json(json: &str) -> ClientManager {
        let config: ManagerConfig = serde_json::from_str(json).unwrap();
        ClientManager::new(config)
    }

    #[test]
    fn defaults_are_sensible() {
        let options = Options::default();
        assert_eq!(options.fetch, FetchMode::Peek);
        assert_eq!(options.sequence, SequenceKind::Uid);
        assert_eq!(options.message_key, MessageKey::Uid);
        assert!(options.uid_cache);
        assert!(!options.soft_fail);
    }

    #[test]
    fn account_resolution_with_overrides() {
        let manager = manager_from_json(
            r#"{
                "default": "main",
                "accounts": {
                    "main": {
                        "host": "imap.example.com",
                        "username": "ann",
                        "password": "secret",
                        "encryption": "ssl"
                    },
                    "bridge": {
                        "host": "127.0.0.1",
                        "port": 1143,
                        "encryption": "starttls",
                        "validate_cert": false
                    }
                }
            }"#,
        );

        let client = manager.account("bridge").unwrap();
        let account = client.account();
        assert_eq!(account.host, "127.0.0.1");
        assert_eq!(account.port, 1143);
        assert_eq!(account.encryption, Encryption::StartTls);
        assert!(!account.validate_cert);
        // Inherited from the default account
        assert_eq!(account.username, "ann");
        assert_eq!(account.password, "secret");
    }

    #[test]
    fn default_account_port_follows_encryption() {
        let manager = manager_from_json(
            r#"{
                "default": "main",
                "accounts": {
                    "main": { "host": "imap.example.com", "encryption": "starttls" }
                }
            }"#,
        );
        let client = manager.default_account().unwrap();
        assert_eq!(client.account().port, 143);
    }

    #[test]
    fn unknown_account_is_an_error() {
        let manager = manager_from_json(r#"{ "accounts": {} }"#);
        assert!(matches!(
            manager.account("nope"),
            Err(Error::UnknownAccount(_))
        ));
    }

    #[test]
    fn non_imap_protocol_rejected() {
        let manager = manager_from_json(
            r#"{
                "default": "main",
                "accounts": {
                    "main": { "host": "mail.example.com", "protocol": "pop3" }
                }
            }"#,
        );
        assert!(matches!(
            manager.default_account(),
            Err(Error::ProtocolNotSupported(_))
        ));
    }

    #[test]
    fn options_deserialize_spec_names() {
        let options: Options = serde_json::from_str(
            r#"{
                "fetch": "NIL",
                "fetch_order": "desc",
                "sequence": "MSN",
                "message_key": "list",
                "soft_fail": true,
                "uid_cache": false
            }"#,
        )
        .unwrap();
        assert_eq!(options.fetch, FetchMode::Plain);
        assert_eq!(options.fetch_order, FetchOrder::Desc);
        assert_eq!(options.sequence, SequenceKind::Msn);
        assert_eq!(options.message_key, MessageKey::List);
        assert!(options.soft_fail);
        assert!(!options.uid_cache);
    }
}
