//! # mailhaven-imap
//!
//! An async IMAP4rev1 (RFC 3501) client protocol engine with the IDLE,
//! ID, QUOTA, MOVE, and UIDPLUS extensions.
//!
//! The crate is split the way the protocol is layered:
//!
//! - [`connection`]: socket/TLS/proxy transport, CRLF-and-literal framing,
//!   and the typestate [`Session`] (`NotAuthenticated` → `Authenticated` →
//!   `Selected`) plus the IDLE handle
//! - [`command`]: command construction and wire encoding, including
//!   continuation-gated literal arguments
//! - [`parser`]: sans-I/O response parsing built on a byte lexer and a
//!   typed [`Value`] tree
//! - [`types`]: flags, mailbox names (UTF-8 in, modified UTF-7 on the
//!   wire), sequence/UID sets, capabilities, quotas
//!
//! ## Quick start
//!
//! ```ignore
//! use mailhaven_imap::{ConnectConfig, Session};
//! use mailhaven_imap::command::{FetchQuery, FetchSpec};
//! use mailhaven_imap::types::{Mailbox, SequenceSet};
//!
//! # async fn run() -> mailhaven_imap::Result<()> {
//! let config = ConnectConfig::new("imap.example.com");
//! let stream = mailhaven_imap::connection::open(&config).await?;
//! let session = Session::greet(stream, config.stream_timeout).await?;
//!
//! let session = session.login("user@example.com", "password").await?;
//! let (mut session, state) = session.select(&Mailbox::inbox()).await?;
//! println!("{} messages", state.exists);
//!
//! let rows = session
//!     .fetch(
//!         &SequenceSet::range(1, 10).unwrap(),
//!         FetchSpec::Items(vec![FetchQuery::Uid, FetchQuery::Flags]),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, EncodedCommand, Segment, TagGenerator, imap_date};
pub use connection::{
    AuthState, Authenticated, ConnectConfig, ConnectConfigBuilder, Encryption, FramedStream,
    IdleEvent, IdleHandle, ImapStream, NotAuthenticated, Proxy, ResponseAccumulator, Selected,
    Session,
};
pub use error::{Error, Result};
pub use parser::{
    BodyStructure, Envelope, EnvelopeAddress, FetchItem, Response, ResponseParser,
    UntaggedResponse, Value,
};
pub use types::{
    Capability, Flag, FlagSet, ListEntry, Mailbox, MsgSeq, NameAttribute, Quota, QuotaResource,
    ResponseCode, SelectedState, SequenceSet, Status, StatusItem, StatusQuery, Tag, Uid, UidSet,
    UidValidity,
};

/// IMAP protocol revision implemented by this crate.
pub const IMAP_VERSION: &str = "IMAP4rev1";
