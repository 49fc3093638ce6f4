//! # mailhaven
//!
//! A programmable IMAP client: authenticated sessions to remote mail
//! stores, folder enumeration and manipulation, fluent search queries
//! with fetch-and-populate pipelines, RFC 822 materialisation into a
//! structured message graph, and long-lived push notification via IDLE.
//!
//! ## Quick start
//!
//! ```ignore
//! use mailhaven::{ClientManager, ManagerConfig};
//!
//! # async fn run() -> mailhaven::Result<()> {
//! let config: ManagerConfig = serde_json::from_str(r#"{
//!     "default": "main",
//!     "accounts": {
//!         "main": {
//!             "host": "imap.example.com",
//!             "username": "ann@example.com",
//!             "password": "secret"
//!         }
//!     }
//! }"#).expect("valid config");
//!
//! let manager = ClientManager::new(config);
//! let mut client = manager.default_account()?;
//! client.connect().await?;
//! client.authenticate().await?;
//!
//! let inbox = client.get_folder("INBOX").await?;
//! let unread = inbox
//!     .query(&client)
//!     .unseen()
//!     .limit(10, 1)
//!     .get(&mut client)
//!     .await?;
//!
//! for (key, message) in unread.messages.iter() {
//!     println!("{key}: {}", message.subject.as_deref().unwrap_or("(none)"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate layout
//!
//! The protocol engine lives in [`mailhaven-imap`](mailhaven_imap) and
//! the MIME parser in [`mailhaven-mime`](mailhaven_mime); this crate
//! ties them into the account/folder/query/message surface.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod attachment;
mod client;
mod config;
mod error;
mod events;
mod folder;
mod idle;
mod message;
mod query;

pub use attachment::Attachment;
pub use client::Client;
pub use config::{
    AccountConfig, AccountOverrides, AuthMethod, ClientManager, FetchMode, FetchOrder,
    ManagerConfig, MessageKey, Options, ProxyConfig, SequenceKind,
};
pub use error::{Error, Result};
pub use events::{EventKind, EventPayload, EventRegistry};
pub use folder::Folder;
pub use idle::{IdleNotice, IdleWatcher};
pub use message::{BodyKind, Message};
pub use query::{Fetched, MessageCollection, Query};

// The protocol and MIME layers are part of the public surface
pub use mailhaven_imap as imap;
pub use mailhaven_mime as mime;
