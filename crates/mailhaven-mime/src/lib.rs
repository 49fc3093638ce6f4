//! # mailhaven-mime
//!
//! RFC 822 / MIME message parsing for mail clients.
//!
//! - [`Entity`]: the message as a MIME tree with IMAP-style dotted part
//!   numbers, transfer decoding, and charset conversion
//! - [`Headers`]: ordered multimap with unfolding and RFC 2047 decoding
//! - [`encoding`]: base64, quoted-printable, encoded-words
//! - [`charset`]: alias table over `encoding_rs`
//! - [`parse_address_list`]: RFC 5322 addresses including groups
//! - [`parse_date`]: lenient RFC 2822 dates
//!
//! ```ignore
//! use mailhaven_mime::Entity;
//!
//! let raw = b"Subject: Hello\r\nContent-Type: text/plain\r\n\r\nHi";
//! let message = Entity::parse(raw)?;
//! assert_eq!(message.headers.get("subject"), Some("Hello"));
//! assert_eq!(message.text()?, "Hi");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
pub mod charset;
mod content_type;
mod date;
pub mod encoding;
mod error;
mod header;
mod message;

pub use address::{Address, parse_address_list};
pub use content_type::ContentType;
pub use date::parse_date;
pub use encoding::TransferEncoding;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Disposition, Entity};
