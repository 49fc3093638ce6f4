//! Message numbering and command tag types.
//!
//! A message in a selected mailbox is addressed either by its sequence
//! number (1-based, dense, shifts on expunge) or by its UID (stable within
//! a UIDVALIDITY epoch). All four wrappers reject zero, which RFC 3501
//! reserves as invalid.

use std::num::NonZeroU32;

/// Tag prefixed to every command, echoed back in the completion line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Creates a tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! nonzero_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wraps the value, rejecting zero.
            #[must_use]
            pub fn new(n: u32) -> Option<Self> {
                NonZeroU32::new(n).map(Self)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

nonzero_id! {
    /// Message sequence number: 1-based position in the mailbox, reassigned
    /// when earlier messages are expunged.
    MsgSeq
}

nonzero_id! {
    /// Unique identifier: sparse, monotone-assigned, stable for as long as
    /// the mailbox keeps its UIDVALIDITY.
    Uid
}

nonzero_id! {
    /// Mailbox epoch value; a change invalidates every cached UID.
    UidValidity
}
