//! Parsed response data types.

use crate::types::{FlagSet, ListEntry, Mailbox, MsgSeq, Quota, ResponseCode, StatusItem, Uid};

/// One data item inside a FETCH response.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchItem {
    /// Message flags.
    Flags(FlagSet),
    /// INTERNALDATE as the server sent it.
    InternalDate(String),
    /// RFC822.SIZE in octets.
    Rfc822Size(u32),
    /// Parsed ENVELOPE.
    Envelope(Box<Envelope>),
    /// Message UID.
    Uid(Uid),
    /// A BODY[...] / RFC822* section payload.
    Body {
        /// Section specifier, `None` for the whole message.
        section: Option<String>,
        /// Partial-fetch origin offset.
        origin: Option<u32>,
        /// Raw payload; `None` when the server sent NIL.
        data: Option<Vec<u8>>,
    },
    /// Parsed BODYSTRUCTURE.
    BodyStructure(BodyStructure),
}

impl FetchItem {
    /// Returns the payload of a `BODY[section]` item matching `wanted`.
    ///
    /// `RFC822.HEADER` is treated as `BODY[HEADER]` and `RFC822.TEXT` as
    /// `BODY[TEXT]`, which is how servers mirror the request forms.
    #[must_use]
    pub fn section_data(&self, wanted: &str) -> Option<&[u8]> {
        match self {
            Self::Body {
                section: Some(section),
                data: Some(data),
                ..
            } if section.eq_ignore_ascii_case(wanted) => Some(data),
            _ => None,
        }
    }
}

/// Parsed ENVELOPE structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header text.
    pub date: Option<String>,
    /// Subject, undecoded.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<EnvelopeAddress>,
    /// Sender addresses.
    pub sender: Vec<EnvelopeAddress>,
    /// Reply-To addresses.
    pub reply_to: Vec<EnvelopeAddress>,
    /// To addresses.
    pub to: Vec<EnvelopeAddress>,
    /// Cc addresses.
    pub cc: Vec<EnvelopeAddress>,
    /// Bcc addresses.
    pub bcc: Vec<EnvelopeAddress>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// One address from an ENVELOPE address list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeAddress {
    /// Display name, undecoded.
    pub name: Option<String>,
    /// Obsolete source route.
    pub adl: Option<String>,
    /// Local part.
    pub mailbox: Option<String>,
    /// Domain part.
    pub host: Option<String>,
}

impl EnvelopeAddress {
    /// Returns `local@host` when both parts are present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// Server-computed MIME structure from BODYSTRUCTURE.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyStructure {
    /// A leaf part.
    Part {
        /// Major type, uppercased.
        media_type: String,
        /// Subtype, uppercased.
        media_subtype: String,
        /// `(key value ...)` parameters.
        params: Vec<(String, String)>,
        /// Content-ID.
        id: Option<String>,
        /// Content-Description.
        description: Option<String>,
        /// Content-Transfer-Encoding.
        encoding: String,
        /// Size in octets.
        size: u32,
        /// Line count for TEXT parts.
        lines: Option<u32>,
    },
    /// A multipart container.
    Multipart {
        /// Child parts in order.
        parts: Vec<Self>,
        /// Multipart subtype, uppercased.
        subtype: String,
    },
}

/// One untagged response line.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// `* OK [...] text`
    Ok {
        /// Optional bracketed code.
        code: Option<ResponseCode>,
        /// Free text.
        text: String,
    },
    /// `* NO [...] text`
    No {
        /// Optional bracketed code.
        code: Option<ResponseCode>,
        /// Free text.
        text: String,
    },
    /// `* BAD [...] text`
    Bad {
        /// Optional bracketed code.
        code: Option<ResponseCode>,
        /// Free text.
        text: String,
    },
    /// `* PREAUTH ...`
    PreAuth {
        /// Optional bracketed code.
        code: Option<ResponseCode>,
        /// Free text.
        text: String,
    },
    /// `* BYE ...`
    Bye {
        /// Optional bracketed code.
        code: Option<ResponseCode>,
        /// Free text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<crate::types::Capability>),
    /// `* LIST (...) "/" name`
    List(ListEntry),
    /// `* LSUB (...) "/" name`
    Lsub(ListEntry),
    /// `* FLAGS (...)`
    Flags(FlagSet),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(MsgSeq),
    /// `* n FETCH (...)`
    Fetch {
        /// Message sequence number.
        seq: MsgSeq,
        /// Fetched items.
        items: Vec<FetchItem>,
    },
    /// `* SEARCH n n n ...`
    Search(Vec<u32>),
    /// `* STATUS name (...)`
    Status {
        /// Mailbox name, decoded.
        mailbox: Mailbox,
        /// Reported items.
        items: Vec<StatusItem>,
    },
    /// `* QUOTA root (resource usage limit ...)`
    Quota(Quota),
    /// `* QUOTAROOT mailbox root ...`
    QuotaRoot {
        /// Mailbox the roots apply to.
        mailbox: Mailbox,
        /// Root names, possibly empty strings.
        roots: Vec<String>,
    },
    /// `* ID (...)` or `* ID NIL`
    Id(Vec<(String, String)>),
}
