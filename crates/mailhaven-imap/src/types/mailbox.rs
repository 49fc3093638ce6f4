//! Mailbox names and LIST/SELECT metadata.
//!
//! Names are UTF-8 inside the library and modified UTF-7 (RFC 3501 §5.1.3)
//! on the wire; conversion happens at this boundary only.

use super::flags::FlagSet;
use super::ids::{MsgSeq, Uid, UidValidity};

/// A mailbox name held as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(String);

impl Mailbox {
    /// Creates a mailbox name from UTF-8 text.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The INBOX mailbox (the name is case-insensitive per RFC 3501).
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Decodes a wire name (modified UTF-7) into a mailbox.
    #[must_use]
    pub fn from_wire(encoded: &str) -> Self {
        Self(utf7_imap::decode_utf7_imap(encoded.to_string()))
    }

    /// Returns the modified UTF-7 wire form of the name.
    #[must_use]
    pub fn to_wire(&self) -> String {
        utf7_imap::encode_utf7_imap(self.0.clone())
    }

    /// Returns the UTF-8 name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for INBOX in any casing.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0.eq_ignore_ascii_case("INBOX")
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State reported by SELECT/EXAMINE.
#[derive(Debug, Clone, Default)]
pub struct SelectedState {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of messages with `\Recent`.
    pub recent: u32,
    /// First unseen message, if reported.
    pub unseen: Option<MsgSeq>,
    /// Predicted next UID.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY epoch.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined in the mailbox.
    pub flags: FlagSet,
    /// Flags the client may change permanently.
    pub permanent_flags: FlagSet,
    /// True when opened via EXAMINE or `[READ-ONLY]`.
    pub read_only: bool,
}

/// One row of a LIST or LSUB response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Name attributes such as `\Noselect`.
    pub attributes: Vec<NameAttribute>,
    /// Hierarchy delimiter, or `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// Mailbox name, already decoded to UTF-8.
    pub mailbox: Mailbox,
}

/// Mailbox name attribute from LIST/LSUB.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameAttribute {
    /// The name cannot be selected.
    NoSelect,
    /// The name has no selectable children.
    HasNoChildren,
    /// The name has children.
    HasChildren,
    /// Marked as interesting by the server.
    Marked,
    /// Not marked.
    Unmarked,
    /// Does not exist but could be created.
    NonExistent,
    // SPECIAL-USE (RFC 6154)
    /// Archive folder.
    Archive,
    /// Drafts folder.
    Drafts,
    /// Junk/spam folder.
    Junk,
    /// Sent folder.
    Sent,
    /// Trash folder.
    Trash,
    /// Anything else, verbatim.
    Other(String),
}

impl NameAttribute {
    /// Parses a name attribute atom.
    #[must_use]
    pub fn parse(atom: &str) -> Self {
        match atom.to_ascii_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            "\\NONEXISTENT" => Self::NonExistent,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            _ => Self::Other(atom.to_string()),
        }
    }
}

/// One item of a STATUS response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusItem {
    /// Total message count.
    Messages(u32),
    /// Recent message count.
    Recent(u32),
    /// Predicted next UID.
    UidNext(Uid),
    /// UIDVALIDITY epoch.
    UidValidity(UidValidity),
    /// Unseen message count.
    Unseen(u32),
}

/// STATUS attributes a client may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusQuery {
    /// Total message count.
    Messages,
    /// Recent message count.
    Recent,
    /// Predicted next UID.
    UidNext,
    /// UIDVALIDITY epoch.
    UidValidity,
    /// Unseen message count.
    Unseen,
}

impl StatusQuery {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_matching() {
        assert!(Mailbox::new("inbox").is_inbox());
        assert!(Mailbox::inbox().is_inbox());
        assert!(!Mailbox::new("Sent").is_inbox());
    }

    #[test]
    fn ascii_names_pass_through_utf7() {
        let mb = Mailbox::new("Sent/2024");
        assert_eq!(mb.to_wire(), "Sent/2024");
        assert_eq!(Mailbox::from_wire("Sent/2024"), mb);
    }

    #[test]
    fn non_ascii_names_are_utf7_encoded() {
        let mb = Mailbox::new("Entwürfe");
        let wire = mb.to_wire();
        assert!(wire.is_ascii());
        assert!(wire.contains('&'));
        assert_eq!(Mailbox::from_wire(&wire), mb);
    }

    #[test]
    fn name_attribute_parsing() {
        assert_eq!(NameAttribute::parse("\\Noselect"), NameAttribute::NoSelect);
        assert_eq!(
            NameAttribute::parse("\\HasChildren"),
            NameAttribute::HasChildren
        );
        assert_eq!(NameAttribute::parse("\\Spam"), NameAttribute::Junk);
        assert_eq!(
            NameAttribute::parse("\\X-Custom"),
            NameAttribute::Other("\\X-Custom".to_string())
        );
    }
}
