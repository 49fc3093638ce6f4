//! Command argument types.

use chrono::NaiveDate;

use crate::types::{Flag, SequenceSet, UidSet};

/// What a FETCH should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchSpec {
    /// `ALL` macro: FLAGS INTERNALDATE RFC822.SIZE ENVELOPE.
    All,
    /// `FAST` macro: FLAGS INTERNALDATE RFC822.SIZE.
    Fast,
    /// `FULL` macro: FAST plus BODY.
    Full,
    /// An explicit item list.
    Items(Vec<FetchQuery>),
}

/// A single FETCH data item request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchQuery {
    /// Message flags.
    Flags,
    /// Message UID.
    Uid,
    /// Internal date.
    InternalDate,
    /// Size in octets.
    Rfc822Size,
    /// Envelope structure.
    Envelope,
    /// MIME structure without content.
    BodyStructure,
    /// Entire message.
    Rfc822,
    /// Header block only.
    Rfc822Header,
    /// Text block only.
    Rfc822Text,
    /// `BODY[section]` or `BODY.PEEK[section]`, optionally partial.
    Section {
        /// Section path like `1.2` or `HEADER`; `None` for the whole message.
        section: Option<String>,
        /// Use PEEK to avoid setting `\Seen`.
        peek: bool,
        /// `<start.count>` partial range.
        partial: Option<(u32, u32)>,
    },
}

impl FetchQuery {
    /// `BODY.PEEK[section]` shorthand.
    #[must_use]
    pub fn peek(section: &str) -> Self {
        Self::Section {
            section: Some(section.to_string()),
            peek: true,
            partial: None,
        }
    }

    /// `BODY[section]` shorthand.
    #[must_use]
    pub fn body(section: &str) -> Self {
        Self::Section {
            section: Some(section.to_string()),
            peek: false,
            partial: None,
        }
    }
}

/// Flag mutation for STORE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Replace all flags.
    Replace(Vec<Flag>),
    /// Add flags (`+FLAGS`).
    Add(Vec<Flag>),
    /// Remove flags (`-FLAGS`).
    Remove(Vec<Flag>),
}

/// A SEARCH criterion tree.
///
/// `Display` renders the canonical single-line form with string arguments
/// double-quoted; the wire encoder upgrades non-ASCII arguments to
/// literals instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// `\Answered` set.
    Answered,
    /// `\Deleted` set.
    Deleted,
    /// `\Draft` set.
    Draft,
    /// `\Flagged` set.
    Flagged,
    /// Recent and unseen.
    New,
    /// Not recent.
    Old,
    /// `\Recent` set.
    Recent,
    /// `\Seen` set.
    Seen,
    /// `\Answered` not set.
    Unanswered,
    /// `\Deleted` not set.
    Undeleted,
    /// `\Draft` not set.
    Undraft,
    /// `\Flagged` not set.
    Unflagged,
    /// `\Seen` not set.
    Unseen,
    /// Bcc contains.
    Bcc(String),
    /// Body contains.
    Body(String),
    /// Cc contains.
    Cc(String),
    /// From contains.
    From(String),
    /// Subject contains.
    Subject(String),
    /// Header or body contains.
    Text(String),
    /// To contains.
    To(String),
    /// Named header contains.
    Header(String, String),
    /// Keyword flag set.
    Keyword(String),
    /// Keyword flag not set.
    Unkeyword(String),
    /// Larger than n octets.
    Larger(u32),
    /// Smaller than n octets.
    Smaller(u32),
    /// Internal date before.
    Before(NaiveDate),
    /// Internal date on.
    On(NaiveDate),
    /// Internal date on or after.
    Since(NaiveDate),
    /// Date header before.
    SentBefore(NaiveDate),
    /// Date header on.
    SentOn(NaiveDate),
    /// Date header on or after.
    SentSince(NaiveDate),
    /// UID set match.
    Uid(UidSet),
    /// Sequence number set match.
    Seq(SequenceSet),
    /// Negation of the following criterion.
    Not(Box<SearchCriteria>),
    /// Either of two criteria.
    Or(Box<SearchCriteria>, Box<SearchCriteria>),
    /// Conjunction, space-joined.
    And(Vec<SearchCriteria>),
}

impl SearchCriteria {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            Self::Bcc(_) => "BCC",
            Self::Body(_) => "BODY",
            Self::Cc(_) => "CC",
            Self::From(_) => "FROM",
            Self::Subject(_) => "SUBJECT",
            Self::Text(_) => "TEXT",
            Self::To(_) => "TO",
            _ => "",
        }
    }
}

impl std::fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use super::serialize::imap_date;

        fn quoted(s: &str) -> String {
            let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }

        match self {
            Self::All => write!(f, "ALL"),
            Self::Answered => write!(f, "ANSWERED"),
            Self::Deleted => write!(f, "DELETED"),
            Self::Draft => write!(f, "DRAFT"),
            Self::Flagged => write!(f, "FLAGGED"),
            Self::New => write!(f, "NEW"),
            Self::Old => write!(f, "OLD"),
            Self::Recent => write!(f, "RECENT"),
            Self::Seen => write!(f, "SEEN"),
            Self::Unanswered => write!(f, "UNANSWERED"),
            Self::Undeleted => write!(f, "UNDELETED"),
            Self::Undraft => write!(f, "UNDRAFT"),
            Self::Unflagged => write!(f, "UNFLAGGED"),
            Self::Unseen => write!(f, "UNSEEN"),
            Self::Bcc(s)
            | Self::Body(s)
            | Self::Cc(s)
            | Self::From(s)
            | Self::Subject(s)
            | Self::Text(s)
            | Self::To(s) => write!(f, "{} {}", self.keyword(), quoted(s)),
            Self::Header(name, value) => {
                write!(f, "HEADER {} {}", quoted(name), quoted(value))
            }
            Self::Keyword(k) => write!(f, "KEYWORD {k}"),
            Self::Unkeyword(k) => write!(f, "UNKEYWORD {k}"),
            Self::Larger(n) => write!(f, "LARGER {n}"),
            Self::Smaller(n) => write!(f, "SMALLER {n}"),
            Self::Before(d) => write!(f, "BEFORE {}", imap_date(*d)),
            Self::On(d) => write!(f, "ON {}", imap_date(*d)),
            Self::Since(d) => write!(f, "SINCE {}", imap_date(*d)),
            Self::SentBefore(d) => write!(f, "SENTBEFORE {}", imap_date(*d)),
            Self::SentOn(d) => write!(f, "SENTON {}", imap_date(*d)),
            Self::SentSince(d) => write!(f, "SENTSINCE {}", imap_date(*d)),
            Self::Uid(set) => write!(f, "UID {set}"),
            Self::Seq(set) => write!(f, "{set}"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::Or(a, b) => write!(f, "OR {a} {b}"),
            Self::And(items) => {
                let parts: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_strings() {
        assert_eq!(
            SearchCriteria::Subject("hi".to_string()).to_string(),
            "SUBJECT \"hi\""
        );
        assert_eq!(
            SearchCriteria::From("a \"b\"".to_string()).to_string(),
            "FROM \"a \\\"b\\\"\""
        );
    }

    #[test]
    fn display_formats_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            SearchCriteria::Since(date).to_string(),
            "SINCE 01-Jan-2024"
        );
    }

    #[test]
    fn display_composites() {
        let c = SearchCriteria::Or(
            Box::new(SearchCriteria::Unseen),
            Box::new(SearchCriteria::Flagged),
        );
        assert_eq!(c.to_string(), "OR UNSEEN FLAGGED");
        assert_eq!(
            SearchCriteria::Not(Box::new(SearchCriteria::Deleted)).to_string(),
            "NOT DELETED"
        );
    }
}
