//! Wire serialization for commands.
//!
//! A command serializes into line segments interleaved with literal
//! payloads; the engine transmits each literal only after the server's
//! `+` continuation.

use chrono::NaiveDate;

use crate::types::Mailbox;

use super::types::{FetchQuery, FetchSpec, SearchCriteria, StoreAction};
use super::{EncodedCommand, Segment};

/// Accumulates command bytes, splitting at literal boundaries.
pub(crate) struct CommandWriter {
    segments: Vec<Segment>,
    line: Vec<u8>,
}

impl CommandWriter {
    pub(crate) fn new(tag: &str) -> Self {
        let mut line = Vec::with_capacity(64);
        if !tag.is_empty() {
            line.extend_from_slice(tag.as_bytes());
            line.push(b' ');
        }
        Self {
            segments: Vec::new(),
            line,
        }
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) {
        self.line.extend_from_slice(bytes);
    }

    pub(crate) fn text(&mut self, s: &str) {
        self.raw(s.as_bytes());
    }

    pub(crate) fn space(&mut self) {
        self.line.push(b' ');
    }

    /// Emits an astring: bare atom, quoted string, or literal.
    pub(crate) fn astring(&mut self, s: &str) {
        if needs_literal(s) {
            self.literal(s.as_bytes().to_vec());
        } else if s.is_empty() || s.bytes().any(needs_quoting) {
            self.quoted(s);
        } else {
            self.text(s);
        }
    }

    /// Emits a string argument: always quoted, literal when non-ASCII.
    pub(crate) fn string(&mut self, s: &str) {
        if needs_literal(s) {
            self.literal(s.as_bytes().to_vec());
        } else {
            self.quoted(s);
        }
    }

    fn quoted(&mut self, s: &str) {
        self.line.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                self.line.push(b'\\');
            }
            self.line.push(b);
        }
        self.line.push(b'"');
    }

    /// Ends the current line with `{N}` CRLF and queues the payload.
    pub(crate) fn literal(&mut self, data: Vec<u8>) {
        self.line
            .extend_from_slice(format!("{{{}}}\r\n", data.len()).as_bytes());
        self.segments.push(Segment::Line(std::mem::take(&mut self.line)));
        self.segments.push(Segment::Literal(data));
    }

    pub(crate) fn mailbox(&mut self, mailbox: &Mailbox) {
        self.astring(&mailbox.to_wire());
    }

    pub(crate) fn finish(mut self) -> EncodedCommand {
        self.line.extend_from_slice(b"\r\n");
        self.segments.push(Segment::Line(self.line));
        EncodedCommand {
            segments: self.segments,
        }
    }
}

const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

fn needs_literal(s: &str) -> bool {
    s.bytes().any(|b| b >= 0x80 || b == b'\r' || b == b'\n')
}

/// Formats a date in the IMAP `DD-Mon-YYYY` form.
#[must_use]
pub fn imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

pub(crate) fn write_fetch_spec(w: &mut CommandWriter, spec: &FetchSpec) {
    match spec {
        FetchSpec::All => w.text("ALL"),
        FetchSpec::Fast => w.text("FAST"),
        FetchSpec::Full => w.text("FULL"),
        FetchSpec::Items(items) => {
            if let [single] = items.as_slice() {
                write_fetch_query(w, single);
            } else {
                w.raw(b"(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        w.space();
                    }
                    write_fetch_query(w, item);
                }
                w.raw(b")");
            }
        }
    }
}

fn write_fetch_query(w: &mut CommandWriter, item: &FetchQuery) {
    match item {
        FetchQuery::Flags => w.text("FLAGS"),
        FetchQuery::Uid => w.text("UID"),
        FetchQuery::InternalDate => w.text("INTERNALDATE"),
        FetchQuery::Rfc822Size => w.text("RFC822.SIZE"),
        FetchQuery::Envelope => w.text("ENVELOPE"),
        FetchQuery::BodyStructure => w.text("BODYSTRUCTURE"),
        FetchQuery::Rfc822 => w.text("RFC822"),
        FetchQuery::Rfc822Header => w.text("RFC822.HEADER"),
        FetchQuery::Rfc822Text => w.text("RFC822.TEXT"),
        FetchQuery::Section {
            section,
            peek,
            partial,
        } => {
            w.text(if *peek { "BODY.PEEK[" } else { "BODY[" });
            if let Some(s) = section {
                w.text(s);
            }
            w.raw(b"]");
            if let Some((start, len)) = partial {
                w.text(&format!("<{start}.{len}>"));
            }
        }
    }
}

pub(crate) fn write_store_action(w: &mut CommandWriter, action: &StoreAction, silent: bool) {
    let (prefix, flags) = match action {
        StoreAction::Replace(f) => ("FLAGS", f),
        StoreAction::Add(f) => ("+FLAGS", f),
        StoreAction::Remove(f) => ("-FLAGS", f),
    };
    w.text(prefix);
    if silent {
        w.text(".SILENT");
    }
    w.raw(b" (");
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            w.space();
        }
        w.text(flag.as_str());
    }
    w.raw(b")");
}

pub(crate) fn write_search_criteria(w: &mut CommandWriter, criteria: &SearchCriteria) {
    use SearchCriteria as C;
    match criteria {
        C::All => w.text("ALL"),
        C::Answered => w.text("ANSWERED"),
        C::Deleted => w.text("DELETED"),
        C::Draft => w.text("DRAFT"),
        C::Flagged => w.text("FLAGGED"),
        C::New => w.text("NEW"),
        C::Old => w.text("OLD"),
        C::Recent => w.text("RECENT"),
        C::Seen => w.text("SEEN"),
        C::Unanswered => w.text("UNANSWERED"),
        C::Undeleted => w.text("UNDELETED"),
        C::Undraft => w.text("UNDRAFT"),
        C::Unflagged => w.text("UNFLAGGED"),
        C::Unseen => w.text("UNSEEN"),
        C::Bcc(s) | C::Body(s) | C::Cc(s) | C::From(s) | C::Subject(s) | C::Text(s) | C::To(s) => {
            w.text(criteria.keyword());
            w.space();
            w.string(s);
        }
        C::Header(name, value) => {
            w.text("HEADER ");
            w.string(name);
            w.space();
            w.string(value);
        }
        C::Keyword(k) => {
            w.text("KEYWORD ");
            w.text(k);
        }
        C::Unkeyword(k) => {
            w.text("UNKEYWORD ");
            w.text(k);
        }
        C::Larger(n) => w.text(&format!("LARGER {n}")),
        C::Smaller(n) => w.text(&format!("SMALLER {n}")),
        C::Before(d) => w.text(&format!("BEFORE {}", imap_date(*d))),
        C::On(d) => w.text(&format!("ON {}", imap_date(*d))),
        C::Since(d) => w.text(&format!("SINCE {}", imap_date(*d))),
        C::SentBefore(d) => w.text(&format!("SENTBEFORE {}", imap_date(*d))),
        C::SentOn(d) => w.text(&format!("SENTON {}", imap_date(*d))),
        C::SentSince(d) => w.text(&format!("SENTSINCE {}", imap_date(*d))),
        C::Uid(set) => w.text(&format!("UID {set}")),
        C::Seq(set) => w.text(&set.to_string()),
        C::Not(inner) => {
            w.text("NOT ");
            write_search_criteria(w, inner);
        }
        C::Or(a, b) => {
            w.text("OR ");
            write_search_criteria(w, a);
            w.space();
            write_search_criteria(w, b);
        }
        C::And(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    w.space();
                }
                write_search_criteria(w, item);
            }
        }
    }
}
