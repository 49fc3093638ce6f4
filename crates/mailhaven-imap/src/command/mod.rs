//! IMAP command construction and wire encoding.

mod serialize;
mod tag;
mod types;

pub use serialize::imap_date;
pub use tag::TagGenerator;
pub use types::{FetchQuery, FetchSpec, SearchCriteria, StoreAction};

use crate::types::{Flag, Mailbox, SequenceSet, StatusQuery, UidSet};

use serialize::{CommandWriter, write_fetch_spec, write_search_criteria, write_store_action};

/// One wire segment of an encoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// CRLF-terminated command text.
    Line(Vec<u8>),
    /// Literal payload; sent only after a `+` continuation.
    Literal(Vec<u8>),
}

/// A command serialized into transmit segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    pub(crate) segments: Vec<Segment>,
}

impl EncodedCommand {
    /// The wire segments in transmit order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if transmission involves continuation handshakes.
    #[must_use]
    pub fn needs_continuation(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Literal(_)))
    }

    /// Concatenated bytes as they would appear on the wire, continuations
    /// aside. Mostly useful in tests.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Line(b) | Segment::Literal(b) => out.extend_from_slice(b),
            }
        }
        out
    }
}

/// An IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any state
    /// CAPABILITY.
    Capability,
    /// NOOP.
    Noop,
    /// LOGOUT.
    Logout,

    // Not authenticated
    /// STARTTLS.
    StartTls,
    /// LOGIN with clear-text credentials.
    Login {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// AUTHENTICATE with a SASL mechanism.
    Authenticate {
        /// Mechanism name, e.g. `PLAIN` or `XOAUTH2`.
        mechanism: String,
        /// Base64 initial response, if the mechanism sends one.
        initial_response: Option<String>,
    },

    // Authenticated
    /// ID (RFC 2971); `None` sends `ID NIL`.
    Id {
        /// Field/value pairs describing this client.
        parameters: Option<Vec<(String, String)>>,
    },
    /// SELECT.
    Select {
        /// Mailbox to open read-write.
        mailbox: Mailbox,
    },
    /// EXAMINE.
    Examine {
        /// Mailbox to open read-only.
        mailbox: Mailbox,
    },
    /// CREATE.
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// DELETE.
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// RENAME.
    Rename {
        /// Existing name.
        from: Mailbox,
        /// New name.
        to: Mailbox,
    },
    /// SUBSCRIBE.
    Subscribe {
        /// Mailbox to subscribe to.
        mailbox: Mailbox,
    },
    /// UNSUBSCRIBE.
    Unsubscribe {
        /// Mailbox to unsubscribe from.
        mailbox: Mailbox,
    },
    /// LIST.
    List {
        /// Reference name.
        reference: String,
        /// Name pattern with `*`/`%` wildcards.
        pattern: String,
    },
    /// LSUB.
    Lsub {
        /// Reference name.
        reference: String,
        /// Name pattern.
        pattern: String,
    },
    /// STATUS.
    Status {
        /// Mailbox to query.
        mailbox: Mailbox,
        /// Attributes to request.
        items: Vec<StatusQuery>,
    },
    /// APPEND; the message goes as a literal.
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Flags to set on the stored message.
        flags: Option<Vec<Flag>>,
        /// Complete RFC 822 message.
        message: Vec<u8>,
    },
    /// GETQUOTA.
    GetQuota {
        /// Quota root name.
        root: String,
    },
    /// GETQUOTAROOT.
    GetQuotaRoot {
        /// Mailbox whose roots to resolve.
        mailbox: Mailbox,
    },

    // Selected
    /// CHECK.
    Check,
    /// CLOSE.
    Close,
    /// EXPUNGE.
    Expunge,
    /// SEARCH / UID SEARCH.
    Search {
        /// Optional CHARSET argument.
        charset: Option<String>,
        /// Criteria tree.
        criteria: SearchCriteria,
        /// Use the UID variant.
        uid: bool,
    },
    /// FETCH / UID FETCH.
    Fetch {
        /// Messages to fetch.
        set: SequenceSet,
        /// Items to return.
        spec: FetchSpec,
        /// Use the UID variant.
        uid: bool,
    },
    /// STORE / UID STORE.
    Store {
        /// Messages to mutate.
        set: SequenceSet,
        /// Flag mutation.
        action: StoreAction,
        /// Suppress the untagged FETCH echo.
        silent: bool,
        /// Use the UID variant.
        uid: bool,
    },
    /// COPY / UID COPY.
    Copy {
        /// Messages to copy.
        set: SequenceSet,
        /// Destination mailbox.
        mailbox: Mailbox,
        /// Use the UID variant.
        uid: bool,
    },
    /// MOVE / UID MOVE (RFC 6851).
    Move {
        /// Messages to move.
        set: SequenceSet,
        /// Destination mailbox.
        mailbox: Mailbox,
        /// Use the UID variant.
        uid: bool,
    },
    /// IDLE (RFC 2177).
    Idle,
    /// DONE terminating IDLE; sent without a tag.
    Done,
}

impl Command {
    /// Encodes the command under the given tag.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn encode(&self, tag: &str) -> EncodedCommand {
        // DONE is the one line that goes out untagged
        let mut w = if matches!(self, Self::Done) {
            CommandWriter::new("")
        } else {
            CommandWriter::new(tag)
        };

        match self {
            Self::Capability => w.text("CAPABILITY"),
            Self::Noop => w.text("NOOP"),
            Self::Logout => w.text("LOGOUT"),
            Self::StartTls => w.text("STARTTLS"),
            Self::Check => w.text("CHECK"),
            Self::Close => w.text("CLOSE"),
            Self::Expunge => w.text("EXPUNGE"),
            Self::Idle => w.text("IDLE"),
            Self::Done => w.text("DONE"),

            Self::Login { username, password } => {
                w.text("LOGIN ");
                w.astring(username);
                w.space();
                w.astring(password);
            }

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                w.text("AUTHENTICATE ");
                w.text(mechanism);
                if let Some(resp) = initial_response {
                    w.space();
                    w.text(resp);
                }
            }

            Self::Id { parameters } => {
                w.text("ID ");
                match parameters {
                    Some(params) => {
                        w.raw(b"(");
                        for (i, (key, value)) in params.iter().enumerate() {
                            if i > 0 {
                                w.space();
                            }
                            w.string(key);
                            w.space();
                            w.string(value);
                        }
                        w.raw(b")");
                    }
                    None => w.text("NIL"),
                }
            }

            Self::Select { mailbox } => {
                w.text("SELECT ");
                w.mailbox(mailbox);
            }
            Self::Examine { mailbox } => {
                w.text("EXAMINE ");
                w.mailbox(mailbox);
            }
            Self::Create { mailbox } => {
                w.text("CREATE ");
                w.mailbox(mailbox);
            }
            Self::Delete { mailbox } => {
                w.text("DELETE ");
                w.mailbox(mailbox);
            }
            Self::Rename { from, to } => {
                w.text("RENAME ");
                w.mailbox(from);
                w.space();
                w.mailbox(to);
            }
            Self::Subscribe { mailbox } => {
                w.text("SUBSCRIBE ");
                w.mailbox(mailbox);
            }
            Self::Unsubscribe { mailbox } => {
                w.text("UNSUBSCRIBE ");
                w.mailbox(mailbox);
            }

            Self::List { reference, pattern } | Self::Lsub { reference, pattern } => {
                w.text(if matches!(self, Self::List { .. }) {
                    "LIST "
                } else {
                    "LSUB "
                });
                w.string(reference);
                w.space();
                w.string(pattern);
            }

            Self::Status { mailbox, items } => {
                w.text("STATUS ");
                w.mailbox(mailbox);
                w.raw(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        w.space();
                    }
                    w.text(item.as_str());
                }
                w.raw(b")");
            }

            Self::Append {
                mailbox,
                flags,
                message,
            } => {
                w.text("APPEND ");
                w.mailbox(mailbox);
                if let Some(flags) = flags {
                    w.raw(b" (");
                    for (i, flag) in flags.iter().enumerate() {
                        if i > 0 {
                            w.space();
                        }
                        w.text(flag.as_str());
                    }
                    w.raw(b")");
                }
                w.space();
                w.literal(message.clone());
            }

            Self::GetQuota { root } => {
                w.text("GETQUOTA ");
                w.string(root);
            }
            Self::GetQuotaRoot { mailbox } => {
                w.text("GETQUOTAROOT ");
                w.mailbox(mailbox);
            }

            Self::Search {
                charset,
                criteria,
                uid,
            } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("SEARCH ");
                if let Some(cs) = charset {
                    w.text("CHARSET ");
                    w.text(cs);
                    w.space();
                }
                write_search_criteria(&mut w, criteria);
            }

            Self::Fetch { set, spec, uid } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("FETCH ");
                w.text(&set.to_string());
                w.space();
                write_fetch_spec(&mut w, spec);
            }

            Self::Store {
                set,
                action,
                silent,
                uid,
            } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("STORE ");
                w.text(&set.to_string());
                w.space();
                write_store_action(&mut w, action, *silent);
            }

            Self::Copy { set, mailbox, uid } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("COPY ");
                w.text(&set.to_string());
                w.space();
                w.mailbox(mailbox);
            }

            Self::Move { set, mailbox, uid } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("MOVE ");
                w.text(&set.to_string());
                w.space();
                w.mailbox(mailbox);
            }
        }

        w.finish()
    }

    /// Encodes a UID FETCH for the given UID set.
    #[must_use]
    pub fn uid_fetch(set: &UidSet, spec: FetchSpec) -> Self {
        Self::Fetch {
            set: uid_set_as_sequence(set),
            spec,
            uid: true,
        }
    }
}

/// Reinterprets a UID set as a sequence set for `UID` command arguments.
#[must_use]
pub fn uid_set_as_sequence(set: &UidSet) -> SequenceSet {
    match set {
        UidSet::Single(uid) => SequenceSet::from_numbers(&[uid.get()])
            .unwrap_or(SequenceSet::All),
        UidSet::Range(a, b) => {
            SequenceSet::range(a.get(), b.get()).unwrap_or(SequenceSet::All)
        }
        UidSet::RangeFrom(a) => crate::types::MsgSeq::new(a.get())
            .map_or(SequenceSet::All, SequenceSet::RangeFrom),
        UidSet::All => SequenceSet::All,
        UidSet::Set(items) => {
            SequenceSet::Set(items.iter().map(uid_set_as_sequence).collect())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use crate::types::Uid;

    use super::*;

    fn line(cmd: &Command, tag: &str) -> Vec<u8> {
        cmd.encode(tag).to_bytes()
    }

    #[test]
    fn capability() {
        assert_eq!(line(&Command::Capability, "T0001"), b"T0001 CAPABILITY\r\n");
    }

    #[test]
    fn login_plain_atoms() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert_eq!(line(&cmd, "T0001"), b"T0001 LOGIN user pass\r\n");
    }

    #[test]
    fn login_quotes_spaces() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "pass word".to_string(),
        };
        assert_eq!(
            line(&cmd, "T0001"),
            b"T0001 LOGIN user@example.com \"pass word\"\r\n"
        );
    }

    #[test]
    fn login_password_with_non_ascii_goes_literal() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pässwörd".to_string(),
        };
        let encoded = cmd.encode("T0001");
        assert!(encoded.needs_continuation());
        let segments = encoded.segments();
        assert_eq!(
            segments[0],
            Segment::Line(b"T0001 LOGIN user {10}\r\n".to_vec())
        );
        assert_eq!(
            segments[1],
            Segment::Literal("pässwörd".as_bytes().to_vec())
        );
        assert_eq!(segments[2], Segment::Line(b"\r\n".to_vec()));
    }

    #[test]
    fn select_inbox() {
        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
        };
        assert_eq!(line(&cmd, "T0002"), b"T0002 SELECT INBOX\r\n");
    }

    #[test]
    fn select_encodes_utf7() {
        let cmd = Command::Select {
            mailbox: Mailbox::new("Entwürfe"),
        };
        assert_eq!(line(&cmd, "T0002"), b"T0002 SELECT Entw&APw-rfe\r\n");
    }

    #[test]
    fn list_quotes_arguments() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(line(&cmd, "T0003"), b"T0003 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn lsub_row() {
        let cmd = Command::Lsub {
            reference: String::new(),
            pattern: "INBOX.%".to_string(),
        };
        assert_eq!(line(&cmd, "T0003"), b"T0003 LSUB \"\" \"INBOX.%\"\r\n");
    }

    #[test]
    fn status_items() {
        let cmd = Command::Status {
            mailbox: Mailbox::inbox(),
            items: vec![StatusQuery::Messages, StatusQuery::Unseen],
        };
        assert_eq!(
            line(&cmd, "T0004"),
            b"T0004 STATUS INBOX (MESSAGES UNSEEN)\r\n"
        );
    }

    #[test]
    fn append_carries_literal() {
        let cmd = Command::Append {
            mailbox: Mailbox::inbox(),
            flags: Some(vec![Flag::Seen]),
            message: b"Subject: x\r\n\r\nbody".to_vec(),
        };
        let encoded = cmd.encode("T0005");
        assert!(encoded.needs_continuation());
        assert_eq!(
            encoded.segments()[0],
            Segment::Line(b"T0005 APPEND INBOX (\\Seen) {18}\r\n".to_vec())
        );
    }

    #[test]
    fn fetch_items() {
        let cmd = Command::Fetch {
            set: SequenceSet::range(1, 10).unwrap(),
            spec: FetchSpec::Items(vec![FetchQuery::Flags, FetchQuery::Uid]),
            uid: false,
        };
        assert_eq!(line(&cmd, "T0006"), b"T0006 FETCH 1:10 (FLAGS UID)\r\n");
    }

    #[test]
    fn fetch_peek_sections() {
        let cmd = Command::Fetch {
            set: SequenceSet::single(1).unwrap(),
            spec: FetchSpec::Items(vec![
                FetchQuery::Uid,
                FetchQuery::Flags,
                FetchQuery::peek("HEADER"),
                FetchQuery::peek("TEXT"),
            ]),
            uid: false,
        };
        assert_eq!(
            line(&cmd, "T0007"),
            b"T0007 FETCH 1 (UID FLAGS BODY.PEEK[HEADER] BODY.PEEK[TEXT])\r\n"
        );
    }

    #[test]
    fn uid_store_silent() {
        let cmd = Command::Store {
            set: SequenceSet::single(7).unwrap(),
            action: StoreAction::Add(vec![Flag::Seen]),
            silent: true,
            uid: true,
        };
        assert_eq!(
            line(&cmd, "T0008"),
            b"T0008 UID STORE 7 +FLAGS.SILENT (\\Seen)\r\n"
        );
    }

    #[test]
    fn search_with_date_and_subject() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cmd = Command::Search {
            charset: None,
            criteria: SearchCriteria::And(vec![
                SearchCriteria::Since(date),
                SearchCriteria::Subject("hi".to_string()),
            ]),
            uid: false,
        };
        assert_eq!(
            line(&cmd, "T0009"),
            b"T0009 SEARCH SINCE 01-Jan-2024 SUBJECT \"hi\"\r\n"
        );
    }

    #[test]
    fn uid_search_with_charset() {
        let cmd = Command::Search {
            charset: Some("UTF-8".to_string()),
            criteria: SearchCriteria::Text("héllo".to_string()),
            uid: true,
        };
        let encoded = cmd.encode("T0010");
        assert!(encoded.needs_continuation());
        assert_eq!(
            encoded.segments()[0],
            Segment::Line(b"T0010 UID SEARCH CHARSET UTF-8 TEXT {6}\r\n".to_vec())
        );
    }

    #[test]
    fn move_and_copy() {
        let set = SequenceSet::single(3).unwrap();
        let cmd = Command::Move {
            set: set.clone(),
            mailbox: Mailbox::new("Archive"),
            uid: true,
        };
        assert_eq!(line(&cmd, "T0011"), b"T0011 UID MOVE 3 Archive\r\n");

        let cmd = Command::Copy {
            set,
            mailbox: Mailbox::new("Backup"),
            uid: false,
        };
        assert_eq!(line(&cmd, "T0012"), b"T0012 COPY 3 Backup\r\n");
    }

    #[test]
    fn id_nil_and_params() {
        assert_eq!(
            line(&Command::Id { parameters: None }, "T0013"),
            b"T0013 ID NIL\r\n"
        );
        let cmd = Command::Id {
            parameters: Some(vec![("name".to_string(), "mailhaven".to_string())]),
        };
        assert_eq!(
            line(&cmd, "T0013"),
            b"T0013 ID (\"name\" \"mailhaven\")\r\n"
        );
    }

    #[test]
    fn quota_commands() {
        assert_eq!(
            line(
                &Command::GetQuota {
                    root: String::new()
                },
                "T0014"
            ),
            b"T0014 GETQUOTA \"\"\r\n"
        );
        assert_eq!(
            line(
                &Command::GetQuotaRoot {
                    mailbox: Mailbox::inbox()
                },
                "T0015"
            ),
            b"T0015 GETQUOTAROOT INBOX\r\n"
        );
    }

    #[test]
    fn done_is_untagged() {
        assert_eq!(line(&Command::Done, "ignored"), b"DONE\r\n");
    }

    #[test]
    fn idle_is_tagged() {
        assert_eq!(line(&Command::Idle, "T0016"), b"T0016 IDLE\r\n");
    }

    #[test]
    fn uid_fetch_helper() {
        let uid = Uid::new(42).unwrap();
        let cmd = Command::uid_fetch(&UidSet::single(uid), FetchSpec::Items(vec![FetchQuery::Flags]));
        assert_eq!(line(&cmd, "T0017"), b"T0017 UID FETCH 42 FLAGS\r\n");
    }
}
