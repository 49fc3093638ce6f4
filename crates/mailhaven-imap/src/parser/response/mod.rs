//! IMAP response parser.
//!
//! Splits one accumulated response into a tagged completion, an untagged
//! data line, or a continuation request, per RFC 3501 grammar.

mod fetch;
mod helpers;
mod types;

pub use types::{BodyStructure, Envelope, EnvelopeAddress, FetchItem, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{MsgSeq, ResponseCode, Status, Tag};
use crate::{Error, Result};

use helpers::{
    parse_capability_atoms, parse_flag_list, parse_list_entry, parse_quota_body,
    parse_quota_root_body, parse_response_code, parse_search_ids, parse_status_body,
    read_text_line,
};

/// A parsed response line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Completion of a tagged command.
    Tagged {
        /// Echoed command tag.
        tag: Tag,
        /// Completion status.
        status: Status,
        /// Optional bracketed code.
        code: Option<ResponseCode>,
        /// Free text.
        text: String,
    },
    /// Untagged server data.
    Untagged(UntaggedResponse),
    /// `+` continuation request.
    Continuation {
        /// Optional text after the `+`.
        text: Option<String>,
    },
}

/// Entry point for parsing one response.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response (line plus any inline literals).
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => Self::parse_continuation(&mut lexer),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(Error::Parse {
                position: 0,
                message: format!("expected *, +, or tag, got {token:?}"),
            }),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect_space()?;
        let status = Self::parse_status(lexer)?;
        lexer.expect_space()?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        match lexer.next_token()? {
            Token::Atom(keyword) => {
                let upper = keyword.to_ascii_uppercase();
                let untagged = match upper.as_str() {
                    "OK" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::Ok { code, text }
                    }
                    "NO" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::No { code, text }
                    }
                    "BAD" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::Bad { code, text }
                    }
                    "PREAUTH" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::PreAuth { code, text }
                    }
                    "BYE" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        UntaggedResponse::Bye { code, text }
                    }
                    "CAPABILITY" => UntaggedResponse::Capability(parse_capability_atoms(lexer)?),
                    "FLAGS" => {
                        lexer.expect_space()?;
                        UntaggedResponse::Flags(parse_flag_list(lexer)?)
                    }
                    "LIST" => {
                        lexer.expect_space()?;
                        UntaggedResponse::List(parse_list_entry(lexer)?)
                    }
                    "LSUB" => {
                        lexer.expect_space()?;
                        UntaggedResponse::Lsub(parse_list_entry(lexer)?)
                    }
                    "SEARCH" => UntaggedResponse::Search(parse_search_ids(lexer)?),
                    "STATUS" => {
                        lexer.expect_space()?;
                        let (mailbox, items) = parse_status_body(lexer)?;
                        UntaggedResponse::Status { mailbox, items }
                    }
                    "QUOTA" => {
                        lexer.expect_space()?;
                        UntaggedResponse::Quota(parse_quota_body(lexer)?)
                    }
                    "QUOTAROOT" => {
                        lexer.expect_space()?;
                        let (mailbox, roots) = parse_quota_root_body(lexer)?;
                        UntaggedResponse::QuotaRoot { mailbox, roots }
                    }
                    "ID" => {
                        lexer.expect_space()?;
                        let value = crate::parser::value::Value::read(lexer)?;
                        let pairs = value.as_pairs().ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "malformed ID parameter list".to_string(),
                        })?;
                        UntaggedResponse::Id(pairs)
                    }
                    _ => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("unknown untagged response: {keyword}"),
                        });
                    }
                };
                Ok(Response::Untagged(untagged))
            }
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom()?;
                let untagged = match keyword.to_ascii_uppercase().as_str() {
                    "EXISTS" => UntaggedResponse::Exists(n),
                    "RECENT" => UntaggedResponse::Recent(n),
                    "EXPUNGE" => {
                        let seq = MsgSeq::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "sequence number must be non-zero".to_string(),
                        })?;
                        UntaggedResponse::Expunge(seq)
                    }
                    "FETCH" => {
                        let seq = MsgSeq::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "sequence number must be non-zero".to_string(),
                        })?;
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch_items(lexer)?;
                        UntaggedResponse::Fetch { seq, items }
                    }
                    other => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("unknown message data: {other}"),
                        });
                    }
                };
                Ok(Response::Untagged(untagged))
            }
            token => Err(Error::Parse {
                position: lexer.position(),
                message: format!("unexpected token in untagged response: {token:?}"),
            }),
        }
    }

    fn parse_continuation(lexer: &mut Lexer<'_>) -> Result<Response> {
        if lexer.peek() == Some(b' ') {
            lexer.bump();
        }
        let text = read_text_line(lexer);
        Ok(Response::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        })
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let atom = lexer.read_atom()?;
        match atom.to_ascii_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            other => Err(Error::Parse {
                position: lexer.position(),
                message: format!("invalid status: {other}"),
            }),
        }
    }

    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };

        if lexer.peek() == Some(b' ') {
            lexer.bump();
        }
        Ok((code, read_text_line(lexer)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::types::{Capability, NameAttribute, UidValidity};

    use super::*;

    #[test]
    fn untagged_ok_greeting() {
        let response = ResponseParser::parse(b"* OK IMAP4rev1 server ready\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => {
                assert!(code.is_none());
                assert_eq!(text, "IMAP4rev1 server ready");
            }
            other => panic!("expected untagged OK, got {other:?}"),
        }
    }

    #[test]
    fn tagged_completion() {
        let response = ResponseParser::parse(b"T0001 OK LOGIN completed\r\n").unwrap();
        match response {
            Response::Tagged {
                tag, status, text, ..
            } => {
                assert_eq!(tag.as_str(), "T0001");
                assert_eq!(status, Status::Ok);
                assert_eq!(text, "LOGIN completed");
            }
            other => panic!("expected tagged response, got {other:?}"),
        }
    }

    #[test]
    fn capability_line() {
        let response = ResponseParser::parse(b"* CAPABILITY IMAP4rev1 IDLE QUOTA\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Capability(caps)) => {
                assert!(caps.contains(&Capability::Imap4Rev1));
                assert!(caps.contains(&Capability::Idle));
                assert!(caps.contains(&Capability::Quota));
            }
            other => panic!("expected capability, got {other:?}"),
        }
    }

    #[test]
    fn exists_and_expunge() {
        assert_eq!(
            ResponseParser::parse(b"* 23 EXISTS\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Exists(23))
        );
        match ResponseParser::parse(b"* 4 EXPUNGE\r\n").unwrap() {
            Response::Untagged(UntaggedResponse::Expunge(seq)) => assert_eq!(seq.get(), 4),
            other => panic!("expected expunge, got {other:?}"),
        }
    }

    #[test]
    fn list_row_decodes_utf7() {
        let response =
            ResponseParser::parse(b"* LIST (\\HasChildren) \"/\" \"Entw&APw-rfe\"\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::List(entry)) => {
                assert!(entry.attributes.contains(&NameAttribute::HasChildren));
                assert_eq!(entry.delimiter, Some('/'));
                assert_eq!(entry.mailbox.as_str(), "Entwürfe");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn lsub_row() {
        let response = ResponseParser::parse(b"* LSUB () \".\" INBOX.Lists\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Lsub(entry)) => {
                assert_eq!(entry.mailbox.as_str(), "INBOX.Lists");
                assert_eq!(entry.delimiter, Some('.'));
            }
            other => panic!("expected lsub, got {other:?}"),
        }
    }

    #[test]
    fn search_ids() {
        let response = ResponseParser::parse(b"* SEARCH 2 3 5 8 13\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(UntaggedResponse::Search(vec![2, 3, 5, 8, 13]))
        );
    }

    #[test]
    fn empty_search() {
        let response = ResponseParser::parse(b"* SEARCH\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(UntaggedResponse::Search(Vec::new()))
        );
    }

    #[test]
    fn uidvalidity_code() {
        let response = ResponseParser::parse(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n")
            .unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Ok {
                code: Some(ResponseCode::UidValidity(v)),
                ..
            }) => assert_eq!(v, UidValidity::new(3_857_529_045).unwrap()),
            other => panic!("expected UIDVALIDITY, got {other:?}"),
        }
    }

    #[test]
    fn appenduid_code() {
        let response =
            ResponseParser::parse(b"T0005 OK [APPENDUID 38505 3955] APPEND completed\r\n").unwrap();
        match response {
            Response::Tagged {
                code: Some(ResponseCode::AppendUid { validity, uid }),
                ..
            } => {
                assert_eq!(validity.get(), 38_505);
                assert_eq!(uid.get(), 3955);
            }
            other => panic!("expected APPENDUID, got {other:?}"),
        }
    }

    #[test]
    fn quota_response() {
        let response = ResponseParser::parse(b"* QUOTA \"\" (STORAGE 10 512)\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Quota(quota)) => {
                assert_eq!(quota.root, "");
                let storage = quota.resource("STORAGE").unwrap();
                assert_eq!(storage.usage, 10);
                assert_eq!(storage.limit, 512);
            }
            other => panic!("expected quota, got {other:?}"),
        }
    }

    #[test]
    fn quota_root_response() {
        let response = ResponseParser::parse(b"* QUOTAROOT INBOX \"\"\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::QuotaRoot { mailbox, roots }) => {
                assert!(mailbox.is_inbox());
                assert_eq!(roots, vec![String::new()]);
            }
            other => panic!("expected quotaroot, got {other:?}"),
        }
    }

    #[test]
    fn id_response() {
        let response =
            ResponseParser::parse(b"* ID (\"name\" \"Dovecot\")\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Id(pairs)) => {
                assert_eq!(pairs, vec![("name".to_string(), "Dovecot".to_string())]);
            }
            other => panic!("expected id, got {other:?}"),
        }
    }

    #[test]
    fn id_nil_response() {
        let response = ResponseParser::parse(b"* ID NIL\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(UntaggedResponse::Id(Vec::new()))
        );
    }

    #[test]
    fn continuation_with_text() {
        let response = ResponseParser::parse(b"+ idling\r\n").unwrap();
        assert_eq!(
            response,
            Response::Continuation {
                text: Some("idling".to_string())
            }
        );
    }

    #[test]
    fn bare_continuation() {
        let response = ResponseParser::parse(b"+\r\n").unwrap();
        assert_eq!(response, Response::Continuation { text: None });
    }
}
