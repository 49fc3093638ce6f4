//! Shared parsing helpers for untagged response bodies.

use crate::parser::lexer::{Lexer, Token};
use crate::parser::value::Value;
use crate::types::{
    Capability, Flag, FlagSet, ListEntry, Mailbox, MsgSeq, NameAttribute, Quota, QuotaResource,
    ResponseCode, StatusItem, Uid, UidValidity,
};
use crate::{Error, Result};

/// Parses a `[CODE ...]` response code; the opening bracket is pending.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(&Token::LBracket)?;

    let atom = lexer.read_atom()?;
    let code = match atom.to_ascii_uppercase().as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "UIDNEXT" => {
            lexer.expect_space()?;
            let uid = read_uid(lexer)?;
            ResponseCode::UidNext(uid)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let validity = read_validity(lexer)?;
            ResponseCode::UidValidity(validity)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            let seq = read_seq(lexer)?;
            ResponseCode::Unseen(seq)
        }
        "APPENDUID" => {
            lexer.expect_space()?;
            let validity = read_validity(lexer)?;
            lexer.expect_space()?;
            let uid = read_uid(lexer)?;
            ResponseCode::AppendUid { validity, uid }
        }
        "CAPABILITY" => {
            let caps = parse_capability_atoms(lexer)?;
            ResponseCode::Capability(caps)
        }
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            let flags = parse_flag_list(lexer)?;
            ResponseCode::PermanentFlags(flags.into_iter().collect())
        }
        other => {
            let code = ResponseCode::Other(other.to_string());
            skip_until(lexer, b']');
            code
        }
    };

    skip_until(lexer, b']');
    lexer.expect(&Token::RBracket)?;
    Ok(code)
}

fn skip_until(lexer: &mut Lexer<'_>, target: u8) {
    while lexer.peek().is_some_and(|b| b != target) {
        lexer.bump();
    }
}

fn read_uid(lexer: &mut Lexer<'_>) -> Result<Uid> {
    let n = lexer.read_number()?;
    Uid::new(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "UID must be non-zero".to_string(),
    })
}

fn read_validity(lexer: &mut Lexer<'_>) -> Result<UidValidity> {
    let n = lexer.read_number()?;
    UidValidity::new(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "UIDVALIDITY must be non-zero".to_string(),
    })
}

fn read_seq(lexer: &mut Lexer<'_>) -> Result<MsgSeq> {
    let n = lexer.read_number()?;
    MsgSeq::new(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "sequence number must be non-zero".to_string(),
    })
}

/// Parses the space-separated capability atoms following `CAPABILITY`.
pub fn parse_capability_atoms(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.bump();
        if let Token::Atom(atom) = lexer.next_token()? {
            caps.push(Capability::parse(atom));
        }
    }
    Ok(caps)
}

/// Parses a parenthesised flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<FlagSet> {
    lexer.expect(&Token::LParen)?;

    let mut flags = FlagSet::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(atom) => flags.insert(Flag::parse(atom)),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in flag list: {token:?}"),
                });
            }
        }
    }
    Ok(flags)
}

/// Parses the body of a LIST or LSUB row after the keyword.
pub fn parse_list_entry(lexer: &mut Lexer<'_>) -> Result<ListEntry> {
    lexer.expect(&Token::LParen)?;

    let mut attributes = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(atom) => attributes.push(NameAttribute::parse(atom)),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in LIST attributes: {token:?}"),
                });
            }
        }
    }

    lexer.expect_space()?;
    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("expected delimiter, got {token:?}"),
            });
        }
    };

    lexer.expect_space()?;
    let wire_name = lexer.read_astring()?;

    Ok(ListEntry {
        attributes,
        delimiter,
        mailbox: Mailbox::from_wire(&wire_name),
    })
}

/// Parses the number list of a SEARCH response.
pub fn parse_search_ids(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.bump();
        if let Token::Number(n) = lexer.next_token()? {
            ids.push(n);
        }
    }
    Ok(ids)
}

/// Parses `mailbox (ATTR n ...)` of a STATUS response.
pub fn parse_status_body(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<StatusItem>)> {
    let wire_name = lexer.read_astring()?;
    lexer.expect_space()?;
    lexer.expect(&Token::LParen)?;

    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                lexer.expect_space()?;
                let value = lexer.read_number()?;
                let item = match name.to_ascii_uppercase().as_str() {
                    "MESSAGES" => StatusItem::Messages(value),
                    "RECENT" => StatusItem::Recent(value),
                    "UNSEEN" => StatusItem::Unseen(value),
                    "UIDNEXT" => match Uid::new(value) {
                        Some(uid) => StatusItem::UidNext(uid),
                        None => continue,
                    },
                    "UIDVALIDITY" => match UidValidity::new(value) {
                        Some(v) => StatusItem::UidValidity(v),
                        None => continue,
                    },
                    _ => continue,
                };
                items.push(item);
            }
            _ => {}
        }
    }

    Ok((Mailbox::from_wire(&wire_name), items))
}

/// Parses `root (resource usage limit ...)` of a QUOTA response.
pub fn parse_quota_body(lexer: &mut Lexer<'_>) -> Result<Quota> {
    let root = lexer.read_astring()?;
    lexer.expect_space()?;

    let list = Value::read(lexer)?;
    let items = list.as_list().ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: "expected quota resource list".to_string(),
    })?;

    let mut resources = Vec::new();
    for triple in items.chunks(3) {
        let [name, usage, limit] = triple else {
            return Err(Error::Parse {
                position: lexer.position(),
                message: "quota resources must be name/usage/limit triples".to_string(),
            });
        };
        resources.push(QuotaResource {
            name: name
                .as_str()
                .ok_or_else(|| Error::Parse {
                    position: lexer.position(),
                    message: "quota resource name must be a string".to_string(),
                })?
                .to_string(),
            usage: u64::from(usage.as_number().unwrap_or(0)),
            limit: u64::from(limit.as_number().unwrap_or(0)),
        });
    }

    Ok(Quota { root, resources })
}

/// Parses `mailbox root ...` of a QUOTAROOT response.
pub fn parse_quota_root_body(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<String>)> {
    let wire_name = lexer.read_astring()?;

    let mut roots = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.bump();
        roots.push(lexer.read_astring()?);
    }

    Ok((Mailbox::from_wire(&wire_name), roots))
}

/// Reads free text until CRLF (consumed when present).
pub fn read_text_line(lexer: &mut Lexer<'_>) -> String {
    let rest = lexer.remaining();
    let end = rest
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(rest.len());
    lexer.skip(end);
    if lexer.peek() == Some(b'\r') {
        lexer.skip(2);
    }
    String::from_utf8_lossy(&rest[..end]).into_owned()
}
