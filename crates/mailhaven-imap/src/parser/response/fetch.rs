//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::parser::value::Value;
use crate::types::Uid;
use crate::{Error, Result};

use super::helpers::parse_flag_list;
use super::types::{BodyStructure, Envelope, EnvelopeAddress, FetchItem};

/// Parses the parenthesised item list of a FETCH response.
pub fn parse_fetch_items(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(&Token::LParen)?;

    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                let upper = name.to_ascii_uppercase();
                match upper.as_str() {
                    "FLAGS" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Flags(parse_flag_list(lexer)?));
                    }
                    "UID" => {
                        lexer.expect_space()?;
                        let n = lexer.read_number()?;
                        let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "UID must be non-zero".to_string(),
                        })?;
                        items.push(FetchItem::Uid(uid));
                    }
                    "RFC822.SIZE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Rfc822Size(lexer.read_number()?));
                    }
                    "INTERNALDATE" => {
                        lexer.expect_space()?;
                        if let Token::QuotedString(date) = lexer.next_token()? {
                            items.push(FetchItem::InternalDate(date));
                        }
                    }
                    "ENVELOPE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Envelope(Box::new(parse_envelope(lexer)?)));
                    }
                    "BODYSTRUCTURE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::BodyStructure(parse_body_structure(lexer)?));
                    }
                    "BODY" => {
                        if lexer.peek() == Some(b'[') {
                            let (section, origin) = parse_section_and_origin(lexer)?;
                            lexer.expect_space()?;
                            let data = match lexer.next_token()? {
                                Token::Literal(d) => Some(d),
                                Token::QuotedString(s) => Some(s.into_bytes()),
                                _ => None,
                            };
                            items.push(FetchItem::Body {
                                section,
                                origin,
                                data,
                            });
                        } else {
                            // BODYSTRUCTURE shape under the bare BODY key
                            lexer.expect_space()?;
                            items.push(FetchItem::BodyStructure(parse_body_structure(lexer)?));
                        }
                    }
                    "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                        let section = match upper.as_str() {
                            "RFC822.HEADER" => Some("HEADER".to_string()),
                            "RFC822.TEXT" => Some("TEXT".to_string()),
                            _ => None,
                        };
                        lexer.expect_space()?;
                        let data = match lexer.next_token()? {
                            Token::Literal(d) => Some(d),
                            Token::QuotedString(s) => Some(s.into_bytes()),
                            _ => None,
                        };
                        items.push(FetchItem::Body {
                            section,
                            origin: None,
                            data,
                        });
                    }
                    _ => {
                        // Unknown item: consume its value as a generic tree
                        if lexer.peek() == Some(b' ') {
                            lexer.bump();
                        }
                        let _ = Value::read(lexer)?;
                    }
                }
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("unexpected token in FETCH items: {token:?}"),
                });
            }
        }
    }

    Ok(items)
}

/// Parses optional `[section]` and `<origin>` after a BODY keyword.
fn parse_section_and_origin(lexer: &mut Lexer<'_>) -> Result<(Option<String>, Option<u32>)> {
    let mut section = None;
    let mut origin = None;

    if lexer.peek() == Some(b'[') {
        lexer.bump();
        let mut buf = String::new();
        while let Some(b) = lexer.peek() {
            lexer.bump();
            if b == b']' {
                break;
            }
            buf.push(b as char);
        }
        if !buf.is_empty() {
            section = Some(buf);
        }
    }

    if lexer.peek() == Some(b'<') {
        lexer.bump();
        let mut buf = String::new();
        while let Some(b) = lexer.peek() {
            lexer.bump();
            if b == b'>' {
                break;
            }
            if b.is_ascii_digit() {
                buf.push(b as char);
            }
        }
        origin = buf.parse().ok();
    }

    Ok((section, origin))
}

/// Parses a complete ENVELOPE value.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(&Token::LParen)?;

    let date = lexer.read_nstring()?;
    lexer.expect_space()?;
    let subject = lexer.read_nstring()?;
    lexer.expect_space()?;
    let from = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let sender = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let reply_to = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let to = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let cc = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let bcc = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;
    let message_id = lexer.read_nstring()?;

    lexer.expect(&Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<EnvelopeAddress>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();
            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.bump();
                        break;
                    }
                    Some(b'(') => addresses.push(parse_address(lexer)?),
                    Some(b' ') => {
                        lexer.bump();
                    }
                    _ => break,
                }
            }
            Ok(addresses)
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("expected address list, got {token:?}"),
        }),
    }
}

fn parse_address(lexer: &mut Lexer<'_>) -> Result<EnvelopeAddress> {
    lexer.expect(&Token::LParen)?;

    let name = lexer.read_nstring()?;
    lexer.expect_space()?;
    let adl = lexer.read_nstring()?;
    lexer.expect_space()?;
    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;
    let host = lexer.read_nstring()?;

    lexer.expect(&Token::RParen)?;

    Ok(EnvelopeAddress {
        name,
        adl,
        mailbox,
        host,
    })
}

/// Parses a BODYSTRUCTURE value, opening paren pending.
pub fn parse_body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    lexer.expect(&Token::LParen)?;
    parse_body_structure_inner(lexer)
}

/// Parses a BODYSTRUCTURE whose opening paren is already consumed.
fn parse_body_structure_inner(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    if lexer.peek() == Some(b'(') {
        // Multipart: one or more nested structures, then the subtype
        let mut parts = Vec::new();
        while lexer.peek() == Some(b'(') {
            parts.push(parse_body_structure(lexer)?);
            if lexer.peek() == Some(b' ') {
                lexer.bump();
            }
        }

        let subtype = lexer
            .read_nstring()?
            .unwrap_or_default()
            .to_ascii_uppercase();
        skip_to_close_paren(lexer)?;

        Ok(BodyStructure::Multipart { parts, subtype })
    } else {
        let media_type = lexer
            .read_nstring()?
            .unwrap_or_default()
            .to_ascii_uppercase();
        lexer.expect_space()?;
        let media_subtype = lexer
            .read_nstring()?
            .unwrap_or_default()
            .to_ascii_uppercase();
        lexer.expect_space()?;

        let params = parse_part_params(lexer)?;
        lexer.expect_space()?;
        let id = lexer.read_nstring()?;
        lexer.expect_space()?;
        let description = lexer.read_nstring()?;
        lexer.expect_space()?;
        let encoding = lexer.read_nstring()?.unwrap_or_default();
        lexer.expect_space()?;
        let size = lexer.read_number()?;

        let lines = if media_type == "TEXT" && lexer.peek() == Some(b' ') {
            lexer.bump();
            Some(lexer.read_number()?)
        } else {
            None
        };

        skip_to_close_paren(lexer)?;

        Ok(BodyStructure::Part {
            media_type,
            media_subtype,
            params,
            id,
            description,
            encoding,
            size,
            lines,
        })
    }
}

fn parse_part_params(lexer: &mut Lexer<'_>) -> Result<Vec<(String, String)>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.bump();
                        break;
                    }
                    Some(b' ') => {
                        lexer.bump();
                    }
                    _ => {
                        let key = lexer.read_nstring()?.unwrap_or_default();
                        if lexer.peek() == Some(b' ') {
                            lexer.bump();
                        }
                        let value = lexer.read_nstring()?.unwrap_or_default();
                        params.push((key, value));
                    }
                }
            }
            Ok(params)
        }
        _ => Ok(Vec::new()),
    }
}

/// Skips trailing extension fields up to the closing paren of this level.
fn skip_to_close_paren(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 1;
    while depth > 0 {
        match lexer.peek() {
            Some(b'(') => {
                depth += 1;
                lexer.bump();
            }
            Some(b')') => {
                depth -= 1;
                lexer.bump();
            }
            Some(b'{') => {
                let _ = lexer.next_token()?;
            }
            Some(_) => {
                lexer.bump();
            }
            None => break,
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uid_and_flags() {
        let mut lexer = Lexer::new(b"(UID 100 FLAGS (\\Seen))");
        let items = parse_fetch_items(&mut lexer).unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], FetchItem::Uid(uid) if uid.get() == 100));
        assert!(matches!(&items[1], FetchItem::Flags(f) if f.is_seen()));
    }

    #[test]
    fn uid_zero_rejected() {
        let mut lexer = Lexer::new(b"(UID 0)");
        assert!(parse_fetch_items(&mut lexer).is_err());
    }

    #[test]
    fn body_section_with_literal() {
        let mut lexer = Lexer::new(b"(BODY[HEADER] {14}\r\nSubject: x\r\n\r\n)");
        let items = parse_fetch_items(&mut lexer).unwrap();
        match &items[0] {
            FetchItem::Body { section, data, .. } => {
                assert_eq!(section.as_deref(), Some("HEADER"));
                assert_eq!(data.as_deref(), Some(b"Subject: x\r\n\r\n".as_slice()));
            }
            other => panic!("expected body item, got {other:?}"),
        }
    }

    #[test]
    fn rfc822_header_normalised_to_header_section() {
        let mut lexer = Lexer::new(b"(RFC822.HEADER {4}\r\nA: b)");
        let items = parse_fetch_items(&mut lexer).unwrap();
        assert!(items[0].section_data("HEADER").is_some());
    }

    #[test]
    fn nil_body_yields_none() {
        let mut lexer = Lexer::new(b"(BODY[TEXT] NIL)");
        let items = parse_fetch_items(&mut lexer).unwrap();
        assert!(matches!(&items[0], FetchItem::Body { data: None, .. }));
    }

    #[test]
    fn partial_origin_parsed() {
        let mut lexer = Lexer::new(b"(BODY[TEXT]<128> {2}\r\nok)");
        let items = parse_fetch_items(&mut lexer).unwrap();
        assert!(matches!(
            &items[0],
            FetchItem::Body {
                origin: Some(128),
                ..
            }
        ));
    }

    #[test]
    fn envelope_round_trip() {
        let raw = b"((\"Mon, 1 Jan 2024 10:00:00 +0000\" \"Hello\" \
            ((\"Ann\" NIL \"ann\" \"example.com\")) \
            ((\"Ann\" NIL \"ann\" \"example.com\")) \
            NIL ((NIL NIL \"bob\" \"example.org\")) NIL NIL NIL \"<id@x>\"))";
        // Wrap in FETCH-items shape to exercise the ENVELOPE path
        let mut input = b"(ENVELOPE ".to_vec();
        input.extend_from_slice(&raw[1..raw.len() - 1]);
        input.push(b')');

        let mut lexer = Lexer::new(&input);
        let items = parse_fetch_items(&mut lexer).unwrap();
        match &items[0] {
            FetchItem::Envelope(env) => {
                assert_eq!(env.subject.as_deref(), Some("Hello"));
                assert_eq!(env.from[0].email().as_deref(), Some("ann@example.com"));
                assert_eq!(env.to[0].email().as_deref(), Some("bob@example.org"));
                assert_eq!(env.message_id.as_deref(), Some("<id@x>"));
            }
            other => panic!("expected envelope, got {other:?}"),
        }
    }

    #[test]
    fn multipart_body_structure() {
        let raw = b"(BODYSTRUCTURE ((\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"7BIT\" 2 1)\
            (\"TEXT\" \"HTML\" (\"CHARSET\" \"UTF-8\") NIL NIL \"QUOTED-PRINTABLE\" 9 1) \"ALTERNATIVE\"))";
        let mut lexer = Lexer::new(raw);
        let items = parse_fetch_items(&mut lexer).unwrap();
        match &items[0] {
            FetchItem::BodyStructure(BodyStructure::Multipart { parts, subtype }) => {
                assert_eq!(subtype, "ALTERNATIVE");
                assert_eq!(parts.len(), 2);
                assert!(matches!(
                    &parts[1],
                    BodyStructure::Part { media_subtype, .. } if media_subtype == "HTML"
                ));
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn unknown_items_skipped() {
        let mut lexer = Lexer::new(b"(X-GM-MSGID 1278455344230334865 UID 5)");
        let items = parse_fetch_items(&mut lexer).unwrap();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], FetchItem::Uid(uid) if uid.get() == 5));
    }
}
