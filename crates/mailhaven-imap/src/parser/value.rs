//! Typed token tree for IMAP response data.
//!
//! Generic consumers (ID, QUOTA, unknown FETCH items) read one [`Value`]
//! and pattern-match instead of indexing into untyped nested arrays.

use super::lexer::{Lexer, Token};
use crate::{Error, Result};

/// One parsed IMAP data value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A bare atom, e.g. `STORAGE` or `\Seen`.
    Atom(String),
    /// An unsigned number.
    Number(u32),
    /// A quoted string or decoded literal that is valid UTF-8.
    Text(String),
    /// A literal payload that is not UTF-8.
    Bytes(Vec<u8>),
    /// `NIL`.
    Nil,
    /// A parenthesised list, arbitrarily nested.
    List(Vec<Value>),
    /// A bracketed section like `HEADER.FIELDS (FROM TO)`, kept verbatim.
    Section(String),
}

impl Value {
    /// Reads the next value from the lexer, skipping leading spaces.
    pub fn read(lexer: &mut Lexer<'_>) -> Result<Self> {
        loop {
            match lexer.next_token()? {
                Token::Space => {}
                Token::Atom(s) => return Ok(Self::Atom(s.to_string())),
                Token::Number(n) => return Ok(Self::Number(n)),
                Token::QuotedString(s) => return Ok(Self::Text(s)),
                Token::Literal(data) => {
                    return Ok(String::from_utf8(data).map_or_else(
                        |err| Self::Bytes(err.into_bytes()),
                        Self::Text,
                    ));
                }
                Token::Nil => return Ok(Self::Nil),
                Token::LParen => return Self::read_list(lexer),
                Token::LBracket => return Self::read_section(lexer),
                token => {
                    return Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("expected value, got {token:?}"),
                    });
                }
            }
        }
    }

    fn read_list(lexer: &mut Lexer<'_>) -> Result<Self> {
        let mut items = Vec::new();
        loop {
            match lexer.peek() {
                Some(b')') => {
                    lexer.bump();
                    return Ok(Self::List(items));
                }
                Some(b' ') => {
                    lexer.bump();
                }
                None => {
                    return Err(Error::Parse {
                        position: lexer.position(),
                        message: "unterminated list".to_string(),
                    });
                }
                _ => items.push(Self::read(lexer)?),
            }
        }
    }

    fn read_section(lexer: &mut Lexer<'_>) -> Result<Self> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match lexer.bump() {
                Some(b']') if depth == 0 => return Ok(Self::Section(text)),
                Some(b'[') => {
                    depth += 1;
                    text.push('[');
                }
                Some(b']') => {
                    depth -= 1;
                    text.push(']');
                }
                Some(b) => text.push(b as char),
                None => {
                    return Err(Error::Parse {
                        position: lexer.position(),
                        message: "unterminated section".to_string(),
                    });
                }
            }
        }
    }

    /// Returns the textual content of an atom or string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Atom(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content of a number value.
    #[must_use]
    pub const fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the items of a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true for `NIL`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Interprets a list of alternating keys and values as pairs.
    ///
    /// This is the shape of ID parameter lists and QUOTA resource triples
    /// are derived from it. `NIL` yields an empty vector.
    #[must_use]
    pub fn as_pairs(&self) -> Option<Vec<(String, String)>> {
        match self {
            Self::Nil => Some(Vec::new()),
            Self::List(items) => {
                let mut pairs = Vec::with_capacity(items.len() / 2);
                for chunk in items.chunks(2) {
                    match chunk {
                        [k, v] => pairs.push((
                            k.as_str()?.to_string(),
                            v.as_str().map_or_else(
                                || v.as_number().map(|n| n.to_string()).unwrap_or_default(),
                                ToString::to_string,
                            ),
                        )),
                        _ => return None,
                    }
                }
                Some(pairs)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn read(input: &[u8]) -> Value {
        Value::read(&mut Lexer::new(input)).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(read(b"FOO"), Value::Atom("FOO".to_string()));
        assert_eq!(read(b"42"), Value::Number(42));
        assert_eq!(read(b"\"hi\""), Value::Text("hi".to_string()));
        assert_eq!(read(b"NIL"), Value::Nil);
    }

    #[test]
    fn literal_becomes_text_or_bytes() {
        assert_eq!(read(b"{2}\r\nhi"), Value::Text("hi".to_string()));
        assert_eq!(read(b"{2}\r\n\xff\xfe"), Value::Bytes(vec![0xff, 0xfe]));
    }

    #[test]
    fn nested_lists() {
        let value = read(b"(A (B 1) NIL)");
        let items = value.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Value::Atom("A".to_string()));
        assert_eq!(
            items[1],
            Value::List(vec![Value::Atom("B".to_string()), Value::Number(1)])
        );
        assert!(items[2].is_nil());
    }

    #[test]
    fn bracketed_section_kept_verbatim() {
        assert_eq!(
            read(b"[HEADER.FIELDS (FROM TO)]"),
            Value::Section("HEADER.FIELDS (FROM TO)".to_string())
        );
    }

    #[test]
    fn pairs_from_id_style_list() {
        let value = read(b"(\"name\" \"Dovecot\" \"version\" \"2.3\")");
        let pairs = value.as_pairs().unwrap();
        assert_eq!(pairs[0], ("name".to_string(), "Dovecot".to_string()));
        assert_eq!(pairs[1], ("version".to_string(), "2.3".to_string()));
        assert_eq!(Value::Nil.as_pairs().unwrap(), Vec::new());
    }

    #[test]
    fn unterminated_list_is_an_error() {
        assert!(Value::read(&mut Lexer::new(b"(A B")).is_err());
    }
}
