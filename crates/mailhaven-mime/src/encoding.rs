//! Transfer encodings and RFC 2047 encoded-words.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::charset;
use crate::error::{Error, Result};

/// Content-Transfer-Encoding values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// 7-bit ASCII lines.
    #[default]
    SevenBit,
    /// 8-bit lines.
    EightBit,
    /// Arbitrary bytes, no line structure.
    Binary,
    /// Base64.
    Base64,
    /// Quoted-printable.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses a header value; unknown names fall back to 7bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "binary" => Self::Binary,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            _ => Self::SevenBit,
        }
    }
}

impl std::fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        };
        write!(f, "{name}")
    }
}

/// Decodes a base64 payload, ignoring embedded whitespace.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes bytes as base64 (used by tests and APPEND fixtures).
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes quoted-printable body text (RFC 2045 §6.7).
///
/// Lenient: a malformed escape is kept literally instead of failing the
/// part, matching what mail readers do in practice.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'=' => {
                match data.get(i + 1..i + 3) {
                    // Soft line break: =CRLF or =LF
                    Some([b'\r', b'\n']) => i += 3,
                    Some([b'\n', _]) => i += 2,
                    Some(pair) => {
                        if let Ok(byte) = u8::from_str_radix(&String::from_utf8_lossy(pair), 16) {
                            out.push(byte);
                            i += 3;
                        } else {
                            out.push(b'=');
                            i += 1;
                        }
                    }
                    None => {
                        // "=\n" at end, or a dangling "="
                        if data.get(i + 1) == Some(&b'\n') {
                            i += 2;
                        } else {
                            out.push(b'=');
                            i += 1;
                        }
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    out
}

/// Decodes a body according to its transfer encoding.
pub fn decode_transfer(encoding: TransferEncoding, body: &[u8]) -> Result<Vec<u8>> {
    match encoding {
        TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(body)),
        TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(body)),
        TransferEncoding::SevenBit | TransferEncoding::EightBit | TransferEncoding::Binary => {
            Ok(body.to_vec())
        }
    }
}

/// Decodes RFC 2047 encoded-words inside a header value.
///
/// Handles `=?charset?Q?...?=` and `=?charset?B?...?=` anywhere in the
/// value, drops the whitespace between two adjacent encoded-words, and
/// leaves malformed candidates untouched.
#[must_use]
pub fn decode_encoded_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut last_was_word = false;

    while let Some(start) = rest.find("=?") {
        let (plain, candidate) = rest.split_at(start);

        match parse_encoded_word(candidate) {
            Some((decoded, consumed)) => {
                // Whitespace between adjacent encoded-words is dropped
                if !(last_was_word && plain.chars().all(char::is_whitespace)) {
                    out.push_str(plain);
                }
                out.push_str(&decoded);
                rest = &candidate[consumed..];
                last_was_word = true;
            }
            None => {
                out.push_str(plain);
                out.push_str("=?");
                rest = &candidate[2..];
                last_was_word = false;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parses one `=?charset?enc?text?=` at the start of `input`.
///
/// Returns the decoded text and the byte length consumed.
fn parse_encoded_word(input: &str) -> Option<(String, usize)> {
    let inner = input.strip_prefix("=?")?;

    let charset_end = inner.find('?')?;
    let charset = &inner[..charset_end];

    let enc_part = &inner[charset_end + 1..];
    let enc_end = enc_part.find('?')?;
    let encoding = &enc_part[..enc_end];

    let text_part = &enc_part[enc_end + 1..];
    let text_end = text_part.find("?=")?;
    let text = &text_part[..text_end];

    // An encoded-word must not itself contain whitespace
    if charset.is_empty() || text.contains(' ') {
        return None;
    }

    // The charset may carry an RFC 2231 language tag: UTF-8*en
    let charset = charset.split('*').next().unwrap_or(charset);

    let bytes = match encoding {
        "B" | "b" => decode_base64(text).ok()?,
        "Q" | "q" => {
            let unspaced = text.replace('_', " ");
            decode_quoted_printable(unspaced.as_bytes())
        }
        _ => return None,
    };

    let decoded = charset::decode(charset, &bytes);
    let consumed = 2 + charset_end + 1 + enc_end + 1 + text_end + 2;
    Some((decoded, consumed))
}

/// Encodes a header value as one UTF-8 B-encoded word when needed.
pub fn encode_encoded_word(text: &str) -> Result<String> {
    if text.is_ascii() && !text.contains("=?") {
        return Ok(text.to_string());
    }
    if text.is_empty() {
        return Err(Error::InvalidEncoding("empty encoded-word".to_string()));
    }
    Ok(format!("=?UTF-8?B?{}?=", encode_base64(text.as_bytes())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn base64_with_line_breaks() {
        assert_eq!(decode_base64("SGVs\r\nbG8=").unwrap(), b"Hello");
    }

    #[test]
    fn quoted_printable_basics() {
        assert_eq!(decode_quoted_printable(b"plain text"), b"plain text");
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo"), "Héllo".as_bytes());
    }

    #[test]
    fn quoted_printable_soft_break() {
        assert_eq!(decode_quoted_printable(b"foo=\r\nbar"), b"foobar");
        assert_eq!(decode_quoted_printable(b"foo=\nbar"), b"foobar");
    }

    #[test]
    fn quoted_printable_keeps_bad_escapes() {
        assert_eq!(decode_quoted_printable(b"50=% off"), b"50=% off");
        assert_eq!(decode_quoted_printable(b"trailing="), b"trailing=");
    }

    #[test]
    fn encoded_word_base64() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn encoded_word_q_underscore_is_space() {
        assert_eq!(decode_encoded_words("=?utf-8?Q?a_b?="), "a b");
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn adjacent_words_lose_separating_whitespace() {
        let value = "=?UTF-8?B?SMOp?= =?UTF-8?B?bGxv?=";
        assert_eq!(decode_encoded_words(value), "Héllo");
    }

    #[test]
    fn mixed_plain_and_encoded() {
        let value = "Re: =?UTF-8?Q?gr=C3=BC=C3=9Fe?= from home";
        assert_eq!(decode_encoded_words(value), "Re: grüße from home");
    }

    #[test]
    fn malformed_word_left_alone() {
        assert_eq!(decode_encoded_words("=?broken"), "=?broken");
        assert_eq!(decode_encoded_words("price =? 100"), "price =? 100");
    }

    #[test]
    fn rfc2047_b_round_trip() {
        let original = "Prostřeno 2014 poslední volné termíny.xls";
        let encoded = encode_encoded_word(original).unwrap();
        assert!(encoded.starts_with("=?UTF-8?B?"));
        assert_eq!(decode_encoded_words(&encoded), original);
    }

    #[test]
    fn transfer_encoding_names() {
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("Quoted-Printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("bogus"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }
}
