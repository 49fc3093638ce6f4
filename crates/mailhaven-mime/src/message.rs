//! RFC 822 message structure: header block plus a MIME part tree.

use crate::charset;
use crate::content_type::ContentType;
use crate::encoding::{TransferEncoding, decode_transfer};
use crate::error::Result;
use crate::header::Headers;

/// Content-Disposition kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// `attachment`.
    Attachment,
    /// `inline`.
    Inline,
    /// Any other token, verbatim.
    Other(String),
}

impl Disposition {
    fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "attachment" => Self::Attachment,
            "inline" => Self::Inline,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One node of the MIME tree: the whole message or a nested part.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Dotted IMAP part number; empty for the message itself.
    pub part_number: String,
    /// Headers of this entity.
    pub headers: Headers,
    /// Parsed Content-Type, defaulted per RFC 2045 when absent.
    pub content_type: ContentType,
    /// Child parts for multipart entities.
    pub children: Vec<Entity>,
    body: Vec<u8>,
}

impl Entity {
    /// Parses a complete RFC 822 message.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_at(raw, String::new())
    }

    fn parse_at(raw: &[u8], part_number: String) -> Result<Self> {
        let (head, body) = split_head_body(raw);
        let headers = Headers::parse(head);
        let content_type = headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(ContentType::default_text);

        let mut entity = Self {
            part_number,
            headers,
            content_type,
            children: Vec::new(),
            body: body.to_vec(),
        };

        if entity.content_type.is_multipart() {
            let boundary = entity
                .content_type
                .boundary()
                .ok_or(crate::error::Error::MissingBoundary)?
                .to_string();

            for (index, part) in split_multipart(&entity.body, &boundary).into_iter().enumerate() {
                let child_number = if entity.part_number.is_empty() {
                    format!("{}", index + 1)
                } else {
                    format!("{}.{}", entity.part_number, index + 1)
                };
                entity.children.push(Self::parse_at(&part, child_number)?);
            }
        }

        Ok(entity)
    }

    /// Raw body bytes, still transfer-encoded.
    #[must_use]
    pub fn raw_body(&self) -> &[u8] {
        &self.body
    }

    /// The declared transfer encoding, defaulting to 7bit.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or_else(TransferEncoding::default, TransferEncoding::parse)
    }

    /// Body bytes with the transfer encoding undone.
    pub fn decoded_body(&self) -> Result<Vec<u8>> {
        decode_transfer(self.transfer_encoding(), &self.body)
    }

    /// Decoded body as UTF-8 text, converted from the declared charset.
    pub fn text(&self) -> Result<String> {
        let bytes = self.decoded_body()?;
        let cs = self.content_type.charset().unwrap_or("utf-8");
        Ok(charset::decode(cs, &bytes))
    }

    /// The Content-Disposition kind, if any.
    #[must_use]
    pub fn disposition(&self) -> Option<Disposition> {
        let value = self.headers.get("content-disposition")?;
        let token = value.split(';').next()?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Disposition::parse(token))
        }
    }

    /// `filename=` from Content-Disposition, unquoted.
    #[must_use]
    pub fn disposition_filename(&self) -> Option<String> {
        let value = self.headers.get("content-disposition")?;
        value.split(';').skip(1).find_map(|param| {
            let (key, val) = param.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("filename") {
                Some(unquote(val.trim()))
            } else {
                None
            }
        })
    }

    /// Best-effort file name: disposition `filename=`, else type `name=`.
    ///
    /// Values were RFC 2047-decoded with the rest of the headers.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.disposition_filename()
            .or_else(|| self.content_type.name().map(ToString::to_string))
            .filter(|name| !name.is_empty())
    }

    /// Content-ID with the angle brackets stripped.
    #[must_use]
    pub fn content_id(&self) -> Option<String> {
        let id = self.headers.get("content-id")?.trim();
        let id = id.strip_prefix('<').unwrap_or(id);
        let id = id.strip_suffix('>').unwrap_or(id);
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    /// Content-Description header.
    #[must_use]
    pub fn content_description(&self) -> Option<&str> {
        self.headers.get("content-description")
    }

    /// True for `multipart/*` entities.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.content_type.is_multipart()
    }

    /// Leaf parts in reading order; a non-multipart entity is its own
    /// single leaf.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Entity> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Entity>) {
        if self.children.is_empty() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map_or_else(|| value.to_string(), ToString::to_string)
}

/// Splits a raw entity into header block and body.
fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = find(raw, b"\r\n\r\n") {
        (&raw[..pos + 2], &raw[pos + 4..])
    } else if let Some(pos) = find(raw, b"\n\n") {
        (&raw[..pos + 1], &raw[pos + 2..])
    } else {
        (raw, &[])
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Splits a multipart body into its parts.
///
/// Sections before the first delimiter (the preamble) and after the
/// closing delimiter (the epilogue) are discarded. Line endings inside
/// parts are normalised to CRLF.
fn split_multipart(body: &[u8], boundary: &str) -> Vec<Vec<u8>> {
    let delimiter = format!("--{boundary}");
    let closing = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    for line in split_lines(body) {
        let trimmed = trim_cr(line);
        if trimmed == closing.as_bytes() {
            if let Some(part) = current.take() {
                parts.push(part);
            }
            break;
        }
        if trimmed == delimiter.as_bytes() {
            if let Some(part) = current.take() {
                parts.push(part);
            }
            current = Some(Vec::new());
            continue;
        }
        if let Some(part) = current.as_mut() {
            if !part.is_empty() {
                part.extend_from_slice(b"\r\n");
            }
            part.extend_from_slice(trimmed);
        }
    }

    // Unterminated final part: keep what we have
    if let Some(part) = current.take() {
        parts.push(part);
    }

    parts
}

fn split_lines(body: &[u8]) -> impl Iterator<Item = &[u8]> {
    body.split(|&b| b == b'\n')
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
