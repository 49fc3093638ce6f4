//! Attachment model over MIME leaf parts.

use std::sync::OnceLock;

use sha2::{Digest, Sha256};

use mailhaven_mime::{Disposition, Entity, TransferEncoding};

/// A non-body message part.
///
/// Content is decoded lazily on first access and cached.
#[derive(Debug)]
pub struct Attachment {
    /// Dotted MIME part path like `1.2.1`.
    pub part_number: String,
    /// `type/subtype` string.
    pub content_type: String,
    /// Content-Disposition, when the part carried one.
    pub disposition: Option<Disposition>,
    /// Raw name as transmitted (already RFC 2047-decoded).
    pub name: Option<String>,
    /// Content-ID with angle brackets stripped.
    pub content_id: Option<String>,
    /// Content-Description header.
    pub description: Option<String>,
    transfer_encoding: TransferEncoding,
    raw: Vec<u8>,
    decoded: OnceLock<Vec<u8>>,
}

impl Attachment {
    /// Builds an attachment from a MIME leaf.
    #[must_use]
    pub fn from_entity(entity: &Entity) -> Self {
        let part_number = if entity.part_number.is_empty() {
            "1".to_string()
        } else {
            entity.part_number.clone()
        };

        Self {
            part_number,
            content_type: format!(
                "{}/{}",
                entity.content_type.main_type, entity.content_type.sub_type
            ),
            disposition: entity.disposition(),
            name: entity.filename(),
            content_id: entity.content_id(),
            description: entity.content_description().map(ToString::to_string),
            transfer_encoding: entity.transfer_encoding(),
            raw: entity.raw_body().to_vec(),
            decoded: OnceLock::new(),
        }
    }

    /// Decoded content bytes.
    ///
    /// Decoding happens once; a payload that fails to decode is exposed
    /// verbatim rather than erroring on every access.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        self.decoded.get_or_init(|| {
            mailhaven_mime::encoding::decode_transfer(self.transfer_encoding, &self.raw)
                .unwrap_or_else(|_| self.raw.clone())
        })
    }

    /// Decoded size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content().len()
    }

    /// Stable identity: the Content-ID when present, otherwise a SHA-256
    /// over the decoded content.
    #[must_use]
    pub fn id(&self) -> String {
        self.content_id.clone().unwrap_or_else(|| {
            let digest = Sha256::digest(self.content());
            digest.iter().map(|b| format!("{b:02x}")).collect()
        })
    }

    /// File name with path separators and control characters removed.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.name.as_deref().map(sanitize_filename)
    }

    /// Extension inferred from the file name, else from the MIME type.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        if let Some(name) = &self.name
            && let Some((_, ext)) = name.rsplit_once('.')
            && !ext.is_empty()
            && ext.len() <= 10
        {
            return Some(ext.to_ascii_lowercase());
        }
        extension_for_type(&self.content_type).map(ToString::to_string)
    }
}

impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Attachment {}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    // A name like "../../etc/passwd" must not escape a download dir
    cleaned.replace("..", "_")
}

fn extension_for_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "application/pdf" => Some("pdf"),
        "application/zip" => Some("zip"),
        "application/msword" => Some("doc"),
        "application/vnd.ms-excel" => Some("xls"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some("xlsx"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "text/plain" => Some("txt"),
        "text/html" => Some("html"),
        "text/calendar" => Some("ics"),
        "message/rfc822" => Some("eml"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entity(raw: &[u8]) -> Entity {
        Entity::parse(raw).unwrap()
    }

    #[test]
    fn base64_content_is_lazily_decoded() {
        let raw = b"Content-Type: application/pdf; name=\"doc.pdf\"\r\n\
            Content-Transfer-Encoding: base64\r\n\r\n\
            JVBERi0xLjQ=";
        let attachment = Attachment::from_entity(&entity(raw));
        assert_eq!(attachment.content(), b"%PDF-1.4");
        assert_eq!(attachment.size(), 8);
    }

    #[test]
    fn id_prefers_content_id() {
        let raw = b"Content-Type: image/png\r\nContent-ID: <img1@local>\r\n\r\nx";
        let attachment = Attachment::from_entity(&entity(raw));
        assert_eq!(attachment.id(), "img1@local");
    }

    #[test]
    fn id_hash_is_stable_without_content_id() {
        let raw = b"Content-Type: application/octet-stream\r\n\r\npayload";
        let a = Attachment::from_entity(&entity(raw));
        let b = Attachment::from_entity(&entity(raw));
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().len(), 64);
        assert_eq!(a, b);
    }

    #[test]
    fn extension_from_name_then_type() {
        let raw = b"Content-Type: application/vnd.ms-excel; name=\"report.XLS\"\r\n\r\nx";
        let attachment = Attachment::from_entity(&entity(raw));
        assert_eq!(attachment.extension().as_deref(), Some("xls"));

        let raw = b"Content-Type: application/pdf\r\n\r\nx";
        let attachment = Attachment::from_entity(&entity(raw));
        assert_eq!(attachment.extension().as_deref(), Some("pdf"));
    }

    #[test]
    fn filename_is_sanitized() {
        let raw = b"Content-Type: text/plain; name=\"../../etc/passwd\"\r\n\r\nx";
        let attachment = Attachment::from_entity(&entity(raw));
        let name = attachment.filename().unwrap();
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
    }

    #[test]
    fn undecodable_base64_falls_back_to_raw() {
        let raw = b"Content-Type: application/octet-stream\r\n\
            Content-Transfer-Encoding: base64\r\n\r\n\
            !!not base64!!";
        let attachment = Attachment::from_entity(&entity(raw));
        assert_eq!(attachment.content(), b"!!not base64!!");
    }
}
