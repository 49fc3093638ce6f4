//! Materialised messages.
//!
//! A [`Message`] is built from FETCH items: UID, flags, the header
//! block, and optionally the body. The MIME tree is walked once; each
//! leaf lands either in the bodies map or in the attachment list, never
//! both.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use mailhaven_imap::parser::FetchItem;
use mailhaven_imap::types::{FlagSet, MsgSeq, Uid};
use mailhaven_mime::{Address, Disposition, Entity, Headers, parse_address_list, parse_date};

use crate::attachment::Attachment;
use crate::error::{Error, Result};

/// Which rendered body a part contributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BodyKind {
    /// `text/plain`.
    Text,
    /// `text/html`.
    Html,
}

/// One materialised message.
#[derive(Debug)]
pub struct Message {
    /// UID within the folder's UIDVALIDITY epoch.
    pub uid: Option<Uid>,
    /// Message sequence number at fetch time.
    pub msgno: Option<MsgSeq>,
    /// Flags as last reported.
    pub flags: FlagSet,
    /// Decoded headers.
    pub headers: Headers,
    /// Decoded subject.
    pub subject: Option<String>,
    /// Parsed Date header; `None` when absent or unparseable.
    pub date: Option<DateTime<FixedOffset>>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header, angle brackets stripped.
    pub message_id: Option<String>,
    /// Rendered bodies keyed by kind.
    bodies: BTreeMap<BodyKind, String>,
    /// Attachments in part order.
    pub attachments: Vec<Attachment>,
    /// Raw RFC 822 source, kept when the body was fetched.
    pub raw: Option<Vec<u8>>,
}

impl Message {
    /// Builds a message from the items of one FETCH response.
    ///
    /// `HEADER` and `TEXT` sections are spliced back into a full RFC 822
    /// source; a missing `TEXT` section materialises with empty bodies
    /// rather than failing.
    pub fn from_fetch(msgno: MsgSeq, items: &[FetchItem]) -> Result<Self> {
        let mut uid = None;
        let mut flags = FlagSet::new();
        let mut header_bytes: Option<&[u8]> = None;
        let mut text_bytes: Option<&[u8]> = None;
        let mut whole_bytes: Option<&[u8]> = None;

        for item in items {
            match item {
                FetchItem::Uid(u) => uid = Some(*u),
                FetchItem::Flags(f) => flags = f.clone(),
                FetchItem::Body {
                    section: None,
                    data: Some(data),
                    ..
                } => whole_bytes = Some(data),
                FetchItem::Body {
                    section: Some(section),
                    data: Some(data),
                    ..
                } => {
                    if section.eq_ignore_ascii_case("HEADER") {
                        header_bytes = Some(data);
                    } else if section.eq_ignore_ascii_case("TEXT") {
                        text_bytes = Some(data);
                    }
                }
                _ => {}
            }
        }

        let raw = match (whole_bytes, header_bytes, text_bytes) {
            (Some(whole), _, _) => whole.to_vec(),
            (None, Some(header), text) => splice(header, text),
            (None, None, Some(text)) => text.to_vec(),
            (None, None, None) => {
                return Err(Error::MessageContentFetching(format!(
                    "message {msgno} came back without header or body sections"
                )));
            }
        };

        let keep_raw = whole_bytes.is_some() || text_bytes.is_some();
        let mut message = Self::from_raw(&raw)?;
        message.msgno = Some(msgno);
        message.uid = uid;
        message.flags = flags;
        message.raw = keep_raw.then_some(raw);
        Ok(message)
    }

    /// Parses a complete RFC 822 message.
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        let entity = Entity::parse(raw)?;
        let headers = entity.headers.clone();

        let subject = headers.get("subject").map(ToString::to_string);
        let date = headers.get("date").and_then(parse_date);
        let from = address_header(&headers, "from");
        let sender = address_header(&headers, "sender");
        let reply_to = address_header(&headers, "reply-to");
        let to = address_header(&headers, "to");
        let cc = address_header(&headers, "cc");
        let bcc = address_header(&headers, "bcc");
        let in_reply_to = headers.get("in-reply-to").map(ToString::to_string);
        let message_id = headers
            .get("message-id")
            .map(|id| id.trim_matches(['<', '>']).to_string());

        let mut bodies = BTreeMap::new();
        let mut attachments = Vec::new();
        if !entity.raw_body().is_empty() || !entity.children.is_empty() {
            classify(&entity, &mut bodies, &mut attachments);
        }

        Ok(Self {
            uid: None,
            msgno: None,
            flags: FlagSet::new(),
            headers,
            subject,
            date,
            from,
            sender,
            reply_to,
            to,
            cc,
            bcc,
            in_reply_to,
            message_id,
            bodies,
            attachments,
            raw: None,
        })
    }

    /// The plain-text body, when one exists.
    #[must_use]
    pub fn text_body(&self) -> Option<&str> {
        self.bodies.get(&BodyKind::Text).map(String::as_str)
    }

    /// The HTML body, when one exists.
    #[must_use]
    pub fn html_body(&self) -> Option<&str> {
        self.bodies.get(&BodyKind::Html).map(String::as_str)
    }

    /// True when an HTML alternative was present.
    #[must_use]
    pub fn has_html_body(&self) -> bool {
        self.bodies.contains_key(&BodyKind::Html)
    }

    /// True when a plain-text body was present.
    #[must_use]
    pub fn has_text_body(&self) -> bool {
        self.bodies.contains_key(&BodyKind::Text)
    }

    /// The richest displayable body: HTML when present, else text.
    #[must_use]
    pub fn primary_body(&self) -> Option<&str> {
        self.html_body().or_else(|| self.text_body())
    }

    /// Looks up an inline attachment by `cid:` reference.
    ///
    /// Used when rendering `multipart/related` HTML with embedded
    /// images.
    #[must_use]
    pub fn attachment_by_cid(&self, cid: &str) -> Option<&Attachment> {
        let wanted = cid.strip_prefix("cid:").unwrap_or(cid);
        self.attachments
            .iter()
            .find(|a| a.content_id.as_deref() == Some(wanted))
    }

    /// True when any attachment is present.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

fn address_header(headers: &Headers, name: &str) -> Vec<Address> {
    headers
        .get(name)
        .map(parse_address_list)
        .unwrap_or_default()
}

/// Rejoins `BODY[HEADER]` and `BODY[TEXT]` sections into one source.
fn splice(header: &[u8], text: Option<&[u8]>) -> Vec<u8> {
    let mut raw = header.to_vec();
    if !raw.ends_with(b"\r\n\r\n") {
        if !raw.ends_with(b"\r\n") {
            raw.extend_from_slice(b"\r\n");
        }
        raw.extend_from_slice(b"\r\n");
    }
    if let Some(text) = text {
        raw.extend_from_slice(text);
    }
    raw
}

/// Sorts every MIME leaf into bodies or attachments.
///
/// A displayable text part with no attachment disposition and no file
/// name renders as a body; everything else is an attachment, including
/// parts without a disposition that still carry a name.
fn classify(root: &Entity, bodies: &mut BTreeMap<BodyKind, String>, attachments: &mut Vec<Attachment>) {
    for leaf in root.leaves() {
        let kind = if leaf.content_type.is("text", "plain") {
            Some(BodyKind::Text)
        } else if leaf.content_type.is("text", "html") {
            Some(BodyKind::Html)
        } else {
            None
        };

        let is_attachment_disposition = matches!(
            leaf.disposition(),
            Some(Disposition::Attachment | Disposition::Other(_))
        );

        match kind {
            Some(kind) if !is_attachment_disposition && leaf.filename().is_none() => {
                let text = leaf.text().unwrap_or_default();
                bodies
                    .entry(kind)
                    .and_modify(|existing| {
                        existing.push('\n');
                        existing.push_str(&text);
                    })
                    .or_insert(text);
            }
            _ => attachments.push(Attachment::from_entity(leaf)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mailhaven_imap::parser::FetchItem;

    use super::*;

    fn fetch_message(items: Vec<FetchItem>) -> Message {
        Message::from_fetch(MsgSeq::new(1).unwrap(), &items).unwrap()
    }

    fn header_item(data: &[u8]) -> FetchItem {
        FetchItem::Body {
            section: Some("HEADER".to_string()),
            origin: None,
            data: Some(data.to_vec()),
        }
    }

    fn text_item(data: &[u8]) -> FetchItem {
        FetchItem::Body {
            section: Some("TEXT".to_string()),
            origin: None,
            data: Some(data.to_vec()),
        }
    }

    #[test]
    fn plain_text_fetch() {
        let message = fetch_message(vec![
            FetchItem::Uid(Uid::new(101).unwrap()),
            header_item(b"Subject: Nuu\r\nFrom: from@here.com\r\nTo: to@here.com\r\n"),
            text_item(b"Hi"),
        ]);

        assert_eq!(message.subject.as_deref(), Some("Nuu"));
        assert_eq!(message.text_body(), Some("Hi"));
        assert!(!message.has_html_body());
        assert!(message.date.is_none());
        assert_eq!(message.from[0].email(), "from@here.com");
        assert_eq!(message.to[0].email(), "to@here.com");
        assert_eq!(message.uid.map(Uid::get), Some(101));
    }

    #[test]
    fn header_only_fetch_has_no_bodies() {
        let message = fetch_message(vec![header_item(
            b"Subject: peek\r\nFrom: a@b\r\n",
        )]);
        assert!(!message.has_text_body());
        assert!(!message.has_attachments());
        assert!(message.raw.is_none());
    }

    #[test]
    fn missing_sections_are_an_error() {
        let result = Message::from_fetch(
            MsgSeq::new(1).unwrap(),
            &[FetchItem::Uid(Uid::new(1).unwrap())],
        );
        assert!(matches!(result, Err(Error::MessageContentFetching(_))));
    }

    #[test]
    fn alternative_bodies_and_primary() {
        let header = b"Subject: alt\r\nContent-Type: multipart/alternative; boundary=sep\r\n";
        let body = b"--sep\r\n\
            Content-Type: text/plain\r\n\r\n\
            plain\r\n\
            --sep\r\n\
            Content-Type: text/html\r\n\r\n\
            <b>rich</b>\r\n\
            --sep--\r\n";
        let message = fetch_message(vec![header_item(header), text_item(body)]);

        assert_eq!(message.text_body(), Some("plain"));
        assert_eq!(message.html_body(), Some("<b>rich</b>"));
        assert_eq!(message.primary_body(), Some("<b>rich</b>"));
        assert!(!message.has_attachments());
    }

    #[test]
    fn no_part_is_both_body_and_attachment() {
        let header =
            b"Subject: mixed\r\nContent-Type: multipart/mixed; boundary=sep\r\n";
        let body = b"--sep\r\n\
            Content-Type: text/plain\r\n\r\n\
            the body\r\n\
            --sep\r\n\
            Content-Type: text/plain; name=\"notes.txt\"\r\n\r\n\
            attached notes\r\n\
            --sep--\r\n";
        let message = fetch_message(vec![header_item(header), text_item(body)]);

        // The named text part is an attachment, not a second body
        assert_eq!(message.text_body(), Some("the body"));
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(
            message.attachments[0].filename().as_deref(),
            Some("notes.txt")
        );
    }

    #[test]
    fn inline_image_resolves_by_cid() {
        let header =
            b"Subject: related\r\nContent-Type: multipart/related; boundary=sep\r\n";
        let body = b"--sep\r\n\
            Content-Type: text/html\r\n\r\n\
            <img src=\"cid:logo@local\">\r\n\
            --sep\r\n\
            Content-Type: image/png\r\n\
            Content-ID: <logo@local>\r\n\
            Content-Disposition: inline; filename=\"logo.png\"\r\n\r\n\
            PNGBYTES\r\n\
            --sep--\r\n";
        let message = fetch_message(vec![header_item(header), text_item(body)]);

        assert!(message.has_html_body());
        let inline = message.attachment_by_cid("cid:logo@local").unwrap();
        assert_eq!(inline.content(), b"PNGBYTES");
    }

    #[test]
    fn date_and_message_id_parsing() {
        let message = fetch_message(vec![header_item(
            b"Subject: dated\r\n\
              Date: Mon, 1 Jan 2024 10:30:00 +0100\r\n\
              Message-ID: <abc@example.com>\r\n",
        )]);
        assert!(message.date.is_some());
        assert_eq!(message.message_id.as_deref(), Some("abc@example.com"));
    }

    #[test]
    fn unparseable_date_is_none_not_error() {
        let message = fetch_message(vec![header_item(
            b"Subject: x\r\nDate: not a real date\r\n",
        )]);
        assert!(message.date.is_none());
    }
}
