//! Content-Type header values.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// A parsed `type/subtype; param=value` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Major type, lowercased (`text`, `image`, `multipart`, ...).
    pub main_type: String,
    /// Subtype, lowercased (`plain`, `html`, `mixed`, ...).
    pub sub_type: String,
    /// Parameters with lowercased keys; values keep their case.
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Builds a content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// The `text/plain; charset=us-ascii` default mandated by RFC 2045.
    #[must_use]
    pub fn default_text() -> Self {
        let mut ct = Self::new("text", "plain");
        ct.parameters
            .insert("charset".to_string(), "us-ascii".to_string());
        ct
    }

    /// Parses a header value.
    pub fn parse(value: &str) -> Result<Self> {
        let mut parts = value.split(';');

        let type_part = parts
            .next()
            .ok_or_else(|| Error::InvalidContentType("empty value".to_string()))?
            .trim();
        let (main_type, sub_type) = type_part
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("missing subtype in {type_part:?}")))?;

        let mut ct = Self::new(
            main_type.trim().to_ascii_lowercase(),
            sub_type.trim().to_ascii_lowercase(),
        );

        for param in parts {
            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim().to_ascii_lowercase();
                let value = unquote(value.trim());
                ct.parameters.insert(key, value);
            }
        }

        Ok(ct)
    }

    /// One parameter by lowercased key.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// The charset parameter.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// The boundary parameter.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// The name parameter, carried by attachment-bearing types.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameter("name")
    }

    /// True for any `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// True for `text/*`.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type == "text"
    }

    /// True when this is exactly `type/subtype`.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type) && self.sub_type.eq_ignore_ascii_case(sub_type)
    }
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map_or_else(
            || value.to_string(),
            |inner| inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        )
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.parameters {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn simple_value() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn case_normalisation() {
        let ct = ContentType::parse("Text/HTML; Charset=UTF-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "html");
        assert_eq!(ct.charset(), Some("UTF-8"));
    }

    #[test]
    fn quoted_boundary() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"--=_Part_42\"").unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("--=_Part_42"));
    }

    #[test]
    fn name_parameter() {
        let ct =
            ContentType::parse("application/vnd.ms-excel; name=\"report.xls\"").unwrap();
        assert_eq!(ct.name(), Some("report.xls"));
    }

    #[test]
    fn missing_subtype_rejected() {
        assert!(ContentType::parse("textplain").is_err());
    }

    #[test]
    fn rfc2045_default() {
        let ct = ContentType::default_text();
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.charset(), Some("us-ascii"));
    }
}
