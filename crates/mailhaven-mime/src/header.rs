//! Ordered header multimap with RFC 2047 decoding.

use crate::encoding::decode_encoded_words;

/// Message or part headers.
///
/// Names keep their original casing and the order the server sent them;
/// lookups are case-insensitive. Values are unfolded and decoded to
/// UTF-8 at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, keeping earlier values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for the name, case-insensitive.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for the name, in arrival order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over `(name, value)` pairs in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a raw header block.
    ///
    /// Folded continuation lines (leading SP/HT) are joined with a single
    /// space; encoded-words in values are decoded. Parsing is total: a
    /// line without a colon is skipped rather than failing the block.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.split("\r\n").flat_map(|l| l.split('\n')) {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.append(name, decode_encoded_words(value.trim()));
            }
            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if let Some((name, value)) = current {
            headers.append(name, decode_encoded_words(value.trim()));
        }

        headers
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = std::vec::IntoIter<(&'a str, &'a str)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_lookup() {
        let raw = b"From: a@example.com\r\nTo: b@example.com\r\nSubject: Nuu\r\n\r\nbody";
        let headers = Headers::parse(raw);
        assert_eq!(headers.get("subject"), Some("Nuu"));
        assert_eq!(headers.get("FROM"), Some("a@example.com"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn unfolds_continuations() {
        let raw = b"Content-Type: text/plain;\r\n charset=utf-8\r\n\r\n";
        let headers = Headers::parse(raw);
        assert_eq!(
            headers.get("content-type"),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn decodes_encoded_words_in_values() {
        let raw = b"Subject: =?UTF-8?B?SMOpbGxv?=\r\n\r\n";
        let headers = Headers::parse(raw);
        assert_eq!(headers.get("subject"), Some("Héllo"));
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let raw = b"Received: one\r\nReceived: two\r\nFrom: x@y\r\n\r\n";
        let headers = Headers::parse(raw);
        assert_eq!(headers.get_all("received"), vec!["one", "two"]);
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Received", "Received", "From"]);
    }

    #[test]
    fn tolerates_bare_lf_and_junk_lines() {
        let raw = b"From: a@b\nno colon here\nTo: c@d\n\n";
        let headers = Headers::parse(raw);
        assert_eq!(headers.get("from"), Some("a@b"));
        assert_eq!(headers.get("to"), Some("c@d"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn empty_block() {
        assert!(Headers::parse(b"\r\n").is_empty());
        assert!(Headers::parse(b"").is_empty());
    }
}
