//! Character set resolution and decoding to UTF-8.

use encoding_rs::Encoding;

/// Canonical aliases that `encoding_rs` does not resolve on its own.
///
/// Mail in the wild carries MIME names, vendor spellings, and outright
/// typos; the table maps the common offenders onto WHATWG labels.
const ALIASES: &[(&str, &str)] = &[
    ("ansi_x3.4-1968", "us-ascii"),
    ("ascii", "us-ascii"),
    ("cp1250", "windows-1250"),
    ("cp1251", "windows-1251"),
    ("cp1252", "windows-1252"),
    ("cp1254", "windows-1254"),
    ("cp932", "shift_jis"),
    ("cp936", "gbk"),
    ("cp950", "big5"),
    ("gb2312", "gbk"),
    ("iso8859-1", "iso-8859-1"),
    ("iso8859-2", "iso-8859-2"),
    ("iso8859-9", "iso-8859-9"),
    ("iso8859-15", "iso-8859-15"),
    ("ks_c_5601-1987", "euc-kr"),
    ("latin1", "iso-8859-1"),
    ("latin-1", "iso-8859-1"),
    ("unicode-1-1-utf-7", "utf-7"),
    ("utf8", "utf-8"),
];

/// Resolves a charset name to an encoding, or `None` when unknown.
#[must_use]
pub fn lookup(charset: &str) -> Option<&'static Encoding> {
    let name = charset.trim().trim_matches('"');
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map_or(name, |(_, target)| target);
    Encoding::for_label(canonical.as_bytes())
}

/// Decodes bytes in the named charset to UTF-8.
///
/// Unknown charsets fall back to UTF-8; undecodable sequences become
/// replacement characters rather than errors, since a single broken
/// header must not fail the whole message.
#[must_use]
pub fn decode(charset: &str, bytes: &[u8]) -> String {
    let encoding = lookup(charset).unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passthrough() {
        assert_eq!(decode("utf-8", "héllo".as_bytes()), "héllo");
        assert_eq!(decode("UTF8", "héllo".as_bytes()), "héllo");
    }

    #[test]
    fn latin1_aliases() {
        let bytes = b"caf\xe9";
        assert_eq!(decode("iso-8859-1", bytes), "café");
        assert_eq!(decode("latin1", bytes), "café");
        assert_eq!(decode("ISO8859-1", bytes), "café");
    }

    #[test]
    fn windows_codepages() {
        // 0x93/0x94 are curly quotes in cp1252
        assert_eq!(decode("cp1252", b"\x93x\x94"), "\u{201c}x\u{201d}");
    }

    #[test]
    fn korean_alias() {
        assert!(lookup("ks_c_5601-1987").is_some());
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode("x-klingon", b"ok"), "ok");
    }

    #[test]
    fn invalid_bytes_become_replacement() {
        let text = decode("utf-8", b"a\xffb");
        assert!(text.contains('\u{fffd}'));
    }
}
