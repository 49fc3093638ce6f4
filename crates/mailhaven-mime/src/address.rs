//! RFC 5322 address list parsing.

use crate::encoding::decode_encoded_words;

/// One mailbox address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name, decoded; `None` when the address stands alone.
    pub name: Option<String>,
    /// Local part before the `@`.
    pub mailbox: String,
    /// Domain after the `@`; empty for bare local names.
    pub host: String,
}

impl Address {
    /// Builds an address from its parts.
    #[must_use]
    pub fn new(name: Option<String>, mailbox: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name,
            mailbox: mailbox.into(),
            host: host.into(),
        }
    }

    /// The `local@host` form.
    #[must_use]
    pub fn email(&self) -> String {
        if self.host.is_empty() {
            self.mailbox.clone()
        } else {
            format!("{}@{}", self.mailbox, self.host)
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.email()),
            None => write!(f, "{}", self.email()),
        }
    }
}

/// Parses an address header value into a list.
///
/// Accepts `Name <a@b>`, `a@b`, `"Quoted Name" <a@b>`, comment forms
/// `a@b (Name)`, and groups `Team: a@b, c@d;` (flattened). Server order
/// is preserved. Unparseable items are skipped.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<Address> {
    let mut addresses = Vec::new();

    for item in split_top_level(value) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        // Group form: display-name ":" mailbox-list ";"
        if let Some((_, members)) = split_group(item) {
            addresses.extend(parse_address_list(members));
            continue;
        }

        if let Some(address) = parse_single(item) {
            addresses.push(address);
        }
    }

    addresses
}

/// Splits on commas that are not inside quotes, comments, or brackets.
fn split_top_level(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth_paren = 0u32;
    let mut depth_angle = 0u32;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth_paren += 1,
            ')' if !in_quotes => depth_paren = depth_paren.saturating_sub(1),
            '<' if !in_quotes => depth_angle += 1,
            '>' if !in_quotes => depth_angle = depth_angle.saturating_sub(1),
            ',' if !in_quotes && depth_paren == 0 && depth_angle == 0 => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&value[start..]);
    items
}

/// Detects `name : members ;` outside quotes; returns (name, members).
fn split_group(item: &str) -> Option<(&str, &str)> {
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in item.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            // A colon inside an angle-addr (route form) does not start a group
            '<' if !in_quotes => return None,
            ':' if !in_quotes => {
                let members = item[i + 1..].trim_end().trim_end_matches(';');
                return Some((item[..i].trim(), members));
            }
            _ => {}
        }
    }
    None
}

fn parse_single(item: &str) -> Option<Address> {
    // Angle form: [display-name] "<" addr-spec ">"
    if let Some(open) = find_unquoted(item, '<') {
        let close = item.rfind('>')?;
        let spec = item.get(open + 1..close)?.trim();
        let display = item[..open].trim();

        let name = if display.is_empty() {
            None
        } else {
            Some(decode_display_name(display))
        };
        let (mailbox, host) = split_spec(spec)?;
        return Some(Address::new(name, mailbox, host));
    }

    // Bare form, possibly with a trailing "(comment)" used as the name
    let (spec, comment) = strip_comment(item);
    let (mailbox, host) = split_spec(spec.trim())?;
    let name = comment.map(|c| decode_display_name(c.trim()));
    Some(Address::new(name, mailbox, host))
}

fn find_unquoted(item: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in item.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == target && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn strip_comment(item: &str) -> (&str, Option<&str>) {
    if let (Some(open), true) = (item.find('('), item.ends_with(')')) {
        let comment = &item[open + 1..item.len() - 1];
        (&item[..open], Some(comment))
    } else {
        (item, None)
    }
}

fn split_spec(spec: &str) -> Option<(String, String)> {
    // A trailing ';' appears when a group list was split on its commas
    let spec = spec.trim().trim_end_matches(';').trim_end();
    if spec.is_empty() {
        return None;
    }
    match spec.rsplit_once('@') {
        Some((local, host)) => {
            let local = local.trim().trim_matches('"');
            if local.is_empty() {
                None
            } else {
                Some((local.to_string(), host.trim().to_string()))
            }
        }
        None => Some((spec.to_string(), String::new())),
    }
}

fn decode_display_name(display: &str) -> String {
    let unquoted = display
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map_or_else(|| display.to_string(), |s| s.replace("\\\"", "\"").replace("\\\\", "\\"));
    decode_encoded_words(&unquoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address() {
        let list = parse_address_list("from@here.com");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].email(), "from@here.com");
        assert!(list[0].name.is_none());
    }

    #[test]
    fn named_address() {
        let list = parse_address_list("Ann Example <ann@example.com>");
        assert_eq!(list[0].name.as_deref(), Some("Ann Example"));
        assert_eq!(list[0].mailbox, "ann");
        assert_eq!(list[0].host, "example.com");
    }

    #[test]
    fn quoted_name_with_comma() {
        let list = parse_address_list("\"Example, Ann\" <ann@example.com>");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name.as_deref(), Some("Example, Ann"));
    }

    #[test]
    fn encoded_word_name() {
        let list = parse_address_list("=?UTF-8?B?SsO8cmdlbg==?= <j@example.de>");
        assert_eq!(list[0].name.as_deref(), Some("Jürgen"));
    }

    #[test]
    fn multiple_addresses_keep_order() {
        let list = parse_address_list("a@x.com, B <b@y.com>, c@z.com");
        let emails: Vec<_> = list.iter().map(Address::email).collect();
        assert_eq!(emails, vec!["a@x.com", "b@y.com", "c@z.com"]);
    }

    #[test]
    fn comment_becomes_name() {
        let list = parse_address_list("ann@example.com (Ann)");
        assert_eq!(list[0].name.as_deref(), Some("Ann"));
        assert_eq!(list[0].email(), "ann@example.com");
    }

    #[test]
    fn group_is_flattened() {
        let list = parse_address_list("Team: a@x.com, b@y.com;, solo@z.com");
        let emails: Vec<_> = list.iter().map(Address::email).collect();
        assert_eq!(emails, vec!["a@x.com", "b@y.com", "solo@z.com"]);
    }

    #[test]
    fn empty_group() {
        let list = parse_address_list("undisclosed-recipients:;");
        assert!(list.is_empty());
    }

    #[test]
    fn display_form() {
        let addr = Address::new(Some("Ann".to_string()), "ann", "example.com");
        assert_eq!(addr.to_string(), "Ann <ann@example.com>");
        let bare = Address::new(None, "bob", "example.org");
        assert_eq!(bare.to_string(), "bob@example.org");
    }

    #[test]
    fn garbage_is_skipped() {
        assert!(parse_address_list("").is_empty());
        assert!(parse_address_list(" , ,").is_empty());
    }
}
