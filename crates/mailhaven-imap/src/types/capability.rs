//! Server capabilities and tagged-response status.

/// Completion status of a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed for operational reasons.
    No,
    /// Command was rejected as malformed.
    Bad,
    /// Greeting for a pre-authenticated connection.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    /// Returns true for statuses that complete a command successfully.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// An advertised server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501).
    Imap4Rev1,
    /// IDLE (RFC 2177).
    Idle,
    /// ID (RFC 2971).
    Id,
    /// QUOTA (RFC 2087).
    Quota,
    /// UIDPLUS (RFC 4315).
    UidPlus,
    /// MOVE (RFC 6851).
    Move,
    /// LITERAL+ (RFC 7888).
    LiteralPlus,
    /// STARTTLS availability.
    StartTls,
    /// LOGIN is refused until the connection is secured.
    LoginDisabled,
    /// An AUTH= mechanism, e.g. `PLAIN` or `XOAUTH2`.
    Auth(String),
    /// Anything the engine does not interpret.
    Other(String),
}

impl Capability {
    /// Parses one capability atom.
    #[must_use]
    pub fn parse(atom: &str) -> Self {
        let upper = atom.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IDLE" => Self::Idle,
            "ID" => Self::Id,
            "QUOTA" => Self::Quota,
            "UIDPLUS" => Self::UidPlus,
            "MOVE" => Self::Move,
            "LITERAL+" => Self::LiteralPlus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ if upper.starts_with("AUTH=") => Self::Auth(atom[5..].to_string()),
            _ => Self::Other(atom.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Idle => write!(f, "IDLE"),
            Self::Id => write!(f, "ID"),
            Self::Quota => write!(f, "QUOTA"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::Move => write!(f, "MOVE"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("Idle"), Capability::Idle);
        assert_eq!(Capability::parse("STARTTLS"), Capability::StartTls);
    }

    #[test]
    fn auth_mechanism_keeps_name() {
        assert_eq!(
            Capability::parse("AUTH=XOAUTH2"),
            Capability::Auth("XOAUTH2".to_string())
        );
    }

    #[test]
    fn unknown_capability_preserved() {
        let cap = Capability::parse("X-GM-EXT-1");
        assert_eq!(cap, Capability::Other("X-GM-EXT-1".to_string()));
        assert_eq!(cap.to_string(), "X-GM-EXT-1");
    }

    #[test]
    fn status_ok_variants() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bad.is_ok());
    }
}
