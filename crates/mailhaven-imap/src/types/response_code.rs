//! Bracketed response codes carried in OK/NO/BAD lines.

use super::capability::Capability;
use super::flags::Flag;
use super::ids::{MsgSeq, Uid, UidValidity};

/// A `[CODE ...]` annotation on a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: the text must be shown to the user.
    Alert,
    /// Capabilities included in the greeting or completion.
    Capability(Vec<Capability>),
    /// Message parsing trouble on the server side.
    Parse,
    /// Flags the client may change permanently.
    PermanentFlags(Vec<Flag>),
    /// Mailbox opened read-only.
    ReadOnly,
    /// Mailbox opened read-write.
    ReadWrite,
    /// Target mailbox does not exist but may be created.
    TryCreate,
    /// Predicted next UID.
    UidNext(Uid),
    /// UIDVALIDITY epoch of the selected mailbox.
    UidValidity(UidValidity),
    /// First unseen message.
    Unseen(MsgSeq),
    /// UID assigned by APPEND (RFC 4315).
    AppendUid {
        /// Epoch of the target mailbox.
        validity: UidValidity,
        /// UID of the stored message.
        uid: Uid,
    },
    /// Anything the engine does not interpret.
    Other(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn append_uid_fields() {
        let code = ResponseCode::AppendUid {
            validity: UidValidity::new(38_505).unwrap(),
            uid: Uid::new(3955).unwrap(),
        };
        if let ResponseCode::AppendUid { validity, uid } = code {
            assert_eq!(validity.get(), 38_505);
            assert_eq!(uid.get(), 3955);
        } else {
            panic!("expected AppendUid");
        }
    }
}
