//! Core IMAP types shared across the engine.

mod capability;
mod flags;
mod ids;
mod mailbox;
mod quota;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, FlagSet};
pub use ids::{MsgSeq, Tag, Uid, UidValidity};
pub use mailbox::{ListEntry, Mailbox, NameAttribute, SelectedState, StatusItem, StatusQuery};
pub use quota::{Quota, QuotaResource};
pub use response_code::ResponseCode;
pub use sequence::{SequenceSet, UidSet};
