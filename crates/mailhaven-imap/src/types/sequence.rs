//! Sequence sets addressing messages by MSN or UID.

use super::ids::{MsgSeq, Uid};

/// A `sequence-set` argument for FETCH/STORE/COPY/MOVE/SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// A single number.
    Single(MsgSeq),
    /// An inclusive range.
    Range(MsgSeq, MsgSeq),
    /// From a number to the end of the mailbox (`n:*`).
    RangeFrom(MsgSeq),
    /// The highest-numbered message (`*`).
    All,
    /// A comma-joined list of the above.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Single number, rejecting zero.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        MsgSeq::new(n).map(Self::Single)
    }

    /// Inclusive range, rejecting zero endpoints.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(MsgSeq::new(start)?, MsgSeq::new(end)?))
    }

    /// Builds the most compact set covering the given numbers.
    ///
    /// Consecutive runs collapse into ranges, so `[1,2,3,7]` becomes `1:3,7`.
    /// Zeroes are skipped. Returns `None` for an empty input.
    #[must_use]
    pub fn from_numbers(numbers: &[u32]) -> Option<Self> {
        let mut items: Vec<Self> = Vec::new();
        let mut run: Option<(u32, u32)> = None;

        for &n in numbers {
            if n == 0 {
                continue;
            }
            match run {
                Some((start, end)) if n == end + 1 => run = Some((start, n)),
                Some((start, end)) => {
                    items.extend(Self::run(start, end));
                    run = Some((n, n));
                }
                None => run = Some((n, n)),
            }
        }
        if let Some((start, end)) = run {
            items.extend(Self::run(start, end));
        }

        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Self::Set(items)),
        }
    }

    fn run(start: u32, end: u32) -> Option<Self> {
        if start == end {
            Self::single(start)
        } else {
            Self::range(start, end)
        }
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                let parts: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

/// A set of UIDs for the `UID` command variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// A single UID.
    Single(Uid),
    /// An inclusive range.
    Range(Uid, Uid),
    /// From a UID to the highest assigned (`n:*`).
    RangeFrom(Uid),
    /// All messages.
    All,
    /// A comma-joined list.
    Set(Vec<Self>),
}

impl UidSet {
    /// A set holding one UID.
    #[must_use]
    pub const fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// An inclusive UID range.
    #[must_use]
    pub const fn range(start: Uid, end: Uid) -> Self {
        Self::Range(start, end)
    }

    /// Compact set from raw UID values; zeroes skipped, `None` when empty.
    #[must_use]
    pub fn from_numbers(numbers: &[u32]) -> Option<Self> {
        SequenceSet::from_numbers(numbers).map(|s| Self::from_sequence_set(&s))
    }

    fn from_sequence_set(set: &SequenceSet) -> Self {
        // MsgSeq and Uid both wrap NonZeroU32, so the conversion cannot fail
        match set {
            SequenceSet::Single(n) => Self::Single(Uid::new(n.get()).unwrap_or_else(|| unreachable!())),
            SequenceSet::Range(a, b) => Self::Range(
                Uid::new(a.get()).unwrap_or_else(|| unreachable!()),
                Uid::new(b.get()).unwrap_or_else(|| unreachable!()),
            ),
            SequenceSet::RangeFrom(a) => {
                Self::RangeFrom(Uid::new(a.get()).unwrap_or_else(|| unreachable!()))
            }
            SequenceSet::All => Self::All,
            SequenceSet::Set(items) => Self::Set(items.iter().map(Self::from_sequence_set).collect()),
        }
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                let parts: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(SequenceSet::single(7).unwrap().to_string(), "7");
        assert_eq!(SequenceSet::range(1, 10).unwrap().to_string(), "1:10");
        assert_eq!(SequenceSet::All.to_string(), "*");
        let set = SequenceSet::Set(vec![
            SequenceSet::single(1).unwrap(),
            SequenceSet::range(5, 9).unwrap(),
        ]);
        assert_eq!(set.to_string(), "1,5:9");
    }

    #[test]
    fn from_numbers_collapses_runs() {
        let set = SequenceSet::from_numbers(&[1, 2, 3, 7, 9, 10]).unwrap();
        assert_eq!(set.to_string(), "1:3,7,9:10");
    }

    #[test]
    fn from_numbers_skips_zero_and_rejects_empty() {
        assert!(SequenceSet::from_numbers(&[]).is_none());
        assert!(SequenceSet::from_numbers(&[0]).is_none());
        assert_eq!(SequenceSet::from_numbers(&[0, 4]).unwrap().to_string(), "4");
    }

    #[test]
    fn uid_set_display() {
        let a = Uid::new(100).unwrap();
        let b = Uid::new(200).unwrap();
        assert_eq!(UidSet::single(a).to_string(), "100");
        assert_eq!(UidSet::range(a, b).to_string(), "100:200");
        assert_eq!(UidSet::RangeFrom(a).to_string(), "100:*");
        assert_eq!(
            UidSet::from_numbers(&[11, 12, 13, 20]).unwrap().to_string(),
            "11:13,20"
        );
    }
}
