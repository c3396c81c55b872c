//! Rewind points.

use std::fmt;

/// A saved arena offset. Resetting to it releases everything allocated
/// after it was taken.
#[must_use = "a mark is only useful if it is later passed to reset"]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TempMark(pub(crate) usize);

impl TempMark {
    /// The empty arena. Resetting to it is a full reset.
    pub const EMPTY: TempMark = TempMark(0);

    /// Byte offset this mark stands for.
    pub fn offset(self) -> usize {
        self.0
    }

    /// Whether this is the full-reset mark.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TempMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}
