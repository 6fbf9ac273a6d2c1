mod interval_set;

use std::{
    fmt::{Debug, Formatter},
    ops::Sub,
};

use chrono::NaiveDateTime;

pub use self::interval_set::IntervalSet;

/// Wall-clock interval, as reported by the lighting controller.
pub type Interval = RangeExclusive<NaiveDateTime>;

#[must_use]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct RangeExclusive<T: Copy> {
    /// Inclusive.
    pub start: T,

    /// Exclusive.
    pub end: T,
}

impl<T: Copy + Debug> Debug for RangeExclusive<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl<T: Copy> RangeExclusive<T> {
    pub const fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    pub const fn with_end(mut self, end: T) -> Self {
        self.end = end;
        self
    }
}

impl<T: Copy + Sub> RangeExclusive<T> {
    #[must_use]
    pub fn len(self) -> <T as Sub>::Output {
        self.end - self.start
    }
}

impl<T: Copy + Ord> RangeExclusive<T> {
    /// Degenerate or inverted ranges cover no time.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Common part of the two ranges, if any.
    #[must_use]
    pub fn intersection(self, other: Self) -> Option<Self> {
        let range = Self::new(self.start.max(other.start), self.end.min(other.end));
        (!range.is_empty()).then_some(range)
    }

    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self.intersection(other).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let range = RangeExclusive::new(10, 20);
        assert_eq!(range.intersection(RangeExclusive::new(15, 30)), Some(RangeExclusive::new(15, 20)));
        assert_eq!(range.intersection(RangeExclusive::new(0, 12)), Some(RangeExclusive::new(10, 12)));
        assert_eq!(range.intersection(RangeExclusive::new(20, 30)), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(RangeExclusive::new(5, 5).is_empty());
        assert!(RangeExclusive::new(6, 5).is_empty());
        assert!(!RangeExclusive::new(5, 6).is_empty());
    }
}
