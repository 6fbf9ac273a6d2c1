use std::fmt::{Debug, Formatter};

use itertools::Itertools;

use crate::ops::RangeExclusive;

/// Sorted, pairwise disjoint, non-touching set of non-empty ranges.
#[must_use]
#[derive(Clone, Eq, PartialEq)]
pub struct IntervalSet<T: Copy>(Vec<RangeExclusive<T>>);

impl<T: Copy + Debug> Debug for IntervalSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.0).finish()
    }
}

impl<T: Copy> Default for IntervalSet<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Copy + Ord> FromIterator<RangeExclusive<T>> for IntervalSet<T> {
    /// Normalize arbitrary ranges: drop the empty ones, sort, and merge overlapping or touching ones.
    fn from_iter<I: IntoIterator<Item = RangeExclusive<T>>>(iter: I) -> Self {
        let ranges = iter
            .into_iter()
            .filter(|range| !range.is_empty())
            .sorted_unstable_by_key(|range| (range.start, range.end))
            .coalesce(|previous, next| {
                if next.start <= previous.end {
                    Ok(previous.with_end(previous.end.max(next.end)))
                } else {
                    Err((previous, next))
                }
            })
            .collect();
        Self(ranges)
    }
}

impl<T: Copy + Ord> IntervalSet<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RangeExclusive<T>> + '_ {
        self.0.iter().copied()
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut ranges = Vec::new();
        let (mut i, mut j) = (0, 0);
        while let (Some(lhs), Some(rhs)) = (self.0.get(i), other.0.get(j)) {
            if let Some(common) = lhs.intersection(*rhs) {
                ranges.push(common);
            }
            if lhs.end <= rhs.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self(ranges)
    }

    /// Subtract the set from a single range, producing zero or more leftovers.
    pub fn subtract_from(&self, range: RangeExclusive<T>) -> Self {
        let mut leftovers = Vec::new();
        let mut cursor = range.start;
        for hole in self.iter().filter(|hole| hole.overlaps(range)) {
            if cursor < hole.start {
                leftovers.push(RangeExclusive::new(cursor, hole.start));
            }
            cursor = cursor.max(hole.end);
        }
        if cursor < range.end {
            leftovers.push(RangeExclusive::new(cursor, range.end));
        }
        Self(leftovers)
    }
}
