use chrono::NaiveDateTime;
use itertools::Itertools;

use crate::{
    ops::{Interval, IntervalSet},
    quantity::power::Kilowatts,
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub interval: Interval,

    /// Reported or configured power, unknown until the span has to be billed on its own.
    pub power: Option<Kilowatts>,
}

impl Span {
    pub const fn new(interval: Interval, power: Option<Kilowatts>) -> Self {
        Self { interval, power }
    }
}

/// Remaining active time of a single scenario: sorted, pairwise disjoint spans.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Track(Vec<Span>);

impl Track {
    /// Merge the scenario's readings.
    ///
    /// Overlapping readings are duplicates at the source: they collapse into their union at the
    /// highest of their known powers. Readings that merely touch stay separate.
    pub fn merge(spans: impl IntoIterator<Item = Span>) -> Self {
        let spans = spans
            .into_iter()
            .sorted_unstable_by_key(|span| (span.interval.start, span.interval.end))
            .coalesce(|previous, next| {
                if next.interval.start < previous.interval.end {
                    Ok(Span::new(
                        previous.interval.with_end(previous.interval.end.max(next.interval.end)),
                        previous.power.max(next.power),
                    ))
                } else {
                    Err((previous, next))
                }
            })
            .collect();
        Self(spans)
    }

    pub fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.0.iter().copied()
    }

    pub fn coverage(&self) -> IntervalSet<NaiveDateTime> {
        self.spans().map(|span| span.interval).collect()
    }

    /// Cut the holes out, keeping each leftover at its span's power.
    pub fn subtract(&self, holes: &IntervalSet<NaiveDateTime>) -> Self {
        Self(
            self.spans()
                .flat_map(|span| {
                    holes
                        .subtract_from(span.interval)
                        .iter()
                        .map(|interval| Span::new(interval, span.power))
                        .collect_vec()
                })
                .collect(),
        )
    }
}
