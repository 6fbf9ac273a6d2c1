use std::collections::BTreeSet;

use itertools::Itertools;

use crate::{
    core::{
        id::AreaId,
        resolved::{Contribution, ResolvedInterval, Source},
    },
    ops::Interval,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    End,
    Start,
}

/// Flatten possibly concurrent contributions into disjoint intervals.
///
/// Concurrent contributions come from independent fixtures (e.g. the two halves of a field),
/// so their powers add up. Adjacent pieces that look the same are coalesced.
pub fn flatten(area: &AreaId, contributions: &[Contribution]) -> Vec<ResolvedInterval> {
    let mut boundaries = contributions
        .iter()
        .enumerate()
        .flat_map(|(index, contribution)| {
            [
                (contribution.interval.start, Boundary::Start, index),
                (contribution.interval.end, Boundary::End, index),
            ]
        })
        .sorted_unstable()
        .peekable();

    let mut active = BTreeSet::new();
    let mut pieces = Vec::new();
    while let Some((at, boundary, index)) = boundaries.next() {
        match boundary {
            Boundary::Start => active.insert(index),
            Boundary::End => active.remove(&index),
        };
        if let Some(&(next_at, _, _)) = boundaries.peek()
            && next_at > at
            && !active.is_empty()
        {
            let active = active.iter().map(|&index| &contributions[index]);
            pieces.push(piece(area, Interval::new(at, next_at), active));
        }
    }

    pieces
        .into_iter()
        .coalesce(|previous, next| {
            if previous.interval.end == next.interval.start
                && previous.effective_power == next.effective_power
                && previous.source == next.source
                && previous.scenarios == next.scenarios
            {
                Ok(ResolvedInterval {
                    interval: previous.interval.with_end(next.interval.end),
                    ..previous
                })
            } else {
                Err((previous, next))
            }
        })
        .collect()
}

fn piece<'a>(
    area: &AreaId,
    interval: Interval,
    active: impl Iterator<Item = &'a Contribution> + Clone,
) -> ResolvedInterval {
    let is_composite = active.clone().any(|contribution| contribution.source == Source::Composite);
    ResolvedInterval {
        area: area.clone(),
        interval,
        effective_power: active.clone().map(|contribution| contribution.power).sum(),
        source: if is_composite { Source::Composite } else { Source::Standalone },
        scenarios: active
            .map(|contribution| contribution.scenario.clone())
            .sorted_unstable()
            .dedup()
            .collect(),
    }
}
