use serde::Serialize;

use crate::{
    core::id::{AreaId, ScenarioId},
    ops::Interval,
    quantity::{energy::KilowattHours, power::Kilowatts, time::Hours},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Billed at a composite rule's override power.
    #[display("composite")]
    Composite,

    /// Billed at the scenario's own power.
    #[display("standalone")]
    Standalone,
}

/// Piece of one scenario's active time at a single power, before flattening.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub scenario: ScenarioId,
    pub interval: Interval,
    pub power: Kilowatts,
    pub source: Source,
}

/// Span of an area's time at a single effective power, ready to be billed.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedInterval {
    pub area: AreaId,
    pub interval: Interval,
    pub effective_power: Kilowatts,
    pub source: Source,

    /// Scenarios drawing power during the span, sorted.
    pub scenarios: Vec<ScenarioId>,
}

impl ResolvedInterval {
    pub fn duration(&self) -> Hours {
        Hours::from(self.interval.len())
    }

    pub fn energy(&self) -> KilowattHours {
        self.effective_power * self.duration()
    }
}

/// Time of a scenario that a composite took over.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Absorption {
    pub scenario: ScenarioId,
    pub composite: ScenarioId,
    pub interval: Interval,
}

/// Outcome of overlap resolution for one batch of an area's usage.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Disjoint and sorted.
    pub intervals: Vec<ResolvedInterval>,

    /// Per-scenario pieces the intervals are made of.
    pub contributions: Vec<Contribution>,

    pub absorptions: Vec<Absorption>,
}
