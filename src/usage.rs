pub mod export;

use bon::Builder;

use crate::{core::id::ScenarioId, ops::Interval, quantity::power::Kilowatts};

/// Single on/off period of one lighting scenario.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct UsageRecord {
    #[builder(into)]
    pub scenario: ScenarioId,

    pub interval: Interval,

    /// Rated power from the export, falls back to the configured scenario default.
    pub reported_power: Option<Kilowatts>,

    /// Facility label from the export, shown on invoice lines and next to unknown scenarios.
    #[builder(into)]
    pub facility: Option<String>,

    /// Club that booked the lights, an invoice line is issued per club and day.
    #[builder(into)]
    pub club: Option<String>,
}
