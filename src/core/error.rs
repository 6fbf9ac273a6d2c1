use chrono::NaiveDateTime;
use serde::Serialize;

use crate::core::id::{AreaId, ScenarioId};

/// Problem attributable to a specific scenario or area.
///
/// Everything except [`BillingError::OverlappingResolvedIntervals`] only skips the affected area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillingError {
    #[error("scenario `{scenario}` is not mapped to any bookable area")]
    UnknownScenario {
        scenario: ScenarioId,

        /// Facility the export reported the scenario under.
        #[serde(skip_serializing_if = "Option::is_none")]
        facility: Option<String>,
    },

    #[error(
        "composites `{first}` and `{second}` both claim `{scenario}` at the same time in `{area}`"
    )]
    AmbiguousComposite { area: AreaId, first: ScenarioId, second: ScenarioId, scenario: ScenarioId },

    #[error("`{scenario}` in `{area}` is on for a non-positive duration: {start}..{end}")]
    NegativeOrZeroDuration {
        area: AreaId,
        scenario: ScenarioId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("`{scenario}` in `{area}` has neither reported nor configured rated power")]
    MissingPower { area: AreaId, scenario: ScenarioId },

    #[error("resolved intervals of `{area}` overlap at {at}")]
    OverlappingResolvedIntervals { area: AreaId, at: NaiveDateTime },
}

impl BillingError {
    /// Internal inconsistency: the whole run must be aborted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::OverlappingResolvedIntervals { .. })
    }

    #[must_use]
    pub const fn area(&self) -> Option<&AreaId> {
        match self {
            Self::UnknownScenario { .. } => None,
            Self::AmbiguousComposite { area, .. }
            | Self::NegativeOrZeroDuration { area, .. }
            | Self::MissingPower { area, .. }
            | Self::OverlappingResolvedIntervals { area, .. } => Some(area),
        }
    }

    /// Facility to show in place of an area that could not be determined.
    #[must_use]
    pub fn facility(&self) -> Option<&str> {
        match self {
            Self::UnknownScenario { facility, .. } => facility.as_deref(),
            _ => None,
        }
    }

    /// Offending scenarios, if the error can be narrowed down to them.
    #[must_use]
    pub fn scenarios(&self) -> Vec<&ScenarioId> {
        match self {
            Self::UnknownScenario { scenario, .. }
            | Self::NegativeOrZeroDuration { scenario, .. }
            | Self::MissingPower { scenario, .. } => vec![scenario],
            Self::AmbiguousComposite { first, second, scenario, .. } => {
                vec![first, second, scenario]
            }
            Self::OverlappingResolvedIntervals { .. } => Vec::new(),
        }
    }
}
