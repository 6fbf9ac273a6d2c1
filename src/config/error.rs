use itertools::Itertools;

use crate::{
    core::id::{AreaId, ScenarioId},
    quantity::power::Kilowatts,
};

/// Fatal configuration problem, detected once before any billing run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("scenario `{scenario}` is mapped more than once")]
    DuplicateMapping { scenario: ScenarioId },

    #[error("composite scenario `{composite}` has more than one rule")]
    DuplicateRule { composite: ScenarioId },

    #[error("rule `{composite}` refers to unmapped scenario `{scenario}`")]
    UnmappedRuleScenario { composite: ScenarioId, scenario: ScenarioId },

    #[error("rule `{composite}` includes itself")]
    SelfIncludingComposite { composite: ScenarioId },

    #[error(
        "rule `{composite}` in `{composite_area}` includes `{scenario}` from another area `{scenario_area}`"
    )]
    CrossAreaComposite {
        composite: ScenarioId,
        composite_area: AreaId,
        scenario: ScenarioId,
        scenario_area: AreaId,
    },

    #[error("composite rules in `{area}` include each other: {}", format_scenarios(.scenarios))]
    CyclicComposite { area: AreaId, scenarios: Vec<ScenarioId> },

    #[error("`{scenario}` has a non-positive power: {power}")]
    NonPositivePower { scenario: ScenarioId, power: Kilowatts },
}

fn format_scenarios(scenarios: &[ScenarioId]) -> String {
    scenarios.iter().map(|scenario| format!("`{scenario}`")).join(", ")
}
