use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use itertools::Itertools;

use crate::{
    config::{CompositeRuleEntry, ConfigError, ConfigFile, Precedence, RankedRule, ScenarioEntry},
    core::id::{AreaId, ScenarioId},
    quantity::{power::Kilowatts, rate::KilowattHourRate},
};

#[must_use]
#[derive(Clone, Debug)]
pub struct ScenarioMapping {
    pub area: AreaId,

    /// Used when the export does not report the power.
    pub rated_power: Option<Kilowatts>,
}

/// One scenario's active time subsumes the included scenarios' time, at its own fixed power.
#[must_use]
#[derive(Clone, Debug)]
pub struct CompositeRule {
    pub composite: ScenarioId,
    pub includes: BTreeSet<ScenarioId>,
    pub override_power: Kilowatts,
}

/// Validated, read-only configuration shared by every area computation of a run.
#[must_use]
#[derive(Debug)]
pub struct ConfigModel {
    rate: Option<KilowattHourRate>,
    scenarios: BTreeMap<ScenarioId, ScenarioMapping>,
    precedences: BTreeMap<AreaId, Precedence>,
}

impl TryFrom<ConfigFile> for ConfigModel {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let scenarios = Self::validate_scenarios(file.scenarios)?;

        let mut rules_by_area: BTreeMap<AreaId, Vec<CompositeRule>> = BTreeMap::new();
        let mut composites = BTreeSet::new();
        for entry in file.composite_rules {
            let CompositeRuleEntry { scenario: composite, includes, override_power } = entry;
            if !composites.insert(composite.clone()) {
                return Err(ConfigError::DuplicateRule { composite });
            }
            if !override_power.is_positive() {
                return Err(ConfigError::NonPositivePower {
                    scenario: composite,
                    power: override_power,
                });
            }
            let area = Self::validate_includes(&scenarios, &composite, &includes)?;
            rules_by_area.entry(area.clone()).or_default().push(CompositeRule {
                composite,
                includes: includes.into_iter().collect(),
                override_power,
            });
        }

        let precedences = rules_by_area
            .into_iter()
            .map(|(area, rules)| {
                let precedence = Precedence::try_new(&area, rules)?;
                Ok((area, precedence))
            })
            .collect::<Result<_, ConfigError>>()?;

        Ok(Self { rate: file.rate, scenarios, precedences })
    }
}

impl ConfigModel {
    fn validate_scenarios(
        entries: Vec<ScenarioEntry>,
    ) -> Result<BTreeMap<ScenarioId, ScenarioMapping>, ConfigError> {
        let mut scenarios = BTreeMap::new();
        for ScenarioEntry { id, area, rated_power } in entries {
            if let Some(power) = rated_power
                && !power.is_positive()
            {
                return Err(ConfigError::NonPositivePower { scenario: id, power });
            }
            match scenarios.entry(id) {
                Entry::Occupied(entry) => {
                    return Err(ConfigError::DuplicateMapping { scenario: entry.key().clone() });
                }
                Entry::Vacant(entry) => {
                    entry.insert(ScenarioMapping { area, rated_power });
                }
            }
        }
        Ok(scenarios)
    }

    /// Check the rule's scenarios and return the area they all belong to.
    fn validate_includes<'a>(
        scenarios: &'a BTreeMap<ScenarioId, ScenarioMapping>,
        composite: &ScenarioId,
        includes: &[ScenarioId],
    ) -> Result<&'a AreaId, ConfigError> {
        let area_of = move |scenario: &ScenarioId| {
            scenarios.get(scenario).map(|mapping| &mapping.area).ok_or_else(|| {
                ConfigError::UnmappedRuleScenario {
                    composite: composite.clone(),
                    scenario: scenario.clone(),
                }
            })
        };
        let composite_area = area_of(composite)?;
        for scenario in includes {
            if scenario == composite {
                return Err(ConfigError::SelfIncludingComposite { composite: composite.clone() });
            }
            let scenario_area = area_of(scenario)?;
            if scenario_area != composite_area {
                return Err(ConfigError::CrossAreaComposite {
                    composite: composite.clone(),
                    composite_area: composite_area.clone(),
                    scenario: scenario.clone(),
                    scenario_area: scenario_area.clone(),
                });
            }
        }
        Ok(composite_area)
    }

    /// Default rate from the configuration file.
    pub const fn rate(&self) -> Option<KilowattHourRate> {
        self.rate
    }

    pub fn mapping(&self, scenario: &ScenarioId) -> Option<&ScenarioMapping> {
        self.scenarios.get(scenario)
    }

    /// Scenario mappings, sorted by scenario.
    pub fn scenarios(&self) -> impl Iterator<Item = (&ScenarioId, &ScenarioMapping)> {
        self.scenarios.iter()
    }

    /// Composite rules of the area, empty when the area has none.
    pub fn precedence(&self, area: &AreaId) -> Option<&Precedence> {
        self.precedences.get(area)
    }

    pub fn precedences(&self) -> impl Iterator<Item = (&AreaId, &Precedence)> {
        self.precedences.iter()
    }

    /// Rule for the composite scenario, if it is one.
    pub fn rule(&self, scenario: &ScenarioId) -> Option<&RankedRule> {
        let area = &self.mapping(scenario)?.area;
        self.precedence(area)?.rule(scenario)
    }

    /// Every configured area, sorted.
    pub fn areas(&self) -> impl Iterator<Item = &AreaId> {
        self.scenarios.values().map(|mapping| &mapping.area).sorted_unstable().dedup()
    }

    #[must_use]
    pub fn n_scenarios(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn n_rules(&self) -> usize {
        self.precedences.values().map(|precedence| precedence.rules().count()).sum()
    }
}
