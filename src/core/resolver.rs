use std::collections::BTreeMap;

use crate::{
    config::ConfigModel,
    core::{
        error::BillingError,
        id::{AreaId, ScenarioId},
    },
    usage::UsageRecord,
};

/// Scenario absent from the configuration, with the number of records it was seen in.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnmappedScenario {
    pub scenario: ScenarioId,
    pub facility: Option<String>,
    pub n_records: usize,
}

/// Records attached to their areas.
#[must_use]
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub by_area: BTreeMap<&'a AreaId, Vec<&'a UsageRecord>>,

    /// Most frequent first.
    pub unmapped: Vec<UnmappedScenario>,
}

#[derive(Copy, Clone)]
pub struct ScenarioResolver<'a> {
    config: &'a ConfigModel,
}

impl<'a> ScenarioResolver<'a> {
    pub const fn new(config: &'a ConfigModel) -> Self {
        Self { config }
    }

    pub fn resolve(&self, scenario: &ScenarioId) -> Result<&'a AreaId, BillingError> {
        self.config
            .mapping(scenario)
            .map(|mapping| &mapping.area)
            .ok_or_else(|| BillingError::UnknownScenario {
                scenario: scenario.clone(),
                facility: None,
            })
    }

    /// Resolve every record once, grouping them by area and collecting the unknown scenarios.
    pub fn partition<'r>(&self, records: &'r [UsageRecord]) -> Partition<'r>
    where
        'a: 'r,
    {
        let mut partition = Partition::default();
        let mut unmapped: BTreeMap<&ScenarioId, UnmappedScenario> = BTreeMap::new();
        for record in records {
            match self.resolve(&record.scenario) {
                Ok(area) => partition.by_area.entry(area).or_default().push(record),
                Err(_) => {
                    unmapped
                        .entry(&record.scenario)
                        .or_insert_with(|| UnmappedScenario {
                            scenario: record.scenario.clone(),
                            facility: record.facility.clone(),
                            n_records: 0,
                        })
                        .n_records += 1;
                }
            }
        }
        partition.unmapped = unmapped.into_values().collect();
        partition.unmapped.sort_by(|lhs, rhs| rhs.n_records.cmp(&lhs.n_records));
        partition
    }
}
