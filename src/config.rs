mod error;
mod model;
mod precedence;

use std::{fmt::Debug, fs, path::Path};

use serde::{Deserialize, Serialize};

pub use self::{
    error::ConfigError,
    model::{CompositeRule, ConfigModel, ScenarioMapping},
    precedence::{Precedence, RankedRule},
};
use crate::{
    core::id::{AreaId, ScenarioId},
    prelude::*,
    quantity::{power::Kilowatts, rate::KilowattHourRate},
};

/// Billing configuration as written by the operator.
#[derive(Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Default rate, used when no rate is given on the command line.
    #[serde(default, rename = "rate_per_kwh")]
    pub rate: Option<KilowattHourRate>,

    #[serde(default)]
    pub scenarios: Vec<ScenarioEntry>,

    #[serde(default)]
    pub composite_rules: Vec<CompositeRuleEntry>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioEntry {
    pub id: ScenarioId,
    pub area: AreaId,

    #[serde(default, rename = "rated_power_kw")]
    pub rated_power: Option<Kilowatts>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositeRuleEntry {
    /// The brighter scenario which subsumes the included ones.
    pub scenario: ScenarioId,

    pub includes: Vec<ScenarioId>,

    #[serde(rename = "override_power_kw")]
    pub override_power: Kilowatts,
}

impl ConfigFile {
    #[instrument(skip_all, fields(path = ?path.as_ref()))]
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read the configuration from `{}`", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse the configuration `{}`", path.display()))
    }
}

impl ConfigModel {
    /// Read, parse and validate the configuration file.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let model = Self::try_from(ConfigFile::read_from(path)?)?;
        info!(
            n_scenarios = model.n_scenarios(),
            n_rules = model.n_rules(),
            n_areas = model.areas().count(),
            "loaded the configuration",
        );
        Ok(model)
    }
}
