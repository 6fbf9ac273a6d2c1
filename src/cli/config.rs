use std::path::PathBuf;

use clap::Parser;

use crate::{config::ConfigModel, prelude::*};

#[derive(Parser)]
pub struct ConfigArgs {
    /// Scenario mappings and composite rules.
    #[clap(long = "config", env = "FLOODLIGHT_CONFIG", default_value = "floodlight.toml")]
    path: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<ConfigModel> {
        ConfigModel::read_from(&self.path)
    }
}
