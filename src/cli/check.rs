use std::path::PathBuf;

use clap::Parser;

use crate::{
    cli::config::ConfigArgs,
    core::resolver::ScenarioResolver,
    prelude::*,
    tables::{build_precedence_table, build_scenarios_table, build_unmapped_table},
    usage::export::read_usage_file,
};

#[derive(Parser)]
pub struct CheckArgs {
    #[clap(flatten)]
    config: ConfigArgs,

    /// Usage export to look for unmapped scenarios in.
    #[clap(long, env = "FLOODLIGHT_USAGE")]
    usage: Option<PathBuf>,
}

impl CheckArgs {
    pub fn run(self) -> Result {
        let config = self.config.load()?;
        println!("{}", build_scenarios_table(&config));
        if config.n_rules() != 0 {
            println!("{}", build_precedence_table(&config));
        }

        let Some(usage) = self.usage else {
            return Ok(());
        };
        let records = read_usage_file(&usage)?;
        let partition = ScenarioResolver::new(&config).partition(&records);
        if partition.unmapped.is_empty() {
            info!(n_records = records.len(), "every scenario is mapped");
        } else {
            warn!(n_unmapped = partition.unmapped.len(), "found unmapped scenarios");
            println!("{}", build_unmapped_table(&partition.unmapped));
        }
        Ok(())
    }
}
