mod bill;
mod check;
mod config;

use clap::{Parser, Subcommand};

use crate::{
    cli::{bill::BillArgs, check::CheckArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn run(self) -> Result {
        match self.command {
            Command::Bill(args) => args.run(),
            Command::Check(args) => args.run(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: bill the usage export per bookable area.
    #[clap(name = "bill")]
    Bill(Box<BillArgs>),

    /// Validate the configuration and look for unmapped scenarios.
    #[clap(name = "check")]
    Check(Box<CheckArgs>),
}
