use std::{fs::File, io, path::PathBuf};

use clap::Parser;

use crate::{
    cli::config::ConfigArgs,
    core::engine::BillingEngine,
    export::{write_invoice_csv, write_report_json, write_totals_csv},
    prelude::*,
    quantity::rate::KilowattHourRate,
    tables::{build_issues_table, build_lines_table, build_totals_table},
    usage::export::read_usage_file,
};

#[derive(Parser)]
pub struct BillArgs {
    #[clap(flatten)]
    config: ConfigArgs,

    /// Usage export downloaded from the lighting controller.
    #[clap(long, env = "FLOODLIGHT_USAGE")]
    usage: PathBuf,

    /// Energy rate, overrides `rate_per_kwh` from the configuration.
    #[clap(long = "rate-per-kwh", env = "RATE_PER_KWH")]
    rate: Option<KilowattHourRate>,

    /// Also list the configured areas without any usage.
    #[clap(long)]
    all_areas: bool,

    /// Export the per-area totals to this CSV file.
    #[clap(long)]
    output: Option<PathBuf>,

    /// Export the invoice lines, one per date, club and area, to this CSV file.
    #[clap(long)]
    invoice: Option<PathBuf>,

    /// Also print the invoice lines.
    #[clap(long)]
    lines: bool,

    /// Print the report as JSON instead of the tables.
    #[clap(long)]
    json: bool,
}

impl BillArgs {
    pub fn run(self) -> Result {
        let config = self.config.load()?;
        let Some(rate) = self.rate.or_else(|| config.rate()) else {
            bail!("no rate is given, use `--rate-per-kwh` or set `rate_per_kwh` in the configuration");
        };
        ensure!(rate.is_positive(), "the rate must be positive, got {rate}");
        let records = read_usage_file(&self.usage)?;

        let report = BillingEngine::builder()
            .config(&config)
            .rate(rate)
            .include_idle_areas(self.all_areas)
            .build()
            .run(&records)
            .context("the billing run is aborted")?;

        if self.json {
            write_report_json(&report, io::stdout().lock())?;
            println!();
        } else {
            if self.lines {
                println!("{}", build_lines_table(&report.lines));
            }
            println!("{}", build_totals_table(&report));
            if !report.issues.is_empty() {
                println!("{}", build_issues_table(&report.issues));
            }
        }
        if !report.issues.is_empty() {
            warn!(
                n_issues = report.issues.len(),
                n_skipped_records = report.n_skipped_records(),
                "some usage is left out of the bill",
            );
        }

        if let Some(path) = self.output {
            let file = File::create(&path)
                .with_context(|| format!("failed to create `{}`", path.display()))?;
            write_totals_csv(&report, file)?;
            info!(path = %path.display(), "exported the totals");
        }
        if let Some(path) = self.invoice {
            let file = File::create(&path)
                .with_context(|| format!("failed to create `{}`", path.display()))?;
            write_invoice_csv(&report, file)?;
            info!(path = %path.display(), n_lines = report.lines.len(), "exported the invoice lines");
        }

        Ok(())
    }
}
