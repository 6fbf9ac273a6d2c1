use std::collections::BTreeSet;

use bon::Builder;
use itertools::Itertools;
use rayon::prelude::*;

use crate::{
    config::ConfigModel,
    core::{
        aggregator::EnergyAggregator,
        error::BillingError,
        id::AreaId,
        invoice::{InvoiceLine, Session},
        overlap::OverlapResolver,
        report::{AreaBillingTotal, BillingIssue, BillingReport},
        resolver::ScenarioResolver,
    },
    prelude::*,
    quantity::rate::KilowattHourRate,
    usage::UsageRecord,
};

/// Bills a whole usage dataset, area by area.
#[derive(Builder)]
pub struct BillingEngine<'a> {
    config: &'a ConfigModel,
    rate: KilowattHourRate,

    /// Zero-fill configured areas that have no usage.
    #[builder(default)]
    include_idle_areas: bool,
}

impl BillingEngine<'_> {
    /// Only an internal inconsistency fails the run, every other problem ends up in the report.
    #[instrument(skip_all, fields(n_records = records.len(), rate = %self.rate))]
    pub fn run(&self, records: &[UsageRecord]) -> Result<BillingReport, BillingError> {
        let partition = ScenarioResolver::new(self.config).partition(records);

        let mut issues = Vec::new();
        for unmapped in partition.unmapped {
            warn!(scenario = %unmapped.scenario, n_records = unmapped.n_records, "unknown scenario");
            issues.push(BillingIssue {
                error: BillingError::UnknownScenario {
                    scenario: unmapped.scenario,
                    facility: unmapped.facility,
                },
                n_records: unmapped.n_records,
            });
        }

        let outcomes: Vec<_> = partition
            .by_area
            .par_iter()
            .map(|(area, records)| (records.len(), self.bill_area(area, records)))
            .collect();

        let mut totals = Vec::with_capacity(outcomes.len());
        let mut lines = Vec::new();
        for (n_records, outcome) in outcomes {
            match outcome {
                Ok((total, area_lines)) => {
                    totals.push(total);
                    lines.extend(area_lines);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!(%error, n_records, "skipping the area");
                    issues.push(BillingIssue { error, n_records });
                }
            }
        }

        if self.include_idle_areas {
            let active: BTreeSet<&AreaId> = partition.by_area.keys().copied().collect();
            totals.extend(
                self.config
                    .areas()
                    .filter(|area| !active.contains(area))
                    .cloned()
                    .map(AreaBillingTotal::idle),
            );
        }
        totals.sort_unstable_by(|lhs, rhs| lhs.area.cmp(&rhs.area));
        lines.sort_unstable_by(|lhs, rhs| {
            (lhs.date, &lhs.club, &lhs.area).cmp(&(rhs.date, &rhs.club, &rhs.area))
        });

        let report = BillingReport { totals, issues, lines };
        info!(
            n_areas = report.totals.len(),
            n_lines = report.lines.len(),
            n_issues = report.issues.len(),
            total_energy = %report.total_energy(),
            total_cost = %report.total_cost(),
            "billed",
        );
        Ok(report)
    }

    /// Overlaps are only resolved within a session, a day and club of the area.
    fn bill_area(
        &self,
        area: &AreaId,
        records: &[&UsageRecord],
    ) -> Result<(AreaBillingTotal, Vec<InvoiceLine>), BillingError> {
        let resolver = OverlapResolver::new(self.config, area);
        let aggregator = EnergyAggregator::new(self.rate);
        let sessions = records.iter().copied().into_group_map_by(|record| Session::of(record));

        let mut total = AreaBillingTotal::idle(area.clone());
        let mut lines = Vec::with_capacity(sessions.len());
        for (session, records) in
            sessions.into_iter().sorted_unstable_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs))
        {
            let resolution = resolver.resolve(&records)?;
            let session_total = aggregator.aggregate(area, &resolution.intervals)?;
            lines.extend(InvoiceLine::new(
                session,
                &session_total,
                &records,
                &resolution,
                self.rate,
            ));
            total = total.merge(&session_total);
        }
        Ok((total, lines))
    }
}
