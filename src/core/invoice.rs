use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{
        id::{AreaId, ScenarioId},
        report::AreaBillingTotal,
        resolved::Resolution,
    },
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate, time::Hours},
    usage::UsageRecord,
};

const TIME_FORMAT: &str = "%H:%M";

/// Day and club that share an invoice line within an area.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Session {
    /// Date the lights were turned on.
    pub date: NaiveDate,

    pub club: Option<String>,
}

impl Session {
    #[must_use]
    pub fn of(record: &UsageRecord) -> Self {
        Self { date: record.interval.start.date(), club: record.club.clone() }
    }
}

/// Time a scenario spent inside a composite, billed at the composite's power instead.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AbsorbedTime {
    pub composite: ScenarioId,
    pub duration: Hours,
}

/// How a single scenario contributed to an invoice line.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScenarioUsage {
    pub scenario: ScenarioId,
    pub first_on: NaiveDateTime,
    pub last_off: NaiveDateTime,

    /// Time billed under this scenario, composite time included.
    pub billed: Hours,

    pub energy: KilowattHours,
    pub cost: Cost,

    /// Sorted by composite.
    pub absorbed: Vec<AbsorbedTime>,
}

impl ScenarioUsage {
    fn absorbed_note(&self, separator: &str) -> String {
        self.absorbed
            .iter()
            .map(|absorbed| {
                format!(
                    " ({}{separator}min in {})",
                    absorbed.duration.round_to_minutes(),
                    absorbed.composite.label(),
                )
            })
            .collect()
    }

    fn session(&self) -> String {
        format!("{}-{}", self.first_on.format(TIME_FORMAT), self.last_off.format(TIME_FORMAT))
    }
}

/// One invoice line: usage of an area by a club on a given day.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvoiceLine {
    pub date: NaiveDate,
    pub club: Option<String>,
    pub area: AreaId,
    pub facility: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,

    #[serde(rename = "total_hours")]
    pub duration: Hours,

    #[serde(rename = "total_kwh")]
    pub total_energy: KilowattHours,

    pub total_cost: Cost,

    /// Sorted by the first turn-on.
    pub scenarios: Vec<ScenarioUsage>,
}

impl InvoiceLine {
    /// Returns `None` for a session without any usage.
    #[must_use]
    pub fn new(
        session: Session,
        total: &AreaBillingTotal,
        records: &[&UsageRecord],
        resolution: &Resolution,
        rate: KilowattHourRate,
    ) -> Option<Self> {
        let mut periods: BTreeMap<&ScenarioId, (NaiveDateTime, NaiveDateTime)> = BTreeMap::new();
        for record in records {
            periods
                .entry(&record.scenario)
                .and_modify(|(first_on, last_off)| {
                    *first_on = (*first_on).min(record.interval.start);
                    *last_off = (*last_off).max(record.interval.end);
                })
                .or_insert((record.interval.start, record.interval.end));
        }

        let scenarios = periods
            .into_iter()
            .map(|(scenario, (first_on, last_off))| {
                let contributions = resolution
                    .contributions
                    .iter()
                    .filter(|contribution| &contribution.scenario == scenario);
                let billed: Hours = contributions
                    .clone()
                    .map(|contribution| Hours::from(contribution.interval.len()))
                    .sum();
                let energy: KilowattHours = contributions
                    .map(|contribution| {
                        contribution.power * Hours::from(contribution.interval.len())
                    })
                    .sum();

                let mut absorbed: BTreeMap<&ScenarioId, Hours> = BTreeMap::new();
                for absorption in
                    resolution.absorptions.iter().filter(|absorption| &absorption.scenario == scenario)
                {
                    *absorbed.entry(&absorption.composite).or_default() +=
                        Hours::from(absorption.interval.len());
                }

                ScenarioUsage {
                    scenario: scenario.clone(),
                    first_on,
                    last_off,
                    billed,
                    energy,
                    cost: energy * rate,
                    absorbed: absorbed
                        .into_iter()
                        .map(|(composite, duration)| AbsorbedTime {
                            composite: composite.clone(),
                            duration,
                        })
                        .collect(),
                }
            })
            .sorted_by(|lhs, rhs| (lhs.first_on, &lhs.scenario).cmp(&(rhs.first_on, &rhs.scenario)))
            .collect();

        Some(Self {
            date: session.date,
            club: session.club,
            area: total.area.clone(),
            facility: records.iter().filter_map(|record| record.facility.clone()).min(),
            start: total.first_start?,
            end: total.last_end?,
            duration: total.duration,
            total_energy: total.total_energy,
            total_cost: total.total_cost,
            scenarios,
        })
    }

    /// Multi-line breakdown with a line per scenario.
    #[must_use]
    pub fn detailed_summary(&self) -> String {
        let header = format!(
            "{} | {} | Date: {} ({}) | Club: {}\nSession: {}-{} | Total Duration: {} min | Total Cost: {}",
            self.facility.as_deref().unwrap_or("-"),
            self.area,
            self.date,
            self.date.format("%a"),
            self.club.as_deref().unwrap_or("-"),
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT),
            self.duration.round_to_minutes(),
            self.total_cost.round_to_cents(),
        );
        let lines = self.scenarios.iter().map(|usage| {
            format!(
                "{}: {} | {} min | {}{}",
                usage.scenario.label(),
                usage.session(),
                usage.billed.round_to_minutes(),
                usage.cost.round_to_cents(),
                usage.absorbed_note(" "),
            )
        });
        std::iter::once(header).chain(lines).join("\n")
    }

    /// Single-line text for the invoice itself, scenarios without billed time are left out.
    #[must_use]
    pub fn short_summary(&self) -> String {
        self.scenarios
            .iter()
            .filter(|usage| usage.billed.round_to_minutes() > 0)
            .map(|usage| {
                format!(
                    "{}: {} ({}min){}",
                    usage.scenario.label(),
                    usage.session(),
                    usage.billed.round_to_minutes(),
                    usage.absorbed_note(""),
                )
            })
            .chain(std::iter::once(format!("Total: {}", self.total_cost.round_to_cents())))
            .join(" | ")
    }
}
