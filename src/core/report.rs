use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    core::{error::BillingError, id::AreaId, invoice::InvoiceLine},
    quantity::{cost::Cost, energy::KilowattHours, time::Hours},
};

/// Billed energy and cost of a single area.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AreaBillingTotal {
    pub area: AreaId,

    #[serde(rename = "total_kwh")]
    pub total_energy: KilowattHours,

    pub total_cost: Cost,

    /// Time with the lights on, regardless of power.
    #[serde(rename = "total_hours")]
    pub duration: Hours,

    pub first_start: Option<NaiveDateTime>,
    pub last_end: Option<NaiveDateTime>,
}

impl AreaBillingTotal {
    /// Zero-filled total for an area without any usage.
    pub const fn idle(area: AreaId) -> Self {
        Self {
            area,
            total_energy: KilowattHours::ZERO,
            total_cost: Cost::ZERO,
            duration: Hours::ZERO,
            first_start: None,
            last_end: None,
        }
    }

    /// Add up the totals of two usage batches of the same area.
    pub fn merge(self, other: &Self) -> Self {
        Self {
            area: self.area,
            total_energy: self.total_energy + other.total_energy,
            total_cost: self.total_cost + other.total_cost,
            duration: self.duration + other.duration,
            first_start: self.first_start.into_iter().chain(other.first_start).min(),
            last_end: self.last_end.into_iter().chain(other.last_end).max(),
        }
    }
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BillingIssue {
    #[serde(flatten)]
    pub error: BillingError,

    /// Number of usage records left out of the bill because of the error.
    pub n_records: usize,
}

#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BillingReport {
    /// Sorted by area.
    pub totals: Vec<AreaBillingTotal>,

    /// Unknown scenarios first, then per-area problems sorted by area.
    pub issues: Vec<BillingIssue>,

    /// Sorted by date, club and area.
    pub lines: Vec<InvoiceLine>,
}

impl BillingReport {
    pub fn total_energy(&self) -> KilowattHours {
        self.totals.iter().map(|total| total.total_energy).sum()
    }

    pub fn total_cost(&self) -> Cost {
        self.totals.iter().map(|total| total.total_cost).sum()
    }

    #[must_use]
    pub fn n_skipped_records(&self) -> usize {
        self.issues.iter().map(|issue| issue.n_records).sum()
    }

    #[must_use]
    pub fn total(&self, area: &AreaId) -> Option<&AreaBillingTotal> {
        self.totals.iter().find(|total| &total.area == area)
    }
}
