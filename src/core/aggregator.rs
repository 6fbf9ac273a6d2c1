use crate::{
    core::{error::BillingError, id::AreaId, report::AreaBillingTotal, resolved::ResolvedInterval},
    prelude::*,
    quantity::{energy::KilowattHours, rate::KilowattHourRate, time::Hours},
};

/// Turns an area's resolved intervals into its billing total.
#[derive(Copy, Clone)]
pub struct EnergyAggregator {
    rate: KilowattHourRate,
}

impl EnergyAggregator {
    pub const fn new(rate: KilowattHourRate) -> Self {
        Self { rate }
    }

    /// Intervals must be non-empty, sorted and disjoint, anything else means the resolver is broken.
    pub fn aggregate(
        &self,
        area: &AreaId,
        intervals: &[ResolvedInterval],
    ) -> Result<AreaBillingTotal, BillingError> {
        let mut previous_end = None;
        for interval in intervals {
            let interval = interval.interval;
            if interval.is_empty() || previous_end.is_some_and(|end| interval.start < end) {
                error!(%area, at = %interval.start, "resolved intervals are broken");
                return Err(BillingError::OverlappingResolvedIntervals {
                    area: area.clone(),
                    at: interval.start,
                });
            }
            previous_end = Some(interval.end);
        }

        let total_energy: KilowattHours = intervals.iter().map(ResolvedInterval::energy).sum();
        let duration: Hours = intervals.iter().map(ResolvedInterval::duration).sum();
        let total = AreaBillingTotal {
            area: area.clone(),
            total_energy,
            total_cost: total_energy * self.rate,
            duration,
            first_start: intervals.first().map(|interval| interval.interval.start),
            last_end: intervals.last().map(|interval| interval.interval.end),
        };
        debug!(
            %area,
            n_intervals = intervals.len(),
            total_energy = %total.total_energy,
            total_cost = %total.total_cost,
            "aggregated",
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::{core::resolved::Source, ops::Interval, quantity::power::Kilowatts};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn interval(start: NaiveDateTime, end: NaiveDateTime, power: f64) -> ResolvedInterval {
        ResolvedInterval {
            area: "pitch".into(),
            interval: Interval::new(start, end),
            effective_power: Kilowatts::new(power),
            source: Source::Standalone,
            scenarios: vec!["pitch - 50 lux".into()],
        }
    }

    #[test]
    fn test_aggregate() {
        let aggregator = EnergyAggregator::new(KilowattHourRate::new(0.25));
        let total = aggregator
            .aggregate(
                &"pitch".into(),
                &[interval(at(18, 0), at(19, 30), 10.0), interval(at(20, 0), at(20, 15), 4.0)],
            )
            .unwrap();
        assert_abs_diff_eq!(total.total_energy.into_inner(), 16.0);
        assert_abs_diff_eq!(total.total_cost.into_inner(), 4.0);
        assert_abs_diff_eq!(total.duration.into_inner(), 1.75);
        assert_eq!(total.first_start, Some(at(18, 0)));
        assert_eq!(total.last_end, Some(at(20, 15)));
    }

    #[test]
    fn test_aggregate_empty() {
        let aggregator = EnergyAggregator::new(KilowattHourRate::new(0.25));
        let total = aggregator.aggregate(&"pitch".into(), &[]).unwrap();
        assert_eq!(total, AreaBillingTotal::idle("pitch".into()));
    }

    #[test]
    fn test_overlap_is_fatal() {
        let aggregator = EnergyAggregator::new(KilowattHourRate::new(0.25));
        let error = aggregator
            .aggregate(
                &"pitch".into(),
                &[interval(at(18, 0), at(19, 0), 10.0), interval(at(18, 30), at(20, 0), 10.0)],
            )
            .unwrap_err();
        assert!(error.is_fatal());
        assert_eq!(
            error,
            BillingError::OverlappingResolvedIntervals { area: "pitch".into(), at: at(18, 30) },
        );
    }
}
