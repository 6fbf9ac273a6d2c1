mod sweep;
mod track;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use itertools::Itertools;

use self::track::{Span, Track};
use crate::{
    config::{ConfigModel, RankedRule},
    core::{
        error::BillingError,
        id::{AreaId, ScenarioId},
        resolved::{Absorption, Contribution, Resolution, Source},
    },
    ops::IntervalSet,
    prelude::*,
    quantity::power::Kilowatts,
    usage::UsageRecord,
};

/// Splits an area's usage into disjoint, correctly priced intervals.
///
/// Composite rules are applied from the broadest to the narrowest: the composite's override
/// power replaces the included scenarios' draw for the time they are on together.
pub struct OverlapResolver<'a> {
    config: &'a ConfigModel,
    area: &'a AreaId,
}

impl<'a> OverlapResolver<'a> {
    pub const fn new(config: &'a ConfigModel, area: &'a AreaId) -> Self {
        Self { config, area }
    }

    /// Records must all belong to the area.
    #[instrument(skip_all, fields(area = %self.area, n_records = records.len()))]
    pub fn resolve(&self, records: &[&UsageRecord]) -> Result<Resolution, BillingError> {
        let mut tracks = self.build_tracks(records)?;
        let mut contributions = Vec::new();
        let mut absorptions = Vec::new();

        if let Some(precedence) = self.config.precedence(self.area) {
            let levels = precedence.levels();
            for (depth, level) in levels.iter().enumerate() {
                self.ensure_unambiguous(&levels[depth..], &tracks)?;
                for ranked in level {
                    self.apply(ranked, &mut tracks, &mut contributions, &mut absorptions);
                }
            }
        }

        // Whatever is left, composites included, is billed at the scenario's own power:
        for (scenario, track) in tracks {
            for span in track.spans() {
                contributions.push(Contribution {
                    power: self.standalone_power(&scenario, span.power)?,
                    scenario: scenario.clone(),
                    interval: span.interval,
                    source: Source::Standalone,
                });
            }
        }

        let intervals = sweep::flatten(self.area, &contributions);
        debug!(n_contributions = contributions.len(), n_intervals = intervals.len(), "resolved");
        Ok(Resolution { intervals, contributions, absorptions })
    }

    fn build_tracks(
        &self,
        records: &[&UsageRecord],
    ) -> Result<BTreeMap<ScenarioId, Track>, BillingError> {
        let mut spans: BTreeMap<&ScenarioId, Vec<Span>> = BTreeMap::new();
        for record in records {
            if record.interval.is_empty() {
                return Err(BillingError::NegativeOrZeroDuration {
                    area: self.area.clone(),
                    scenario: record.scenario.clone(),
                    start: record.interval.start,
                    end: record.interval.end,
                });
            }
            let power = record
                .reported_power
                .or_else(|| self.config.mapping(&record.scenario)?.rated_power);
            spans.entry(&record.scenario).or_default().push(Span::new(record.interval, power));
        }
        Ok(spans
            .into_iter()
            .map(|(scenario, spans)| (scenario.clone(), Track::merge(spans)))
            .collect())
    }

    /// Known power of the span, otherwise the composite's own override.
    fn standalone_power(
        &self,
        scenario: &ScenarioId,
        power: Option<Kilowatts>,
    ) -> Result<Kilowatts, BillingError> {
        power
            .or_else(|| Some(self.config.rule(scenario)?.rule.override_power))
            .ok_or_else(|| BillingError::MissingPower {
                area: self.area.clone(),
                scenario: scenario.clone(),
            })
    }

    /// Fails when two rules would both claim the same time of a shared scenario.
    ///
    /// The first level is about to be applied. Its rules are checked against each other and
    /// against every deeper rule they do not include, nor are included by.
    fn ensure_unambiguous(
        &self,
        levels: &[Vec<RankedRule>],
        tracks: &BTreeMap<ScenarioId, Track>,
    ) -> Result<(), BillingError> {
        let Some((level, deeper)) = levels.split_first() else {
            return Ok(());
        };
        let coverage = |scenario: &ScenarioId| {
            tracks.get(scenario).map(Track::coverage).unwrap_or_default()
        };
        let pairs = level
            .iter()
            .tuple_combinations()
            .chain(level.iter().cartesian_product(deeper.iter().flatten()));
        for (first, second) in pairs {
            if first.subsumed.contains(&second.rule.composite)
                || second.subsumed.contains(&first.rule.composite)
            {
                continue;
            }
            let first_coverage = coverage(&first.rule.composite);
            let second_coverage = coverage(&second.rule.composite);
            for scenario in first.subsumed.intersection(&second.subsumed) {
                let contested = coverage(scenario);
                let claimed_by_first = first_coverage.intersection(&contested);
                let claimed_by_second = second_coverage.intersection(&contested);
                if !claimed_by_first.intersection(&claimed_by_second).is_empty() {
                    return Err(BillingError::AmbiguousComposite {
                        area: self.area.clone(),
                        first: first.rule.composite.clone(),
                        second: second.rule.composite.clone(),
                        scenario: scenario.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn apply(
        &self,
        ranked: &RankedRule,
        tracks: &mut BTreeMap<ScenarioId, Track>,
        contributions: &mut Vec<Contribution>,
        absorptions: &mut Vec<Absorption>,
    ) {
        let composite = &ranked.rule.composite;
        let Some(composite_track) = tracks.get(composite) else {
            return;
        };
        let subsumed: IntervalSet<NaiveDateTime> = ranked
            .subsumed
            .iter()
            .filter_map(|scenario| tracks.get(scenario))
            .flat_map(|track| track.coverage().iter().collect_vec())
            .collect();
        let overlap = composite_track.coverage().intersection(&subsumed);
        if overlap.is_empty() {
            return;
        }

        contributions.extend(overlap.iter().map(|interval| Contribution {
            scenario: composite.clone(),
            interval,
            power: ranked.rule.override_power,
            source: Source::Composite,
        }));
        for scenario in &ranked.subsumed {
            if let Some(track) = tracks.get_mut(scenario) {
                absorptions.extend(track.coverage().intersection(&overlap).iter().map(|interval| {
                    Absorption { scenario: scenario.clone(), composite: composite.clone(), interval }
                }));
                *track = track.subtract(&overlap);
            }
        }
        if let Some(track) = tracks.get_mut(composite) {
            *track = track.subtract(&overlap);
        }
        debug!(area = %self.area, %composite, n_spans = overlap.iter().count(), "applied the composite");
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::{config::ConfigFile, core::resolved::ResolvedInterval, ops::Interval};

    const CONFIG: &str = r#"
        [[scenarios]]
        id = "north-50"
        area = "field"
        rated_power_kw = 1

        [[scenarios]]
        id = "south-50"
        area = "field"
        rated_power_kw = 1

        [[scenarios]]
        id = "north-100"
        area = "field"

        [[scenarios]]
        id = "full-100"
        area = "field"

        [[scenarios]]
        id = "unrated"
        area = "field"

        [[composite_rules]]
        scenario = "north-100"
        includes = ["north-50"]
        override_power_kw = 2

        [[composite_rules]]
        scenario = "full-100"
        includes = ["north-100", "south-50"]
        override_power_kw = 5
    "#;

    fn config() -> ConfigModel {
        parse(CONFIG)
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn record(scenario: &str, start: u32, end: u32) -> UsageRecord {
        UsageRecord::builder().scenario(scenario).interval(Interval::new(at(start), at(end))).build()
    }

    fn resolve(records: &[UsageRecord]) -> Result<Vec<ResolvedInterval>, BillingError> {
        resolve_with(&config(), records).map(|resolution| resolution.intervals)
    }

    fn resolve_with(
        config: &ConfigModel,
        records: &[UsageRecord],
    ) -> Result<Resolution, BillingError> {
        let area = AreaId::from("field");
        OverlapResolver::new(config, &area).resolve(&records.iter().collect_vec())
    }

    fn parse(config: &str) -> ConfigModel {
        ConfigModel::try_from(toml::from_str::<ConfigFile>(config).unwrap()).unwrap()
    }

    fn total_energy(intervals: &[ResolvedInterval]) -> f64 {
        intervals.iter().map(|interval| interval.energy().into_inner()).sum()
    }

    #[test]
    fn test_partial_subsumption() {
        let intervals =
            resolve(&[record("north-50", 9, 11), record("north-100", 10, 11)]).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].interval, Interval::new(at(9), at(10)));
        assert_eq!(intervals[0].source, Source::Standalone);
        assert_eq!(intervals[1].interval, Interval::new(at(10), at(11)));
        assert_eq!(intervals[1].source, Source::Composite);
        assert_abs_diff_eq!(total_energy(&intervals), 3.0);
    }

    #[test]
    fn test_composite_outside_overlap_uses_override() {
        // `north-100` has no rated power, so its lone hour is billed at the override power:
        let intervals =
            resolve(&[record("north-50", 10, 11), record("north-100", 10, 12)]).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[1].source, Source::Standalone);
        assert_abs_diff_eq!(total_energy(&intervals), 4.0);
    }

    #[test]
    fn test_transitive_subsumption() {
        // `full-100` covers `north-100`, which in turn covers `north-50`:
        let intervals = resolve(&[
            record("north-50", 18, 20),
            record("north-100", 18, 20),
            record("south-50", 19, 21),
            record("full-100", 18, 20),
        ])
        .unwrap();
        // 18-20 at 5 kW, then `south-50` alone for 20-21 at 1 kW:
        assert_abs_diff_eq!(total_energy(&intervals), 11.0);
        assert_eq!(intervals.first().unwrap().source, Source::Composite);
        assert_eq!(intervals.last().unwrap().scenarios, [ScenarioId::from("south-50")]);
    }

    #[test]
    fn test_lower_composite_keeps_leftovers() {
        // `full-100` only takes 18-19, `north-100` takes the rest of `north-50`:
        let intervals = resolve(&[
            record("north-50", 18, 21),
            record("north-100", 19, 21),
            record("full-100", 18, 19),
        ])
        .unwrap();
        assert_abs_diff_eq!(total_energy(&intervals), 5.0 + 2.0 * 2.0);
    }

    #[test]
    fn test_disjoint_and_conserving() {
        let records = [
            record("north-50", 8, 12),
            record("north-100", 9, 10),
            record("north-100", 11, 14),
            record("south-50", 7, 9),
            record("full-100", 9, 12),
            record("south-50", 13, 16),
        ];
        let intervals = resolve(&records).unwrap();
        for (previous, next) in intervals.iter().tuple_windows() {
            assert!(previous.interval.end <= next.interval.start);
        }
        let input: IntervalSet<_> = records.iter().map(|record| record.interval).collect();
        let output: IntervalSet<_> = intervals.iter().map(|interval| interval.interval).collect();
        assert_eq!(input, output);
    }

    #[test]
    fn test_duplicate_readings_are_merged() {
        let intervals =
            resolve(&[record("south-50", 10, 12), record("south-50", 10, 12)]).unwrap();
        assert_eq!(intervals.len(), 1);
        assert_abs_diff_eq!(total_energy(&intervals), 2.0);
    }

    #[test]
    fn test_negative_or_zero_duration() {
        let error = resolve(&[record("south-50", 12, 12)]).unwrap_err();
        assert!(matches!(error, BillingError::NegativeOrZeroDuration { .. }));
    }

    #[test]
    fn test_missing_power() {
        let error = resolve(&[record("unrated", 10, 11)]).unwrap_err();
        assert_eq!(
            error,
            BillingError::MissingPower { area: "field".into(), scenario: "unrated".into() },
        );
    }

    #[test]
    fn test_reported_power_wins() {
        let mut reported = record("south-50", 10, 11);
        reported.reported_power = Some(Kilowatts::new(4.0));
        reported.interval = reported.interval.with_end(at(10) + TimeDelta::minutes(30));
        let intervals = resolve(&[reported]).unwrap();
        assert_abs_diff_eq!(total_energy(&intervals), 2.0);
    }

    #[test]
    fn test_ambiguous_composite() {
        let config = ConfigModel::try_from(
            toml::from_str::<ConfigFile>(
                r#"
                [[scenarios]]
                id = "low"
                area = "field"
                rated_power_kw = 1

                [[scenarios]]
                id = "high-a"
                area = "field"
                rated_power_kw = 2

                [[scenarios]]
                id = "high-b"
                area = "field"
                rated_power_kw = 2

                [[composite_rules]]
                scenario = "high-a"
                includes = ["low"]
                override_power_kw = 2

                [[composite_rules]]
                scenario = "high-b"
                includes = ["low"]
                override_power_kw = 3
                "#,
            )
            .unwrap(),
        )
        .unwrap();
        let area = AreaId::from("field");
        let resolver = OverlapResolver::new(&config, &area);

        let contested = [record("low", 9, 12), record("high-a", 10, 11), record("high-b", 10, 12)];
        let error = resolver.resolve(&contested.iter().collect_vec()).unwrap_err();
        assert_eq!(
            error,
            BillingError::AmbiguousComposite {
                area: area.clone(),
                first: "high-a".into(),
                second: "high-b".into(),
                scenario: "low".into(),
            },
        );

        // Taking turns is fine:
        let sequential = [record("low", 9, 12), record("high-a", 9, 10), record("high-b", 11, 12)];
        let intervals = resolver.resolve(&sequential.iter().collect_vec()).unwrap().intervals;
        assert_abs_diff_eq!(total_energy(&intervals), 2.0 + 1.0 + 3.0);
    }

    #[test]
    fn test_ambiguity_across_levels() {
        // `q` and `r` both include `low`, an idle `p` only pushes `q` one level deeper:
        let config = parse(
            r#"
            [[scenarios]]
            id = "low"
            area = "field"
            rated_power_kw = 1

            [[scenarios]]
            id = "p"
            area = "field"
            rated_power_kw = 4

            [[scenarios]]
            id = "q"
            area = "field"
            rated_power_kw = 2

            [[scenarios]]
            id = "r"
            area = "field"
            rated_power_kw = 3

            [[composite_rules]]
            scenario = "p"
            includes = ["q"]
            override_power_kw = 4

            [[composite_rules]]
            scenario = "q"
            includes = ["low"]
            override_power_kw = 2

            [[composite_rules]]
            scenario = "r"
            includes = ["low"]
            override_power_kw = 3
            "#,
        );
        let records = [record("low", 10, 12), record("q", 10, 12), record("r", 10, 12)];
        let error = resolve_with(&config, &records).unwrap_err();
        assert_eq!(
            error,
            BillingError::AmbiguousComposite {
                area: "field".into(),
                first: "r".into(),
                second: "q".into(),
                scenario: "low".into(),
            },
        );
    }

    #[test]
    fn test_covered_scenario_needs_no_power() {
        let config = parse(
            r#"
            [[scenarios]]
            id = "low"
            area = "field"

            [[scenarios]]
            id = "high"
            area = "field"

            [[composite_rules]]
            scenario = "high"
            includes = ["low"]
            override_power_kw = 2
            "#,
        );
        let resolution =
            resolve_with(&config, &[record("low", 10, 11), record("high", 10, 11)]).unwrap();
        assert_eq!(resolution.intervals.len(), 1);
        assert_eq!(resolution.intervals[0].source, Source::Composite);
        assert_abs_diff_eq!(total_energy(&resolution.intervals), 2.0);

        // Once `low` outlasts the composite, its own power is needed again:
        let error = resolve_with(&config, &[record("low", 10, 12), record("high", 10, 11)])
            .unwrap_err();
        assert_eq!(
            error,
            BillingError::MissingPower { area: "field".into(), scenario: "low".into() },
        );
    }

    #[test]
    fn test_absorptions() {
        let resolution = resolve_with(
            &config(),
            &[record("north-50", 9, 12), record("south-50", 11, 13), record("full-100", 10, 12)],
        )
        .unwrap();
        let absorbed = resolution
            .absorptions
            .iter()
            .map(|absorption| {
                (absorption.scenario.as_ref(), absorption.composite.as_ref(), absorption.interval)
            })
            .collect_vec();
        assert_eq!(
            absorbed,
            [
                ("north-50", "full-100", Interval::new(at(10), at(12))),
                ("south-50", "full-100", Interval::new(at(11), at(12))),
            ],
        );
        let standalone = resolution
            .contributions
            .iter()
            .filter(|contribution| contribution.source == Source::Standalone)
            .count();
        assert_eq!(standalone, 2);
    }
}
