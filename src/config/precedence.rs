use std::{
    cmp::Reverse,
    collections::{BTreeSet, HashMap},
};

use itertools::Itertools;

use crate::{
    config::{CompositeRule, ConfigError},
    core::id::{AreaId, ScenarioId},
};

/// Composite rule with its rank and everything it subsumes, directly or through other rules.
#[must_use]
#[derive(Clone, Debug)]
pub struct RankedRule {
    pub rule: CompositeRule,

    /// Zero is the broadest composite.
    pub level: usize,

    /// Transitive closure of the included scenarios within the area.
    pub subsumed: BTreeSet<ScenarioId>,
}

/// Composite rules of one area grouped into levels, the broadest composites first.
///
/// A rule ranks above every rule whose composite scenario it includes. Within a level, rules are
/// ordered by their composite scenario, so the file order never matters.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct Precedence {
    levels: Vec<Vec<RankedRule>>,
}

impl Precedence {
    pub fn try_new(area: &AreaId, mut rules: Vec<CompositeRule>) -> Result<Self, ConfigError> {
        rules.sort_unstable_by(|lhs, rhs| lhs.composite.cmp(&rhs.composite));

        let index: HashMap<&ScenarioId, usize> =
            rules.iter().enumerate().map(|(i, rule)| (&rule.composite, i)).collect();

        // Edge `i → j` means that rule `i` includes the composite scenario of rule `j`:
        let successors = rules
            .iter()
            .map(|rule| {
                rule.includes.iter().filter_map(|scenario| index.get(scenario).copied()).collect_vec()
            })
            .collect_vec();

        let levels = Self::rank(&successors);
        if levels.len() != rules.len() {
            let scenarios = rules
                .iter()
                .enumerate()
                .filter(|(i, _)| !levels.contains_key(i))
                .map(|(_, rule)| rule.composite.clone())
                .collect();
            return Err(ConfigError::CyclicComposite { area: area.clone(), scenarios });
        }

        let mut subsumed = vec![BTreeSet::new(); rules.len()];
        for i in (0..rules.len()).sorted_unstable_by_key(|i| Reverse(levels[i])) {
            let mut closure = rules[i].includes.clone();
            for &j in &successors[i] {
                closure.extend(subsumed[j].iter().cloned());
            }
            subsumed[i] = closure;
        }

        let n_levels = levels.values().max().map_or(0, |level| level + 1);
        let mut ranked = vec![Vec::new(); n_levels];
        for (i, (rule, subsumed)) in rules.into_iter().zip(subsumed).enumerate() {
            let level = levels[&i];
            ranked[level].push(RankedRule { rule, level, subsumed });
        }
        Ok(Self { levels: ranked })
    }

    /// Layered Kahn's algorithm: a rule lands one level below its deepest including rule.
    ///
    /// Rules stuck on a cycle never reach zero in-degree and are left out.
    fn rank(successors: &[Vec<usize>]) -> HashMap<usize, usize> {
        let mut in_degrees = vec![0_usize; successors.len()];
        for &j in successors.iter().flatten() {
            in_degrees[j] += 1;
        }

        let mut levels = HashMap::with_capacity(successors.len());
        let mut current = (0..successors.len()).filter(|&i| in_degrees[i] == 0).collect_vec();
        let mut level = 0;
        while !current.is_empty() {
            let mut next = Vec::new();
            for i in current {
                levels.insert(i, level);
                for &j in &successors[i] {
                    in_degrees[j] -= 1;
                    if in_degrees[j] == 0 {
                        next.push(j);
                    }
                }
            }
            current = next;
            level += 1;
        }
        levels
    }

    pub fn levels(&self) -> &[Vec<RankedRule>] {
        &self.levels
    }

    pub fn rules(&self) -> impl Iterator<Item = &RankedRule> {
        self.levels.iter().flatten()
    }

    pub fn rule(&self, composite: &ScenarioId) -> Option<&RankedRule> {
        self.rules().find(|ranked| ranked.rule.composite == *composite)
    }
}
