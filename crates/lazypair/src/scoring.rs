//! Value selection.
//!
//! Given the crumb trail of the current run, ranks the value options of the
//! parameter being picked. Each rule only breaks ties left by the rules
//! before it:
//!
//! 1. dead-end avoidance
//! 2. first touch, with primary-value parking for large parameters
//! 3. fewer stranded forward requests: obligations whose downstream
//!    definition already appears in this trail and so cannot be met later
//!    in the run. The raw forward-request count is not ranked here; it
//!    feeds the enabler counts of rules 5 and 6 instead.
//! 4. level-0 coverage score over the whole trail
//! 5. weighted enabler count
//! 6. raw enabler count, then coverage scores of deeper trail levels
//! 7. lower total count, then lower index

use crate::config::ParkingConfig;
use crate::counter_set::CounterSet;
use crate::ledger::{ValueId, ValueLedger};
use crate::registry::{DefinitionId, Identity, NodeId, ParameterRegistry};
use std::cmp::Ordering;

/// Budget shared by all trail positions of a coverage score
const SCORE_BUDGET: i64 = i32::MAX as i64;

/// Occurrences of one combined definition inside the parking window that
/// mark the window as used up
const PARKING_REPEAT_LIMIT: u32 = 3;

/// A value picked during the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crumb {
    /// Prefix the value was picked at
    pub node: NodeId,
    /// Picked value
    pub value: ValueId,
}

/// Rule that separated the winner from the runner-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Only one value to choose from
    OnlyOption,
    /// The others were dead ends
    DeadEnd,
    /// First touch or parking
    FirstTouch,
    /// Fewer stranded forward requests
    ForwardRequests,
    /// Level-0 coverage score
    Coverage,
    /// Weighted enabler count
    WeightedEnablers,
    /// Raw enabler count
    Enablers,
    /// Coverage score of a deeper trail level
    DeeperCoverage,
    /// Lower total count
    TotalCount,
    /// Lower index
    Index,
}

/// Outcome of ranking one parameter's values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    /// Chosen value
    pub value: ValueId,
    /// Index of the chosen value
    pub index: u16,
    /// Whether the value won as a parked primary
    pub parked: bool,
    /// Rule that decided
    pub rule: Rule,
}

#[derive(Debug)]
struct Candidate {
    value: ValueId,
    index: u16,
    dead_end: bool,
    /// 2 = parked primary, 1 = never picked, 0 = picked before
    tier: u8,
    stranded: usize,
    /// `levels[l]` sums the contributions of trail positions `l..`
    levels: Vec<i64>,
    weighted_enablers: f64,
    enablers: usize,
    total_count: u64,
}

impl Candidate {
    fn level0(&self) -> i64 {
        self.levels.first().copied().unwrap_or(0)
    }

    fn deeper_levels(&self) -> &[i64] {
        self.levels.get(1..).unwrap_or(&[])
    }

    /// How `self` ranks against `other`; `Greater` means `self` is better
    fn rank(&self, other: &Self) -> (Ordering, Rule) {
        let steps = [
            (other.dead_end.cmp(&self.dead_end), Rule::DeadEnd),
            (self.tier.cmp(&other.tier), Rule::FirstTouch),
            (other.stranded.cmp(&self.stranded), Rule::ForwardRequests),
            (self.level0().cmp(&other.level0()), Rule::Coverage),
        ];
        if let Some(step) = steps.into_iter().find(|(ordering, _)| ordering.is_ne()) {
            return step;
        }
        let ordering = self.weighted_enablers.total_cmp(&other.weighted_enablers);
        if ordering.is_ne() {
            return (ordering, Rule::WeightedEnablers);
        }
        let ordering = self.enablers.cmp(&other.enablers);
        if ordering.is_ne() {
            return (ordering, Rule::Enablers);
        }
        let ordering = self.deeper_levels().cmp(other.deeper_levels());
        if ordering.is_ne() {
            return (ordering, Rule::DeeperCoverage);
        }
        let ordering = other.total_count.cmp(&self.total_count);
        if ordering.is_ne() {
            return (ordering, Rule::TotalCount);
        }
        (other.index.cmp(&self.index), Rule::Index)
    }
}

/// Ranks the values of one definition against the current crumb trail
#[derive(Debug)]
pub(crate) struct Scorer<'a, I> {
    ledger: &'a ValueLedger,
    registry: &'a ParameterRegistry<I>,
    parking: &'a ParkingConfig,
    trail: &'a [Crumb],
}

impl<'a, I: Identity> Scorer<'a, I> {
    pub(crate) const fn new(
        ledger: &'a ValueLedger,
        registry: &'a ParameterRegistry<I>,
        parking: &'a ParkingConfig,
        trail: &'a [Crumb],
    ) -> Self {
        Self {
            ledger,
            registry,
            parking,
            trail,
        }
    }

    /// Choose a value of `definition` to pick at `node`
    pub(crate) fn choose(&self, node: NodeId, definition: DefinitionId) -> Choice {
        let def = self.registry.definition(definition);
        if def.value_count() == 1 {
            return Choice {
                value: def.value(0),
                index: 0,
                parked: false,
                rule: Rule::OnlyOption,
            };
        }

        let trail_definitions = self.trail_definitions();
        let any_untouched = def
            .values()
            .any(|value| self.ledger.get(value).stats().total_count() == 0);
        let parking_primary = any_untouched
            && def.is_combined()
            && self.parking.applies_to(def.value_count())
            && !self.registry.is_end_of_line(node, 0)
            && self.may_park(def.value(0), def.value_count());

        let candidates: Vec<Candidate> = def
            .values()
            .enumerate()
            .map(|(index, value)| {
                self.candidate(node, value, index as u16, parking_primary, &trail_definitions)
            })
            .collect();

        let mut best = &candidates[0];
        for candidate in &candidates[1..] {
            if candidate.rank(best).0 == Ordering::Greater {
                best = candidate;
            }
        }
        let rule = candidates
            .iter()
            .filter(|other| other.index != best.index)
            .map(|other| best.rank(other).1)
            .max_by_key(|rule| *rule as u8)
            .unwrap_or(Rule::OnlyOption);

        Choice {
            value: best.value,
            index: best.index,
            parked: best.tier == 2,
            rule,
        }
    }

    fn trail_definitions(&self) -> CounterSet {
        let mut definitions = CounterSet::new();
        for crumb in self.trail {
            definitions.increment(self.ledger.get(crumb.value).definition().index());
        }
        definitions
    }

    /// Whether a primary value may still stand in for its siblings
    fn may_park(&self, primary: ValueId, value_count: u16) -> bool {
        let stats = self.ledger.get(primary).stats();
        if stats.total_count() == 0 {
            return false;
        }
        let window = self.parking.lookback(value_count, stats.parked());
        if stats.parked() as usize >= window {
            return false;
        }
        let mut seen = CounterSet::new();
        for crumb in self.trail.iter().rev().take(window) {
            let info = self.ledger.get(crumb.value);
            if info.is_combined()
                && seen.increment(info.definition().index()) >= PARKING_REPEAT_LIMIT
            {
                return false;
            }
        }
        true
    }

    fn candidate(
        &self,
        node: NodeId,
        value: ValueId,
        index: u16,
        parking_primary: bool,
        trail_definitions: &CounterSet,
    ) -> Candidate {
        let info = self.ledger.get(value);
        let stats = info.stats();
        let tier = if index == 0 && parking_primary {
            2
        } else if stats.total_count() == 0 {
            1
        } else {
            0
        };
        let stranded = stats
            .forward_requests
            .iter()
            .filter(|&partner| {
                let partner = self.ledger.get(ValueId::from_slot(partner));
                trail_definitions.contains(partner.definition().index())
            })
            .count();
        let (weighted_enablers, enablers) = if info.is_combined() {
            let open = stats.forward_request_count() + stats.enabler_count();
            (open as f64, stats.enabler_count())
        } else {
            (0.5_f64.powi(stats.total_count().min(1023) as i32), 0)
        };

        Candidate {
            value,
            index,
            dead_end: self.registry.is_end_of_line(node, index),
            tier,
            stranded,
            levels: self.levels(value),
            weighted_enablers,
            enablers,
            total_count: stats.total_count(),
        }
    }

    /// Coverage score of `value` for every trail level
    fn levels(&self, value: ValueId) -> Vec<i64> {
        let info = self.ledger.get(value);
        let mut levels = vec![0_i64; self.trail.len()];
        if !info.is_combined() || self.trail.is_empty() {
            return levels;
        }
        let weight = SCORE_BUDGET / self.trail.len() as i64;
        let mut sum = 0_i64;
        for (position, crumb) in self.trail.iter().enumerate().rev() {
            let upstream = self.ledger.get(crumb.value);
            if upstream.is_combined() && upstream.definition() != info.definition() {
                sum += if self.ledger.is_pending(crumb.value, value) {
                    weight
                } else {
                    -i64::from(upstream.stats().met_count(value))
                };
            }
            levels[position] = sum;
        }
        levels
    }
}
