//! Session coverage report.

use crate::result::PairwiseResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-definition pick counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionSummary {
    /// Debug rendering of the parameter identity
    pub id: String,
    /// Whether values are pairwise-combined
    pub combined: bool,
    /// Times each value was picked, by index
    pub value_counts: Vec<u64>,
}

/// Snapshot of a session's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Runs started
    pub runs: u64,
    /// Picks across all runs
    pub picks: u64,
    /// Definitions in registration order
    pub definitions: Vec<DefinitionSummary>,
    /// Pairwise obligations still unmet
    pub open_pairs: usize,
    /// Values never picked
    pub untouched_values: usize,
    /// Whether the last closed run left nothing pending
    pub complete: bool,
}

impl SessionSummary {
    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> PairwiseResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Smallest and largest pick count over all values of all definitions
    #[must_use]
    pub fn count_spread(&self) -> Option<(u64, u64)> {
        let mut counts = self
            .definitions
            .iter()
            .flat_map(|definition| definition.value_counts.iter().copied());
        let first = counts.next()?;
        Some(counts.fold((first, first), |(lo, hi), count| {
            (lo.min(count), hi.max(count))
        }))
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.complete { "complete" } else { "incomplete" };
        write!(
            f,
            "{} runs, {} picks, {} open pairs, {} untouched values ({status})",
            self.runs, self.picks, self.open_pairs, self.untouched_values
        )
    }
}
