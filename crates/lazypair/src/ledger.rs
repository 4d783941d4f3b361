//! Value ledger: the append-only arena of value options.
//!
//! Every value a parameter definition can take gets one [`ValueInfo`] slot
//! for the whole session. Pairwise obligations between combined values are
//! kept on both sides as [`CounterSet`]s keyed by [`ValueId`] slots, so the
//! ledger never holds references between records.

use crate::counter_set::CounterSet;
use crate::registry::DefinitionId;

/// Dense handle of a value option in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u32);

impl ValueId {
    pub(crate) const fn from_slot(slot: usize) -> Self {
        Self(slot as u32)
    }

    /// Arena slot of this value
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Coverage statistics of one value option
#[derive(Debug, Clone, Default)]
pub struct ValueStats {
    pub(crate) total_count: u64,
    /// Downstream partners this value still has to meet
    pub(crate) forward_requests: CounterSet,
    /// Upstream partners still waiting to meet this value
    pub(crate) pending_combos: CounterSet,
    /// How often this value met each combined partner
    pub(crate) satisfied_combo_counts: CounterSet,
    /// Definitions whose values were registered as partners
    pub(crate) acquainted: CounterSet,
    /// Times this primary value was parked as a stand-in
    pub(crate) parked: u32,
}

impl ValueStats {
    /// Times this value has been picked across all runs
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Pending pairs in which this value is the upstream side
    #[must_use]
    pub fn forward_request_count(&self) -> usize {
        self.forward_requests.len()
    }

    /// Pending pairs in which this value is the downstream side
    #[must_use]
    pub fn enabler_count(&self) -> usize {
        self.pending_combos.len()
    }

    /// Times this value was picked alongside `partner`
    #[must_use]
    pub fn met_count(&self, partner: ValueId) -> u32 {
        self.satisfied_combo_counts.count(partner.slot())
    }

    /// Times this primary value was kept as a parked stand-in
    #[must_use]
    pub const fn parked(&self) -> u32 {
        self.parked
    }
}

/// One value option of a parameter definition
#[derive(Debug, Clone)]
pub struct ValueInfo {
    pub(crate) definition: DefinitionId,
    pub(crate) index: u16,
    pub(crate) combined: bool,
    pub(crate) stats: ValueStats,
}

impl ValueInfo {
    /// Definition owning this value
    #[must_use]
    pub const fn definition(&self) -> DefinitionId {
        self.definition
    }

    /// Index of this value within its definition
    #[must_use]
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Whether the owning definition is pairwise-combined
    #[must_use]
    pub const fn is_combined(&self) -> bool {
        self.combined
    }

    /// Coverage statistics
    #[must_use]
    pub const fn stats(&self) -> &ValueStats {
        &self.stats
    }
}

/// Append-only arena of value options
#[derive(Debug, Default)]
pub struct ValueLedger {
    values: Vec<ValueInfo>,
    untouched: usize,
    open_pairs: usize,
}

impl ValueLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `count` values owned by `definition`, returning the first slot
    pub(crate) fn allocate(&mut self, definition: DefinitionId, combined: bool, count: u16) -> ValueId {
        let first = ValueId::from_slot(self.values.len());
        self.values.reserve(count as usize);
        for index in 0..count {
            self.values.push(ValueInfo {
                definition,
                index,
                combined,
                stats: ValueStats::default(),
            });
        }
        self.untouched += count as usize;
        first
    }

    /// Number of value options
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the ledger holds no values
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, id: ValueId) -> &ValueInfo {
        &self.values[id.slot()]
    }

    pub(crate) fn get_mut(&mut self, id: ValueId) -> &mut ValueInfo {
        &mut self.values[id.slot()]
    }

    /// Values never picked so far
    #[must_use]
    pub const fn untouched(&self) -> usize {
        self.untouched
    }

    /// Pairwise obligations still unmet
    #[must_use]
    pub const fn open_pairs(&self) -> usize {
        self.open_pairs
    }

    /// Count one more pick of `id`
    pub(crate) fn record_pick(&mut self, id: ValueId) {
        let stats = &mut self.values[id.slot()].stats;
        if stats.total_count == 0 {
            self.untouched -= 1;
        }
        stats.total_count += 1;
    }

    /// Whether the pair is pending, in either orientation
    #[must_use]
    pub fn is_pending(&self, a: ValueId, b: ValueId) -> bool {
        let stats = &self.get(a).stats;
        stats.forward_requests.contains(b.slot()) || stats.pending_combos.contains(b.slot())
    }

    /// Whether the pair is pending or was met already
    #[must_use]
    pub fn pair_known(&self, a: ValueId, b: ValueId) -> bool {
        self.is_pending(a, b) || self.get(a).stats.satisfied_combo_counts.contains(b.slot())
    }

    /// Open a pairwise obligation between an upstream and a downstream value
    pub(crate) fn register_pair(&mut self, upstream: ValueId, downstream: ValueId) {
        if self.values[upstream.slot()]
            .stats
            .forward_requests
            .insert(downstream.slot())
        {
            self.values[downstream.slot()]
                .stats
                .pending_combos
                .insert(upstream.slot());
            self.open_pairs += 1;
        }
    }

    /// Record that `a` and `b` were picked in the same run.
    /// Returns true when this closed a pending obligation.
    pub(crate) fn meet(&mut self, a: ValueId, b: ValueId) -> bool {
        self.values[a.slot()]
            .stats
            .satisfied_combo_counts
            .increment(b.slot());
        self.values[b.slot()]
            .stats
            .satisfied_combo_counts
            .increment(a.slot());
        let closed = self.close_pair(a, b) || self.close_pair(b, a);
        if closed {
            self.open_pairs -= 1;
        }
        closed
    }

    fn close_pair(&mut self, upstream: ValueId, downstream: ValueId) -> bool {
        if self.values[upstream.slot()]
            .stats
            .forward_requests
            .remove(downstream.slot())
        {
            self.values[downstream.slot()]
                .stats
                .pending_combos
                .remove(upstream.slot());
            true
        } else {
            false
        }
    }
}
