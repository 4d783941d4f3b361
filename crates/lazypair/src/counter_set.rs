//! Dense integer-keyed counters.
//!
//! `CounterSet` replaces `HashSet<usize>` and `HashMap<usize, u32>` over
//! arena handles. Lookup, increment and removal are O(1). Iteration follows
//! insertion order, disturbed only by swap-removal, so it is deterministic
//! for a deterministic sequence of operations.

/// Sparse set of `usize` keys, each carrying a counter
#[derive(Debug, Clone, Default)]
pub struct CounterSet {
    /// Position in `members` plus one, indexed by key; zero when absent
    slots: Vec<u32>,
    members: Vec<usize>,
    counts: Vec<u32>,
}

impl CounterSet {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            members: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no key is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn position(&self, key: usize) -> Option<usize> {
        match self.slots.get(key) {
            Some(&slot) if slot > 0 => Some(slot as usize - 1),
            _ => None,
        }
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains(&self, key: usize) -> bool {
        self.position(key).is_some()
    }

    /// Counter of `key`, zero when absent
    #[must_use]
    pub fn count(&self, key: usize) -> u32 {
        self.position(key).map_or(0, |pos| self.counts[pos])
    }

    /// Add one to the counter of `key`, inserting it when absent.
    /// Returns the new count.
    pub fn increment(&mut self, key: usize) -> u32 {
        if let Some(pos) = self.position(key) {
            self.counts[pos] += 1;
            return self.counts[pos];
        }
        if key >= self.slots.len() {
            self.slots.resize(key + 1, 0);
        }
        self.members.push(key);
        self.counts.push(1);
        self.slots[key] = self.members.len() as u32;
        1
    }

    /// Insert `key` with a count of one. Returns false if already present.
    pub fn insert(&mut self, key: usize) -> bool {
        if self.contains(key) {
            return false;
        }
        self.increment(key);
        true
    }

    /// Remove `key` regardless of its count. Returns false if absent.
    pub fn remove(&mut self, key: usize) -> bool {
        let Some(pos) = self.position(key) else {
            return false;
        };
        self.members.swap_remove(pos);
        self.counts.swap_remove(pos);
        if let Some(&moved) = self.members.get(pos) {
            self.slots[moved] = pos as u32 + 1;
        }
        self.slots[key] = 0;
        true
    }

    /// Keys in iteration order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }
}
