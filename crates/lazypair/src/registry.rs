//! Parameter registry.
//!
//! Maps `(identity, combine, value count)` keys to their definitions and
//! remembers, for every crumb-trail prefix reached so far, what the test
//! introduced there: a parameter, or the end of the run. Prefixes are
//! interned as nodes of a tree so a prefix key is one integer.

use crate::counter_set::CounterSet;
use crate::ledger::{ValueId, ValueLedger};
use crate::result::{PairwiseError, PairwiseResult};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Caller-supplied parameter identity
///
/// The same logical parameter must supply an equal identity on every run.
pub trait Identity: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> Identity for T {}

/// Dense handle of a registered definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(u32);

impl DefinitionId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Registration order of this definition
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural identity of a parameter definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionKey<I> {
    /// Caller-supplied identity
    pub id: I,
    /// Whether values must be pairwise-combined with other parameters
    pub combine: bool,
    /// Number of values
    pub value_count: u16,
}

impl<I: Identity> DefinitionKey<I> {
    /// Create a key
    #[must_use]
    pub const fn new(id: I, combine: bool, value_count: u16) -> Self {
        Self {
            id,
            combine,
            value_count,
        }
    }

    /// Site description used in inconsistency reports
    #[must_use]
    pub fn describe(&self) -> String {
        let mode = if self.combine { "combined" } else { "uncombined" };
        let plural = if self.value_count == 1 { "" } else { "s" };
        format!("{:?} ({mode}, {} value{plural})", self.id, self.value_count)
    }
}

/// A registered parameter definition and its slice of the value ledger
#[derive(Debug, Clone)]
pub struct Definition<I> {
    key: DefinitionKey<I>,
    first_value: ValueId,
}

impl<I: Identity> Definition<I> {
    /// Structural key
    #[must_use]
    pub const fn key(&self) -> &DefinitionKey<I> {
        &self.key
    }

    /// Caller-supplied identity
    #[must_use]
    pub const fn id(&self) -> &I {
        &self.key.id
    }

    /// Whether values are pairwise-combined
    #[must_use]
    pub const fn is_combined(&self) -> bool {
        self.key.combine
    }

    /// Number of values
    #[must_use]
    pub const fn value_count(&self) -> u16 {
        self.key.value_count
    }

    /// Ledger handle of the value at `index`
    #[must_use]
    pub const fn value(&self, index: u16) -> ValueId {
        ValueId::from_slot(self.first_value.slot() + index as usize)
    }

    /// Ledger handles of all values, by index
    pub fn values(&self) -> impl Iterator<Item = ValueId> {
        let first = self.first_value.slot();
        (first..first + self.key.value_count as usize).map(ValueId::from_slot)
    }
}

/// Interned crumb-trail prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The empty prefix every run starts from
    pub const ROOT: Self = Self(0);

    const fn slot(self) -> usize {
        self.0 as usize
    }
}

/// What a prefix introduced the first time it was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Introduction {
    /// The test asked for this parameter next
    Parameter(DefinitionId),
    /// The run ended here
    EndOfRun,
}

#[derive(Debug, Default)]
struct CrumbNode {
    /// Parent prefix and the value index picked there
    parent: Option<(NodeId, u16)>,
    introduction: Option<Introduction>,
    /// Value indices after which nothing new is reachable from this prefix
    end_of_line: CounterSet,
}

/// Registry of definitions and of what each prefix introduced
#[derive(Debug)]
pub struct ParameterRegistry<I> {
    definitions: Vec<Definition<I>>,
    by_key: HashMap<DefinitionKey<I>, DefinitionId>,
    nodes: Vec<CrumbNode>,
    children: HashMap<(NodeId, u16), NodeId>,
}

impl<I: Identity> Default for ParameterRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Identity> ParameterRegistry<I> {
    /// Create a registry holding only the root prefix
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            by_key: HashMap::new(),
            nodes: vec![CrumbNode::default()],
            children: HashMap::new(),
        }
    }

    /// Look up a definition
    #[must_use]
    pub fn definition(&self, id: DefinitionId) -> &Definition<I> {
        &self.definitions[id.index()]
    }

    /// All definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &Definition<I>> {
        self.definitions.iter()
    }

    /// Definition registered under `key`, if any
    #[must_use]
    pub fn lookup(&self, key: &DefinitionKey<I>) -> Option<DefinitionId> {
        self.by_key.get(key).copied()
    }

    fn resolve(&mut self, key: DefinitionKey<I>, ledger: &mut ValueLedger) -> DefinitionId {
        if let Some(id) = self.lookup(&key) {
            return id;
        }
        let id = DefinitionId::from_index(self.definitions.len());
        let first_value = ledger.allocate(id, key.combine, key.value_count);
        self.by_key.insert(key.clone(), id);
        self.definitions.push(Definition { key, first_value });
        id
    }

    /// What `node` introduced, if it was ever reached
    #[must_use]
    pub fn introduction(&self, node: NodeId) -> Option<Introduction> {
        self.nodes[node.slot()].introduction
    }

    /// Resolve `key` as the parameter introduced at `node`.
    ///
    /// Fails without touching the ledger when `node` introduced something
    /// else on an earlier run.
    pub fn admit_parameter(
        &mut self,
        node: NodeId,
        key: DefinitionKey<I>,
        ledger: &mut ValueLedger,
    ) -> PairwiseResult<DefinitionId> {
        match self.introduction(node) {
            None => {
                let id = self.resolve(key, ledger);
                self.nodes[node.slot()].introduction = Some(Introduction::Parameter(id));
                Ok(id)
            }
            Some(Introduction::Parameter(id)) if self.lookup(&key) == Some(id) => Ok(id),
            Some(original) => Err(self.conflict(node, original, key.describe())),
        }
    }

    /// Reserve `node` as the end of a run
    pub fn admit_end_of_run(&mut self, node: NodeId) -> PairwiseResult<()> {
        match self.introduction(node) {
            None => {
                self.nodes[node.slot()].introduction = Some(Introduction::EndOfRun);
                Ok(())
            }
            Some(Introduction::EndOfRun) => Ok(()),
            Some(original) => Err(self.conflict(node, original, "end of run".to_string())),
        }
    }

    fn conflict(&self, node: NodeId, original: Introduction, conflicting: String) -> PairwiseError {
        PairwiseError::InconsistentRepetition {
            crumbs: self.describe_crumbs(node),
            original: self.describe_introduction(original),
            conflicting,
        }
    }

    fn describe_introduction(&self, introduction: Introduction) -> String {
        match introduction {
            Introduction::Parameter(id) => self.definition(id).key.describe(),
            Introduction::EndOfRun => "end of run".to_string(),
        }
    }

    /// Prefix reached by picking `index` at `node`
    pub fn child(&mut self, node: NodeId, index: u16) -> NodeId {
        if let Some(&child) = self.children.get(&(node, index)) {
            return child;
        }
        let child = NodeId(self.nodes.len() as u32);
        self.nodes.push(CrumbNode {
            parent: Some((node, index)),
            ..CrumbNode::default()
        });
        self.children.insert((node, index), child);
        child
    }

    /// Value indices picked from the root down to `node`
    #[must_use]
    pub fn crumbs(&self, node: NodeId) -> Vec<u16> {
        let mut crumbs = Vec::new();
        let mut cursor = node;
        while let Some((parent, index)) = self.nodes[cursor.slot()].parent {
            crumbs.push(index);
            cursor = parent;
        }
        crumbs.reverse();
        crumbs
    }

    /// Render the prefix of `node` for diagnostics
    #[must_use]
    pub fn describe_crumbs(&self, node: NodeId) -> String {
        format!("{:?}", self.crumbs(node))
    }

    /// Record that picking `index` at `node` cannot yield anything new
    pub fn mark_end_of_line(&mut self, node: NodeId, index: u16) {
        self.nodes[node.slot()].end_of_line.insert(index as usize);
    }

    /// Whether picking `index` at `node` is a recorded dead end
    #[must_use]
    pub fn is_end_of_line(&self, node: NodeId, index: u16) -> bool {
        self.nodes[node.slot()].end_of_line.contains(index as usize)
    }

    /// Whether nothing new is reachable from `node` at all
    #[must_use]
    pub fn is_exhausted(&self, node: NodeId) -> bool {
        let state = &self.nodes[node.slot()];
        match state.introduction {
            None => false,
            Some(Introduction::EndOfRun) => true,
            Some(Introduction::Parameter(id)) => {
                state.end_of_line.len() >= self.definition(id).value_count() as usize
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn key(id: &'static str, count: u16) -> DefinitionKey<&'static str> {
        DefinitionKey::new(id, true, count)
    }

    mod definition_tests {
        use super::*;

        #[test]
        fn test_resolve_is_structural() {
            let mut ledger = ValueLedger::new();
            let mut registry = ParameterRegistry::new();
            let a = registry.admit_parameter(NodeId::ROOT, key("a", 2), &mut ledger).unwrap();
            let node = registry.child(NodeId::ROOT, 0);
            let b = registry.admit_parameter(node, key("a", 3), &mut ledger).unwrap();
            let other = registry.child(NodeId::ROOT, 1);
            let again = registry.admit_parameter(other, key("a", 2), &mut ledger).unwrap();
            assert_ne!(a, b);
            assert_eq!(a, again);
            assert_eq!(ledger.len(), 5);
            assert_eq!(registry.definitions().count(), 2);
        }

        #[test]
        fn test_values_are_ledger_slices() {
            let mut ledger = ValueLedger::new();
            let mut registry = ParameterRegistry::new();
            let id = registry.admit_parameter(NodeId::ROOT, key("a", 3), &mut ledger).unwrap();
            let definition = registry.definition(id);
            let values: Vec<_> = definition.values().collect();
            assert_eq!(values.len(), 3);
            assert_eq!(definition.value(2), values[2]);
            assert_eq!(ledger.get(values[1]).index(), 1);
        }

        #[test]
        fn test_describe() {
            assert_eq!(key("a", 2).describe(), "\"a\" (combined, 2 values)");
            assert_eq!(
                DefinitionKey::new("u", false, 1).describe(),
                "\"u\" (uncombined, 1 value)"
            );
        }
    }

    mod introduction_tests {
        use super::*;

        #[test]
        fn test_conflicting_parameter_is_reported_without_allocation() {
            let mut ledger = ValueLedger::new();
            let mut registry = ParameterRegistry::new();
            registry.admit_parameter(NodeId::ROOT, key("a", 2), &mut ledger).unwrap();
            let err = registry
                .admit_parameter(NodeId::ROOT, key("b", 2), &mut ledger)
                .unwrap_err();
            match err {
                PairwiseError::InconsistentRepetition {
                    crumbs,
                    original,
                    conflicting,
                } => {
                    assert_eq!(crumbs, "[]");
                    assert!(original.contains("\"a\""));
                    assert!(conflicting.contains("\"b\""));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(ledger.len(), 2);
        }

        #[test]
        fn test_end_of_run_conflicts_with_parameter() {
            let mut ledger = ValueLedger::new();
            let mut registry = ParameterRegistry::new();
            let node = registry.child(NodeId::ROOT, 0);
            registry.admit_parameter(node, key("a", 2), &mut ledger).unwrap();
            assert!(registry.admit_end_of_run(node).is_err());

            let other = registry.child(NodeId::ROOT, 1);
            registry.admit_end_of_run(other).unwrap();
            registry.admit_end_of_run(other).unwrap();
            let err = registry
                .admit_parameter(other, key("a", 2), &mut ledger)
                .unwrap_err();
            assert!(err.to_string().contains("end of run"));
            assert!(err.to_string().contains("[1]"));
        }
    }

    mod end_of_line_tests {
        use super::*;

        #[test]
        fn test_unreached_node_is_not_exhausted() {
            let mut registry: ParameterRegistry<&str> = ParameterRegistry::new();
            assert!(!registry.is_exhausted(NodeId::ROOT));
            let node = registry.child(NodeId::ROOT, 4);
            assert!(!registry.is_exhausted(node));
            registry.admit_end_of_run(node).unwrap();
            assert!(registry.is_exhausted(node));
        }

        #[test]
        fn test_parameter_node_exhausted_when_every_value_dead() {
            let mut ledger = ValueLedger::new();
            let mut registry = ParameterRegistry::new();
            registry.admit_parameter(NodeId::ROOT, key("a", 2), &mut ledger).unwrap();
            registry.mark_end_of_line(NodeId::ROOT, 1);
            assert!(registry.is_end_of_line(NodeId::ROOT, 1));
            assert!(!registry.is_end_of_line(NodeId::ROOT, 0));
            assert!(!registry.is_exhausted(NodeId::ROOT));
            registry.mark_end_of_line(NodeId::ROOT, 1);
            assert!(!registry.is_exhausted(NodeId::ROOT));
            registry.mark_end_of_line(NodeId::ROOT, 0);
            assert!(registry.is_exhausted(NodeId::ROOT));
        }

        #[test]
        fn test_crumbs_follow_parents() {
            let mut registry: ParameterRegistry<&str> = ParameterRegistry::new();
            let first = registry.child(NodeId::ROOT, 2);
            let second = registry.child(first, 0);
            assert_eq!(registry.child(NodeId::ROOT, 2), first);
            assert_eq!(registry.crumbs(second), vec![2, 0]);
            assert_eq!(registry.describe_crumbs(second), "[2, 0]");
            assert_eq!(registry.crumbs(first), vec![2]);
        }
    }
}
