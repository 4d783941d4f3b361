//! Session sequencer.
//!
//! A [`Session`] owns everything that lives across the runs of one
//! parametrized test: the value ledger, the parameter registry and the
//! crumb trail of the run in progress. Each run is
//! `start_new_run` → `pick`* → `has_pending_combinations`.
//!
//! ```
//! use lazypair::Session;
//!
//! let mut session = Session::new();
//! let mut runs = Vec::new();
//! loop {
//!     session.start_new_run()?;
//!     let a = session.pick("a", true, 2)?;
//!     let b = session.pick("b", true, 2)?;
//!     runs.push((a, b));
//!     if !session.has_pending_combinations()? {
//!         break;
//!     }
//! }
//! assert_eq!(runs.len(), 4);
//! # Ok::<(), lazypair::PairwiseError>(())
//! ```

use crate::config::{SessionConfig, MAX_DOMAIN_SIZE};
use crate::ledger::{ValueId, ValueLedger};
use crate::registry::{DefinitionId, DefinitionKey, Identity, NodeId, ParameterRegistry};
use crate::result::{PairwiseError, PairwiseResult};
use crate::scoring::{Choice, Crumb, Scorer};
use crate::summary::{DefinitionSummary, SessionSummary};
use tracing::{debug, info, trace, warn};

/// Multi-run combination session
#[derive(Debug)]
pub struct Session<I> {
    config: SessionConfig,
    ledger: ValueLedger,
    registry: ParameterRegistry<I>,
    trail: Vec<Crumb>,
    /// Prefix reached by the current run
    position: NodeId,
    runs: u64,
    picks: u64,
    run_closed: bool,
    poisoned: Option<String>,
    completion_logged: bool,
}

impl<I: Identity> Default for Session<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Identity> Session<I> {
    /// Create a session with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session with `config`
    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            ledger: ValueLedger::new(),
            registry: ParameterRegistry::new(),
            trail: Vec::new(),
            position: NodeId::ROOT,
            runs: 0,
            picks: 0,
            run_closed: false,
            poisoned: None,
            completion_logged: false,
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Value ledger
    #[must_use]
    pub const fn ledger(&self) -> &ValueLedger {
        &self.ledger
    }

    /// Parameter registry
    #[must_use]
    pub const fn registry(&self) -> &ParameterRegistry<I> {
        &self.registry
    }

    /// Runs started so far
    #[must_use]
    pub const fn run_count(&self) -> u64 {
        self.runs
    }

    /// Pairwise obligations still unmet
    #[must_use]
    pub const fn open_pairs(&self) -> usize {
        self.ledger.open_pairs()
    }

    /// Whether an inconsistency ended the session
    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Value indices picked so far in the current run
    #[must_use]
    pub fn crumb_trail(&self) -> Vec<u16> {
        self.trail
            .iter()
            .map(|crumb| self.ledger.get(crumb.value).index())
            .collect()
    }

    fn check_poisoned(&self) -> PairwiseResult<()> {
        match &self.poisoned {
            Some(cause) => Err(PairwiseError::SessionAborted {
                cause: cause.clone(),
            }),
            None => Ok(()),
        }
    }

    fn poison(&mut self, err: PairwiseError) -> PairwiseError {
        warn!(run = self.runs, error = %err, "session aborted");
        self.poisoned = Some(err.to_string());
        err
    }

    /// Begin a run, closing out the previous one if the caller did not ask
    /// for pending combinations
    pub fn start_new_run(&mut self) -> PairwiseResult<()> {
        self.check_poisoned()?;
        if self.runs > 0 && !self.run_closed {
            self.close_run()?;
        }
        self.trail.clear();
        self.position = NodeId::ROOT;
        self.runs += 1;
        self.run_closed = false;
        Ok(())
    }

    /// Choose an index in `0..domain_size` for parameter `id`
    pub fn pick(&mut self, id: I, combine: bool, domain_size: u16) -> PairwiseResult<u16> {
        self.check_poisoned()?;
        if domain_size == 0 || domain_size > MAX_DOMAIN_SIZE {
            return Err(self.poison(PairwiseError::DomainSize {
                size: u32::from(domain_size),
            }));
        }
        if self.runs == 0 || self.run_closed {
            self.start_new_run()?;
        }

        let key = DefinitionKey::new(id, combine, domain_size);
        let definition = match self
            .registry
            .admit_parameter(self.position, key, &mut self.ledger)
        {
            Ok(definition) => definition,
            Err(err) => return Err(self.poison(err)),
        };
        if combine {
            self.register_obligations(definition);
        }

        let choice = Scorer::new(
            &self.ledger,
            &self.registry,
            &self.config.parking,
            &self.trail,
        )
        .choose(self.position, definition);
        debug!(
            run = self.runs,
            parameter = ?self.registry.definition(definition).id(),
            index = choice.index,
            rule = ?choice.rule,
            "pick"
        );
        self.commit(choice);
        Ok(choice.index)
    }

    /// Open obligations between the combined values of this trail and the
    /// values of `definition`, once per upstream value
    fn register_obligations(&mut self, definition: DefinitionId) {
        let downstream: Vec<ValueId> = self.registry.definition(definition).values().collect();
        for crumb in &self.trail {
            let upstream = self.ledger.get_mut(crumb.value);
            if !upstream.combined || upstream.definition == definition {
                continue;
            }
            if !upstream.stats.acquainted.insert(definition.index()) {
                continue;
            }
            for &value in &downstream {
                if !self.ledger.pair_known(crumb.value, value) {
                    self.ledger.register_pair(crumb.value, value);
                }
            }
        }
    }

    fn commit(&mut self, choice: Choice) {
        self.ledger.record_pick(choice.value);
        if choice.parked {
            self.ledger.get_mut(choice.value).stats.parked += 1;
        }
        let picked = self.ledger.get(choice.value);
        if picked.combined {
            let definition = picked.definition;
            for crumb in &self.trail {
                let upstream = self.ledger.get(crumb.value);
                if upstream.combined && upstream.definition != definition {
                    self.ledger.meet(crumb.value, choice.value);
                }
            }
        }
        self.trail.push(Crumb {
            node: self.position,
            value: choice.value,
        });
        self.position = self.registry.child(self.position, choice.index);
        self.picks += 1;
    }

    /// Reserve the end of the current run and propagate dead ends
    fn close_run(&mut self) -> PairwiseResult<()> {
        if let Err(err) = self.registry.admit_end_of_run(self.position) {
            return Err(self.poison(err));
        }
        let mut below = self.position;
        for crumb in self.trail.iter().rev() {
            if !self.registry.is_exhausted(below) {
                break;
            }
            let index = self.ledger.get(crumb.value).index();
            trace!(
                crumbs = %self.registry.describe_crumbs(crumb.node),
                index,
                "end of line"
            );
            self.registry.mark_end_of_line(crumb.node, index);
            below = crumb.node;
        }
        self.run_closed = true;
        Ok(())
    }

    fn pending(&self) -> bool {
        !self.registry.is_exhausted(NodeId::ROOT)
            && (self.ledger.untouched() > 0 || self.ledger.open_pairs() > 0)
    }

    /// Whether another run is needed, closing out the current one
    pub fn has_pending_combinations(&mut self) -> PairwiseResult<bool> {
        self.check_poisoned()?;
        if self.runs == 0 {
            return Ok(true);
        }
        if !self.run_closed {
            self.close_run()?;
        }
        let pending = self.pending();
        if !pending && !self.completion_logged {
            self.completion_logged = true;
            info!(runs = self.runs, picks = self.picks, "all combinations covered");
        }
        Ok(pending)
    }

    /// Coverage report of the session so far
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let definitions = self
            .registry
            .definitions()
            .map(|definition| DefinitionSummary {
                id: format!("{:?}", definition.id()),
                combined: definition.is_combined(),
                value_counts: definition
                    .values()
                    .map(|value| self.ledger.get(value).stats().total_count())
                    .collect(),
            })
            .collect();
        SessionSummary {
            runs: self.runs,
            picks: self.picks,
            definitions,
            open_pairs: self.ledger.open_pairs(),
            untouched_values: self.ledger.untouched(),
            complete: self.runs > 0 && self.run_closed && !self.pending(),
        }
    }
}
