//! Seed decomposition for composite parameters.
//!
//! Lists, tuples and permutations need an index from `0..bound` where
//! `bound` can be far larger than a single pick should be combined over.
//! [`Seeds::next`] splits such bounds into factors: the first factor is the
//! parameter's primary combined pick, the remaining ones are independent
//! trailing picks. Pocketed seeds first draw from a per-run pocket seed so
//! that the members of a pocket are fully cross-combined.
//!
//! ```
//! use lazypair::{SeedSession, Seeds, SessionConfig};
//!
//! let config = SessionConfig::default();
//! let mut seeds = SeedSession::new();
//! seeds.declare_pocket("grid", 6)?;
//! let mut cells = Vec::new();
//! loop {
//!     seeds.start_new_run()?;
//!     let mut row = Seeds::pocketed("row", "grid", &config);
//!     let mut col = Seeds::pocketed("col", "grid", &config);
//!     cells.push((row.next(&mut seeds, 2)?, col.next(&mut seeds, 3)?));
//!     if !seeds.has_pending_combinations()? {
//!         break;
//!     }
//! }
//! cells.sort_unstable();
//! cells.dedup();
//! assert_eq!(cells.len(), 6);
//! # Ok::<(), lazypair::PairwiseError>(())
//! ```

use crate::config::{SessionConfig, MAX_DOMAIN_SIZE};
use crate::registry::Identity;
use crate::result::{PairwiseError, PairwiseResult};
use crate::session::Session;
use std::collections::HashMap;

/// Part a seed pick plays for its base identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedRole {
    /// First decomposition, pairwise-combined
    Primary,
    /// Later decompositions, numbered from 1 within a run
    Trailing(u16),
    /// Per-run seed of a pocket
    Pocket,
}

/// Identity handed to the core for a seed pick
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeedId<I> {
    /// Identity of the composite parameter or pocket
    pub base: I,
    /// Role of this pick
    pub role: SeedRole,
}

impl<I> SeedId<I> {
    const fn new(base: I, role: SeedRole) -> Self {
        Self { base, role }
    }
}

#[derive(Debug, Clone, Copy)]
struct PocketState {
    capacity: u16,
    seed: Option<u32>,
    /// Product of the bounds allocated from the seed this run
    product: u64,
}

impl PocketState {
    const fn new(capacity: u16) -> Self {
        Self {
            capacity,
            seed: None,
            product: 1,
        }
    }
}

/// Session that also tracks pockets
#[derive(Debug)]
pub struct SeedSession<I> {
    session: Session<SeedId<I>>,
    pockets: HashMap<I, PocketState>,
}

impl<I: Identity> Default for SeedSession<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Identity> SeedSession<I> {
    /// Create with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create with `config`
    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            session: Session::with_config(config),
            pockets: HashMap::new(),
        }
    }

    /// Underlying session
    #[must_use]
    pub const fn session(&self) -> &Session<SeedId<I>> {
        &self.session
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        self.session.config()
    }

    /// Declare a pocket whose members share a sub-domain of `capacity` values
    ///
    /// Each run draws one combined seed in `0..capacity` and members take
    /// mixed-radix digits of it. `capacity` should equal the product of the
    /// member bounds: a larger capacity costs one run per surplus seed value
    /// that only repeats earlier cells.
    pub fn declare_pocket(&mut self, id: I, capacity: u16) -> PairwiseResult<()> {
        if capacity == 0 || capacity > MAX_DOMAIN_SIZE {
            return Err(PairwiseError::DomainSize {
                size: u32::from(capacity),
            });
        }
        self.pockets.insert(id, PocketState::new(capacity));
        Ok(())
    }

    /// Begin a run and reset every pocket
    pub fn start_new_run(&mut self) -> PairwiseResult<()> {
        self.session.start_new_run()?;
        for state in self.pockets.values_mut() {
            *state = PocketState::new(state.capacity);
        }
        Ok(())
    }

    /// Scalar pick alongside the seeds
    pub fn pick(&mut self, id: I, combine: bool, domain_size: u16) -> PairwiseResult<u16> {
        self.session
            .pick(SeedId::new(id, SeedRole::Primary), combine, domain_size)
    }

    /// Whether another run is needed
    pub fn has_pending_combinations(&mut self) -> PairwiseResult<bool> {
        self.session.has_pending_combinations()
    }
}

/// Decomposition state of one composite parameter within a run
#[derive(Debug, Clone)]
pub struct SeedCursor<I> {
    base: I,
    threshold: u32,
    primary_taken: bool,
    trailing: u16,
}

impl<I: Identity> SeedCursor<I> {
    const fn new(base: I, threshold: u32) -> Self {
        Self {
            base,
            threshold,
            primary_taken: false,
            trailing: 0,
        }
    }

    fn independent(&mut self, session: &mut Session<SeedId<I>>, bound: u32) -> PairwiseResult<u32> {
        if bound <= 1 {
            return Ok(0);
        }
        if let Ok(size) = u16::try_from(bound) {
            if size <= MAX_DOMAIN_SIZE {
                self.trailing = self.trailing.wrapping_add(1);
                let id = SeedId::new(self.base.clone(), SeedRole::Trailing(self.trailing));
                return session.pick(id, false, size).map(u32::from);
            }
        }
        let factor = largest_factor_at_most(bound, u32::from(MAX_DOMAIN_SIZE))
            .ok_or(PairwiseError::BoundTooLarge { bound })?;
        let low = self.independent(session, factor)?;
        let high = self.independent(session, bound / factor)?;
        Ok(low + factor * high)
    }

    fn pairwise(&mut self, session: &mut Session<SeedId<I>>, bound: u32) -> PairwiseResult<u32> {
        if self.primary_taken {
            return self.independent(session, bound);
        }
        if bound <= self.threshold {
            self.primary_taken = true;
            let id = SeedId::new(self.base.clone(), SeedRole::Primary);
            // threshold never exceeds the domain cap
            let size = u16::try_from(bound).map_err(|_| PairwiseError::DomainSize { size: bound })?;
            return session.pick(id, true, size).map(u32::from);
        }
        match largest_factor_at_most(bound, self.threshold) {
            Some(factor) => {
                let low = self.pairwise(session, factor)?;
                let high = self.independent(session, bound / factor)?;
                Ok(low + factor * high)
            }
            None => self.independent(session, bound),
        }
    }
}

/// Seed consumer of one composite parameter, built fresh for every run
#[derive(Debug, Clone)]
pub enum Seeds<I> {
    /// Independent uncombined picks only
    Plain(SeedCursor<I>),
    /// Primary combined pick, then independent trailing picks
    Pairwise(SeedCursor<I>),
    /// Cartesian allocation from a pocket seed, then pairwise
    Pocketed {
        /// Pocket to draw from
        pocket: I,
        /// Fallback once the pocket is used up
        cursor: SeedCursor<I>,
    },
}

impl<I: Identity> Seeds<I> {
    /// Independent seeds for `id`
    #[must_use]
    pub const fn plain(id: I) -> Self {
        Self::Plain(SeedCursor::new(id, u32::MAX))
    }

    /// Pairwise seeds for `id`
    #[must_use]
    pub fn pairwise(id: I, config: &SessionConfig) -> Self {
        Self::Pairwise(SeedCursor::new(id, config.seeds.threshold()))
    }

    /// Seeds for `id` drawn from `pocket` while it has room
    #[must_use]
    pub fn pocketed(id: I, pocket: I, config: &SessionConfig) -> Self {
        Self::Pocketed {
            pocket,
            cursor: SeedCursor::new(id, config.seeds.threshold()),
        }
    }

    /// Index in `0..bound`
    pub fn next(&mut self, seeds: &mut SeedSession<I>, bound: u32) -> PairwiseResult<u32> {
        match bound {
            0 => return Err(PairwiseError::DomainSize { size: 0 }),
            1 => return Ok(0),
            _ => {}
        }
        let SeedSession { session, pockets } = seeds;
        match self {
            Self::Plain(cursor) => cursor.independent(session, bound),
            Self::Pairwise(cursor) => cursor.pairwise(session, bound),
            Self::Pocketed { pocket, cursor } => {
                let state = pockets
                    .get_mut(&*pocket)
                    .ok_or_else(|| PairwiseError::UnknownPocket {
                        pocket: format!("{pocket:?}"),
                    })?;
                let bound64 = u64::from(bound);
                if state.product * bound64 > u64::from(state.capacity) {
                    return cursor.pairwise(session, bound);
                }
                let seed = match state.seed {
                    Some(seed) => seed,
                    None => {
                        let id = SeedId::new(pocket.clone(), SeedRole::Pocket);
                        let seed = u32::from(session.pick(id, true, state.capacity)?);
                        state.seed = Some(seed);
                        seed
                    }
                };
                let digit = (u64::from(seed) / state.product) % bound64;
                state.product *= bound64;
                Ok(digit as u32)
            }
        }
    }
}

/// Largest divisor of `n` in `2..=limit`
#[must_use]
pub fn largest_factor_at_most(n: u32, limit: u32) -> Option<u32> {
    (2..=limit.min(n)).rev().find(|factor| n % factor == 0)
}
