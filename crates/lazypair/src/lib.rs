//! Lazypair: lazy pairwise combination of test parameters
//!
//! A parametrized test runs repeatedly. On every run it asks the engine for
//! an index per parameter, in whatever order its own control flow reaches
//! them, and after the run asks whether another one is needed. The engine
//! never sees the parameter list upfront. It learns it run by run and picks
//! values so that every pair of values of two combined parameters meets in
//! some run, while uncombined parameters only need each value once.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        Session                                │
//! │  start_new_run ──► pick* ──► has_pending_combinations         │
//! ├───────────────────────────────────────────────────────────────┤
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │   │  Parameter   │   │   Scorer     │   │ Value Ledger │      │
//! │   │  Registry    │──►│ (rule chain) │◄──│  (arena of   │      │
//! │   │ (crumb tree) │   │              │   │  ValueStats) │      │
//! │   └──────────────┘   └──────────────┘   └──────────────┘      │
//! ├───────────────────────────────────────────────────────────────┤
//! │  Seeds: composite bounds → primary / trailing / pocket picks  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use lazypair::Session;
//!
//! let mut session = Session::new();
//! let mut runs = 0;
//! loop {
//!     session.start_new_run()?;
//!     let os = session.pick("os", true, 3)?;
//!     let browser = session.pick("browser", true, 2)?;
//!     assert!(os < 3 && browser < 2);
//!     runs += 1;
//!     if !session.has_pending_combinations()? {
//!         break;
//!     }
//! }
//! assert!(runs >= 6);
//! assert_eq!(session.open_pairs(), 0);
//! # Ok::<(), lazypair::PairwiseError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod counter_set;
pub mod ledger;
pub mod registry;
mod result;
mod scoring;
pub mod seeds;
mod session;
mod summary;

pub use config::{ParkingConfig, SeedsConfig, SessionConfig, MAX_DOMAIN_SIZE};
pub use counter_set::CounterSet;
pub use ledger::{ValueId, ValueInfo, ValueLedger, ValueStats};
pub use registry::{
    Definition, DefinitionId, DefinitionKey, Identity, Introduction, NodeId, ParameterRegistry,
};
pub use result::{PairwiseError, PairwiseResult};
pub use seeds::{largest_factor_at_most, SeedCursor, SeedId, SeedRole, SeedSession, Seeds};
pub use session::Session;
pub use summary::{DefinitionSummary, SessionSummary};
