//! Result and error types for lazypair.

use thiserror::Error;

/// Result type for lazypair operations
pub type PairwiseResult<T> = Result<T, PairwiseError>;

/// Errors that can occur while combining parameters
#[derive(Debug, Error)]
pub enum PairwiseError {
    /// Domain size outside `1..=65480`
    #[error("Domain size {size} is outside 1..={max}", max = crate::config::MAX_DOMAIN_SIZE)]
    DomainSize {
        /// Requested domain size
        size: u32,
    },

    /// Seed bound that cannot be split into core-sized picks
    #[error("Bound {bound} has no factor within the domain size cap")]
    BoundTooLarge {
        /// Requested bound
        bound: u32,
    },

    /// Pocketed seed referring to an undeclared pocket
    #[error("Pocket {pocket} was never declared")]
    UnknownPocket {
        /// Debug rendering of the pocket identity
        pocket: String,
    },

    /// The same crumb-trail prefix introduced something else on an earlier run
    #[error(
        "Inconsistent repetition after crumbs {crumbs}: {original} was introduced here before, now {conflicting}"
    )]
    InconsistentRepetition {
        /// Rendering of the crumb-trail prefix
        crumbs: String,
        /// Site that first claimed the prefix
        original: String,
        /// Site that now conflicts with it
        conflicting: String,
    },

    /// Session used after an inconsistency was raised
    #[error("Session aborted: {cause}")]
    SessionAborted {
        /// Message of the error that poisoned the session
        cause: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PairwiseError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error ends the multi-run session
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DomainSize { .. }
                | Self::InconsistentRepetition { .. }
                | Self::SessionAborted { .. }
        )
    }
}
