//! Session configuration.
//!
//! Every tunable of the engine lives here. Configurations load from YAML or
//! JSON and fall back to defaults for any field left out.

use crate::result::{PairwiseError, PairwiseResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest domain size a single pick accepts
pub const MAX_DOMAIN_SIZE: u16 = 65480;

/// Primary-value parking heuristic
///
/// For parameters with many values the primary (index 0) value keeps
/// standing in for a while instead of fanning out every value first. The
/// lookback window is `k - k/divisor + parked/(k - 1)` crumbs for a
/// parameter with `k` values whose primary has been parked `parked` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// Whether parking is applied at all
    pub enabled: bool,
    /// Smallest value count that parks its primary value
    pub min_values: u16,
    /// Divisor shrinking the lookback window
    pub divisor: u16,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_values: 5,
            divisor: 5,
        }
    }
}

impl ParkingConfig {
    /// Parking switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Whether a parameter with `value_count` values parks its primary value
    #[must_use]
    pub const fn applies_to(&self, value_count: u16) -> bool {
        self.enabled && value_count >= self.min_values && value_count >= 2
    }

    /// Lookback window for a primary value parked `parked` times so far
    #[must_use]
    pub fn lookback(&self, value_count: u16, parked: u32) -> usize {
        let k = value_count as usize;
        let divisor = self.divisor.max(1) as usize;
        k - k / divisor + parked as usize / (k.max(2) - 1)
    }
}

/// Seed decomposition budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedsConfig {
    /// Values that may still be pairwise-combined, shared by all parameters
    pub combined_values_budget: u32,
    /// Number of parameters sharing the budget
    pub parameter_count: u32,
}

impl Default for SeedsConfig {
    fn default() -> Self {
        Self {
            combined_values_budget: 32,
            parameter_count: 1,
        }
    }
}

impl SeedsConfig {
    /// Set the number of parameters sharing the budget
    #[must_use]
    pub const fn with_parameter_count(mut self, count: u32) -> Self {
        self.parameter_count = count;
        self
    }

    /// Set the combined-values budget
    #[must_use]
    pub const fn with_budget(mut self, budget: u32) -> Self {
        self.combined_values_budget = budget;
        self
    }

    /// Largest bound that is still picked as one combined value
    #[must_use]
    pub fn threshold(&self) -> u32 {
        (self.combined_values_budget / self.parameter_count.max(1))
            .clamp(2, MAX_DOMAIN_SIZE as u32)
    }
}

/// Configuration for a combination session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Primary-value parking
    pub parking: ParkingConfig,
    /// Seed decomposition
    pub seeds: SeedsConfig,
}

impl SessionConfig {
    /// Create a default config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parking heuristic
    #[must_use]
    pub const fn with_parking(mut self, parking: ParkingConfig) -> Self {
        self.parking = parking;
        self
    }

    /// Disable parking
    #[must_use]
    pub fn without_parking(mut self) -> Self {
        self.parking = ParkingConfig::disabled();
        self
    }

    /// Set the seed decomposition budget
    #[must_use]
    pub const fn with_seeds(mut self, seeds: SeedsConfig) -> Self {
        self.seeds = seeds;
        self
    }

    /// Check the tunables are usable
    pub fn validate(&self) -> PairwiseResult<()> {
        if self.parking.divisor == 0 {
            return Err(PairwiseError::config("parking.divisor must be at least 1"));
        }
        if self.parking.min_values < 2 {
            return Err(PairwiseError::config(
                "parking.min_values must be at least 2",
            ));
        }
        if self.seeds.combined_values_budget < 2 {
            return Err(PairwiseError::config(
                "seeds.combined_values_budget must be at least 2",
            ));
        }
        Ok(())
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> PairwiseResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> PairwiseResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> PairwiseResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(PairwiseError::config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }
}
