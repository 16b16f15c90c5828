//! Tuning knobs shared by the registry and the simulation engine.
//!
//! These live in the core crate so configuration loading, the binary and
//! tests all agree on the defaults.

use std::time::Duration;

/// Registry cache policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum age of a building's cached records before the next
    /// `get_all_by_building` re-hydrates them from the backing store.
    pub staleness_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            staleness_interval: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Simulation cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Wait between two ticks of the same building.
    pub tick_interval: Duration,
    /// Wait after a tick failed to fetch its elevators.
    pub failure_backoff: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            failure_backoff: Duration::from_secs(5),
        }
    }
}
