use std::time::Duration;

use serde::Deserialize;

use crate::types::HumanDuration;

/// Health states a load balancer can report for a target. Mirrors
/// `tgs_core::HealthState::as_str`; `tgs-runtime` tests keep the two in step.
pub const KNOWN_HEALTH_STATES: [&str; 6] = [
    "healthy",
    "unhealthy",
    "initial",
    "draining",
    "unused",
    "unavailable",
];

/// `[convergence]` section: how long to wait for registered targets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvergenceConfig {
    /// Pause between two health polls.
    pub interval: HumanDuration,
    /// Hard ceiling on health polls per destination.
    pub max_attempts: u32,
    /// States that count as ready. `unused` is included by default because a
    /// freshly registered target with no traffic yet reports `unused`.
    pub ready_states: Vec<String>,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            interval: HumanDuration::from(Duration::from_secs(5)),
            max_attempts: 15,
            ready_states: vec!["healthy".to_string(), "unused".to_string()],
        }
    }
}
