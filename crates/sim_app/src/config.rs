//! Simulation configuration.

use std::time::Duration;

use sim_math::Vec3;
use sim_physics::DEFAULT_PLAYER_SIZE;
use uuid::Uuid;

/// Default time a single script invocation may take.
pub const DEFAULT_SCRIPT_BUDGET: Duration = Duration::from_millis(5);

/// Configuration for one match.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Identifies the match in logs and snapshots.
    pub match_id: Uuid,
    /// Results of script invocations that run longer are discarded.
    pub script_budget: Duration,
    /// Full size of every player's collision box.
    pub player_size: Vec3,
}

impl SimConfig {
    /// Create a config with a fresh match ID and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            match_id: Uuid::new_v4(),
            script_budget: DEFAULT_SCRIPT_BUDGET,
            player_size: DEFAULT_PLAYER_SIZE,
        }
    }

    /// Use a fixed match ID.
    #[must_use]
    pub fn with_match_id(mut self, match_id: Uuid) -> Self {
        self.match_id = match_id;
        self
    }

    /// Override the per-invocation script budget.
    #[must_use]
    pub fn with_script_budget(mut self, budget: Duration) -> Self {
        self.script_budget = budget;
        self
    }

    /// Override the player collision box size.
    #[must_use]
    pub fn with_player_size(mut self, size: Vec3) -> Self {
        self.player_size = size;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.script_budget, Duration::from_millis(5));
        assert_eq!(config.player_size, DEFAULT_PLAYER_SIZE);
    }

    #[test]
    fn test_builder() {
        let config = SimConfig::new()
            .with_match_id(Uuid::nil())
            .with_script_budget(Duration::from_secs(1))
            .with_player_size(Vec3::new(0.5, 1.0, 0.5));
        assert!(config.match_id.is_nil());
        assert_eq!(config.script_budget, Duration::from_secs(1));
        assert_eq!(config.player_size, Vec3::new(0.5, 1.0, 0.5));
    }
}
