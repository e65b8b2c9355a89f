//! Configuration types for agent creation and training runs.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    q_learning::agent::{DEFAULT_DISCOUNT_FACTOR, DEFAULT_EPSILON, DEFAULT_LEARNING_RATE},
    tictactoe::Variant,
};

/// Configuration for creating an afterstate agent.
///
/// # Examples
///
/// ```
/// use afterstate::app::AgentConfig;
/// use afterstate::tictactoe::Variant;
///
/// let config = AgentConfig::new(Variant::Capture)
///     .with_seed(42)
///     .with_epsilon(0.5)
///     .with_explore(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Rule variant the agent plays
    pub variant: Variant,
    /// Learning rate α
    pub learning_rate: f64,
    /// Discount factor γ
    pub discount_factor: f64,
    /// Exploration rate ε
    pub epsilon: f64,
    /// Whether action selection is ε-greedy
    pub explore: bool,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    /// Create a new agent configuration for `variant`.
    ///
    /// Uses α = 0.1, γ = 0.9, ε = 0.1, exploration off and no seed.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            epsilon: DEFAULT_EPSILON,
            explore: false,
            seed: None,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_explore(mut self, explore: bool) -> Self {
        self.explore = explore;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that every rate lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("learning rate", self.learning_rate),
            ("discount factor", self.discount_factor),
            ("epsilon", self.epsilon),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(Variant::default())
    }
}

/// Configuration for a self-play training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of self-play games
    pub games: usize,
    /// Save the values every this many games (0 disables checkpoints)
    pub checkpoint_interval: usize,
    /// Log a sample game every this many games (0 disables sampling)
    pub sample_interval: usize,
}

impl TrainingConfig {
    pub fn new(games: usize) -> Self {
        Self {
            games,
            checkpoint_interval: 10_000,
            sample_interval: 10_000,
        }
    }

    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn with_sample_interval(mut self, interval: usize) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Whether a checkpoint is due after `games_played` games
    pub fn checkpoint_due(&self, games_played: usize) -> bool {
        self.checkpoint_interval > 0 && games_played.is_multiple_of(self.checkpoint_interval)
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.variant, Variant::Standard);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.discount_factor, 0.9);
        assert_eq!(config.epsilon, 0.1);
        assert!(!config.explore);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = AgentConfig::default().with_epsilon(1.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("epsilon"));

        assert!(AgentConfig::default().with_learning_rate(-0.1).validate().is_err());
        assert!(AgentConfig::default().with_epsilon(1.0).validate().is_ok());
    }

    #[test]
    fn test_checkpoint_due() {
        let config = TrainingConfig::new(100).with_checkpoint_interval(25);
        assert!(config.checkpoint_due(0));
        assert!(config.checkpoint_due(50));
        assert!(!config.checkpoint_due(51));

        let disabled = TrainingConfig::new(100).with_checkpoint_interval(0);
        assert!(!disabled.checkpoint_due(50));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = AgentConfig::new(Variant::Capture).with_seed(9);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"capture\""));
        let back: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
