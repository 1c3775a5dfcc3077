use thiserror::Error;

pub const EPISODES: usize = 10_000;
pub const LEARNING_RATE: f32 = 0.001;
// Chance of taking a random action.
pub const EPSILON: f32 = 0.1;
pub const REPORT_INTERVAL: usize = 500;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainConfig {
    pub episodes: usize,
    pub learning_rate: f32,
    pub epsilon: f32,
    /// Multiplied into epsilon after every episode. `1.0` keeps it fixed.
    pub epsilon_decay: f32,
    pub min_epsilon: f32,
    pub report_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            episodes: EPISODES,
            learning_rate: LEARNING_RATE,
            epsilon: EPSILON,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            report_interval: REPORT_INTERVAL,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("there should be at least one episode")]
    NoEpisodes,
    #[error("learning rate {0} should be positive and finite")]
    LearningRate(f32),
    #[error("epsilon {0} should be in [0, 1]")]
    Epsilon(f32),
    #[error("minimum epsilon {0} should be in [0, 1] and not above epsilon")]
    MinEpsilon(f32),
    #[error("epsilon decay {0} should be in (0, 1]")]
    EpsilonDecay(f32),
    #[error("report interval should be at least one episode")]
    ReportInterval,
}

impl TrainConfig {
    /// # Errors
    ///
    /// Returns the first setting that is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = 0.0..=1.0;
        if self.episodes == 0 {
            return Err(ConfigError::NoEpisodes);
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        if !unit.contains(&self.epsilon) {
            return Err(ConfigError::Epsilon(self.epsilon));
        }
        if !unit.contains(&self.min_epsilon) || self.min_epsilon > self.epsilon {
            return Err(ConfigError::MinEpsilon(self.min_epsilon));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(ConfigError::EpsilonDecay(self.epsilon_decay));
        }
        if self.report_interval == 0 {
            return Err(ConfigError::ReportInterval);
        }
        Ok(())
    }
}
