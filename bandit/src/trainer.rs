use std::fmt;

use rand::Rng;

use crate::{
    agent::PolicyAgent,
    config::{ConfigError, TrainConfig},
    env::{ContextualBandit, Environment, Reward},
};

/// Running sum of rewards for every (state, action) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreTable {
    totals: Box<[f32]>,
    num_actions: usize,
}

impl ScoreTable {
    #[must_use]
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        Self {
            totals: vec![0.0; num_states * num_actions].into_boxed_slice(),
            num_actions,
        }
    }

    pub fn add(&mut self, state: usize, action: usize, reward: Reward) {
        assert!(action < self.num_actions, "action {action} is out of range");
        self.totals[state * self.num_actions + action] += f32::from(reward);
    }

    #[must_use]
    pub fn row(&self, state: usize) -> &[f32] {
        &self.totals[state * self.num_actions..(state + 1) * self.num_actions]
    }

    /// Mean of the running sums in each row.
    #[must_use]
    pub fn row_means(&self) -> Vec<f32> {
        self.totals
            .chunks_exact(self.num_actions)
            .map(|row| row.iter().sum::<f32>() / self.num_actions as f32)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrainingStats {
    pub greedy: usize,
    pub explored: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub state: usize,
    pub action: usize,
    pub explored: bool,
    pub reward: Reward,
    pub loss: f32,
}

/// Periodic progress snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub episode: usize,
    pub means: Vec<f32>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let means = self
            .means
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Mean reward for each of the {} bandits: [{means}]",
            self.means.len()
        )
    }
}

/// What the agent learned for a single bandit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub bandit: usize,
    pub action: usize,
    pub best: usize,
}

impl Verdict {
    #[must_use]
    pub const fn is_right(&self) -> bool {
        self.action == self.best
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The agent thinks action {} for bandit {} is the most promising....",
            self.action, self.bandit
        )?;
        write!(
            f,
            "...and it was {}!",
            if self.is_right() { "right" } else { "wrong" }
        )
    }
}

pub struct Trainer<E: Environment> {
    env: E,
    agent: PolicyAgent,
    scores: ScoreTable,
    config: TrainConfig,
    epsilon: f32,
    stats: TrainingStats,
}

impl<E: Environment> Trainer<E> {
    /// # Errors
    ///
    /// Fails if the configuration is invalid.
    pub fn new(env: E, config: TrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let agent = PolicyAgent::new(env.num_states(), env.num_actions(), config.learning_rate);
        let scores = ScoreTable::new(env.num_states(), env.num_actions());
        Ok(Self {
            env,
            agent,
            scores,
            epsilon: config.epsilon,
            config,
            stats: TrainingStats::default(),
        })
    }

    #[must_use]
    pub const fn env(&self) -> &E {
        &self.env
    }

    #[must_use]
    pub const fn agent(&self) -> &PolicyAgent {
        &self.agent
    }

    #[must_use]
    pub const fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    #[must_use]
    pub const fn stats(&self) -> TrainingStats {
        self.stats
    }

    /// Current exploration rate.
    #[must_use]
    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Play a single episode and learn from it.
    pub fn step(&mut self, rng: &mut impl Rng) -> Step {
        let state = self.env.sample_state(rng);

        let explored = rng.gen::<f32>() < self.epsilon;
        let action = if explored {
            self.stats.explored += 1;
            rng.gen_range(0..self.env.num_actions())
        } else {
            self.stats.greedy += 1;
            self.agent.act(state)
        };

        let reward = self.env.pull(rng, state, action);
        let loss = self.agent.update(state, action, reward);
        self.scores.add(state, action, reward);

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);

        Step {
            state,
            action,
            explored,
            reward,
            loss,
        }
    }

    /// Run every configured episode, reporting the mean reward per bandit
    /// after episode 0 and then every `report_interval` episodes.
    pub fn train(&mut self, rng: &mut impl Rng, mut on_report: impl FnMut(&Report)) -> TrainingStats {
        for episode in 0..self.config.episodes {
            let step = self.step(rng);
            if episode % self.config.report_interval == 0 {
                let report = Report {
                    episode,
                    means: self.scores.row_means(),
                };
                log::debug!(
                    "episode {episode}: epsilon={:.4} loss={:.4} {:?}",
                    self.epsilon,
                    step.loss,
                    self.stats
                );
                on_report(&report);
            }
        }
        log::info!(
            "Finished {} episodes ({} greedy, {} explored).",
            self.config.episodes,
            self.stats.greedy,
            self.stats.explored
        );
        self.stats
    }
}

impl Trainer<ContextualBandit> {
    /// Compare the learned preference of every bandit with its best arm.
    #[must_use]
    pub fn summary(&self) -> Vec<Verdict> {
        (0..self.env.num_states())
            .map(|bandit| Verdict {
                bandit,
                action: self.agent.most_promising(bandit),
                best: self.env.table().best_action(bandit),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{Report, ScoreTable, Trainer, Verdict};
    use crate::{
        config::TrainConfig,
        env::{BanditTable, ContextualBandit, Reward},
    };

    fn trained(seed: u64, config: TrainConfig) -> Trainer<ContextualBandit> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut trainer = Trainer::new(ContextualBandit::default(), config).unwrap();
        trainer.train(&mut rng, |_| {});
        trainer
    }

    #[test]
    fn reports_every_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut trainer = Trainer::new(ContextualBandit::default(), TrainConfig::default()).unwrap();
        let mut episodes = Vec::new();
        trainer.train(&mut rng, |report| {
            assert_eq!(report.means.len(), 3);
            episodes.push(report.episode);
        });
        assert_eq!(episodes, (0..10_000).step_by(500).collect::<Vec<_>>());
    }

    #[test]
    fn learns_the_sure_arm() {
        for seed in 0..16 {
            let trainer = trained(seed, TrainConfig::default());
            assert_eq!(trainer.agent().act(2), 0, "seed {seed}");
        }
    }

    #[test]
    fn mostly_learns_the_best_arms() {
        let verdicts: Vec<Verdict> = (100..116)
            .flat_map(|seed| trained(seed, TrainConfig::default()).summary())
            .collect();
        let right = verdicts.iter().filter(|v| v.is_right()).count();
        assert!(right * 4 >= verdicts.len() * 3, "{right} / {}", verdicts.len());
    }

    #[test]
    fn shape_is_preserved() {
        let trainer = trained(3, TrainConfig::default());
        assert_eq!(trainer.agent().num_states(), 3);
        assert_eq!(trainer.agent().num_actions(), 4);
        for state in 0..3 {
            assert_eq!(trainer.agent().weights(state).len(), 4);
            assert_eq!(trainer.scores().row(state).len(), 4);
        }
    }

    #[test]
    fn zero_epsilon_never_explores() {
        let config = TrainConfig {
            epsilon: 0.0,
            episodes: 2_000,
            ..TrainConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut trainer = Trainer::new(ContextualBandit::default(), config).unwrap();
        for _ in 0..2_000 {
            let before = trainer.agent().clone();
            let step = trainer.step(&mut rng);
            assert!(!step.explored);
            assert_eq!(step.action, before.act(step.state));
        }
        assert_eq!(trainer.stats().explored, 0);
        assert_eq!(trainer.stats().greedy, 2_000);
    }

    #[test]
    fn same_seed_same_training() {
        let config = TrainConfig {
            episodes: 3_000,
            ..TrainConfig::default()
        };
        let a = trained(77, config.clone());
        let b = trained(77, config);
        assert_eq!(a.scores(), b.scores());
        assert_eq!(a.stats(), b.stats());
        for state in 0..3 {
            assert_eq!(a.agent().weights(state), b.agent().weights(state));
        }
    }

    #[test]
    fn epsilon_decays_to_floor() {
        let config = TrainConfig {
            episodes: 1_000,
            epsilon: 0.5,
            epsilon_decay: 0.99,
            min_epsilon: 0.05,
            ..TrainConfig::default()
        };
        let trainer = trained(4, config);
        assert!((trainer.epsilon() - 0.05).abs() < f32::EPSILON);

        let fixed = trained(4, TrainConfig::default());
        assert!((fixed.epsilon() - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TrainConfig {
            epsilon: -0.1,
            ..TrainConfig::default()
        };
        assert!(Trainer::new(ContextualBandit::default(), config).is_err());
    }

    #[test]
    fn score_table_means() {
        let mut scores = ScoreTable::new(2, 2);
        scores.add(0, 0, Reward::Positive);
        scores.add(0, 1, Reward::Positive);
        scores.add(1, 1, Reward::Negative);
        assert_eq!(scores.row_means(), vec![1.0, -0.5]);
        assert_eq!(scores.row(1), &[0.0, -1.0]);
    }

    #[test]
    fn report_and_verdict_text() {
        let report = Report {
            episode: 0,
            means: vec![0.0, 0.25, -0.25],
        };
        assert_eq!(
            report.to_string(),
            "Mean reward for each of the 3 bandits: [0, 0.25, -0.25]"
        );

        let verdict = Verdict {
            bandit: 2,
            action: 0,
            best: 0,
        };
        assert_eq!(
            verdict.to_string(),
            "The agent thinks action 0 for bandit 2 is the most promising....\n...and it was right!"
        );
        let wrong = Verdict { best: 1, ..verdict };
        assert!(wrong.to_string().ends_with("wrong!"));
    }

    #[test]
    fn custom_table() {
        let table = BanditTable::new(&[[5.0_f32, -5.0]]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut trainer = Trainer::new(ContextualBandit::new(table), TrainConfig::default()).unwrap();
        trainer.train(&mut rng, |_| {});
        let verdicts = trainer.summary();
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts[0].is_right());
    }
}
