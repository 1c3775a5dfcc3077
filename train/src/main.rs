#![warn(clippy::pedantic, clippy::style, clippy::nursery)]

use std::error::Error;

use bandit::{
    config::{self, TrainConfig},
    env::ContextualBandit,
    trainer::Trainer,
};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Parser, Debug)]
struct Args {
    /// Number of episodes to train for
    #[arg(long, default_value_t = config::EPISODES)]
    episodes: usize,
    /// Step size for gradient descent
    #[arg(long, default_value_t = config::LEARNING_RATE)]
    learning_rate: f32,
    /// Chance of taking a random action
    #[arg(long, default_value_t = config::EPSILON)]
    epsilon: f32,
    /// Factor applied to epsilon after every episode
    #[arg(long, default_value_t = 1.0)]
    epsilon_decay: f32,
    /// Epsilon never decays below this
    #[arg(long, default_value_t = 0.0)]
    min_epsilon: f32,
    /// Episodes between progress reports
    #[arg(long, default_value_t = config::REPORT_INTERVAL)]
    report_interval: usize,
    /// Seed for the RNG, random if not given
    #[arg(long)]
    seed: Option<u64>,
}

impl From<&Args> for TrainConfig {
    fn from(args: &Args) -> Self {
        Self {
            episodes: args.episodes,
            learning_rate: args.learning_rate,
            epsilon: args.epsilon,
            epsilon_decay: args.epsilon_decay,
            min_epsilon: args.min_epsilon,
            report_interval: args.report_interval,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::init();

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!("seed: {seed}");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let config = TrainConfig::from(&args);
    log::debug!("{config:?}");
    let mut trainer = Trainer::new(ContextualBandit::default(), config)?;

    log::info!("Begin.");
    trainer.train(&mut rng, |report| println!("{report}"));

    for verdict in trainer.summary() {
        println!("{verdict}");
    }
    Ok(())
}
