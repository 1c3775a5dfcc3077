#![warn(clippy::pedantic, clippy::style)]

use std::error::Error;

use bandit::{
    config::{self, TrainConfig},
    env::ContextualBandit,
    trainer::Trainer,
};
use clap::Parser;
use evaluation::Evaluation;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

mod evaluation;

#[derive(Parser, Debug)]
struct Args {
    /// Number of independent training runs
    #[arg(long, default_value_t = 64)]
    runs: u32,
    /// Seed from which the seed of every run is drawn
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Number of episodes per run
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
}

impl From<&Args> for TrainConfig {
    fn from(args: &Args) -> Self {
        Self {
            episodes: args.episodes,
            learning_rate: args.learning_rate,
            epsilon: args.epsilon,
            epsilon_decay: args.epsilon_decay,
            min_epsilon: args.min_epsilon,
            ..Self::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::init();
    log::info!("seed: {}", args.seed);

    let config = TrainConfig::from(&args);
    config.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let seeds: Vec<u64> = (0..args.runs).map(|_| rng.gen()).collect();

    log::info!("Begin {} runs.", args.runs);
    let evaluation: Evaluation = seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut trainer = Trainer::new(ContextualBandit::default(), config.clone())
                .expect("config was already validated");
            trainer.train(&mut rng, |_| {});
            let verdicts = trainer.summary();
            log::debug!("seed {seed}: {verdicts:?}");
            Evaluation::from_verdicts(&verdicts)
        })
        .sum();

    for bandit in 0..evaluation.right.len() {
        let accuracy = evaluation.accuracy(bandit);
        log::info!("bandit {bandit}: {:.1}%", accuracy * 100.0);
        println!(
            "Bandit {bandit}: best arm learned in {} of {} runs ({:.1}%)",
            evaluation.right[bandit],
            evaluation.runs,
            accuracy * 100.0
        );
    }
    println!("Overall: {:.1}%", evaluation.overall() * 100.0);
    Ok(())
}
