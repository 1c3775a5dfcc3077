use rand::Rng;
use rand_distr::StandardNormal;
use thiserror::Error;

pub trait Environment {
    fn num_states(&self) -> usize;
    fn num_actions(&self) -> usize;

    /// Draw the context for the next episode.
    fn sample_state(&mut self, rng: &mut impl Rng) -> usize;

    /// Pull arm `action` of bandit `state`.
    fn pull(&self, rng: &mut impl Rng, state: usize, action: usize) -> Reward;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reward {
    Positive,
    Negative,
}

impl From<Reward> for f32 {
    fn from(value: Reward) -> Self {
        match value {
            Reward::Positive => 1.0,
            Reward::Negative => -1.0,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("the table has no bandits")]
    NoBandits,
    #[error("the bandits have no arms")]
    NoArms,
    #[error("bandit {row} has {found} arms, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("threshold at bandit {row}, arm {column} is not finite")]
    NotFinite { row: usize, column: usize },
}

/// Reward thresholds, one row per bandit and one column per arm.
/// A pull succeeds when a standard normal sample exceeds the threshold,
/// so the lowest threshold in a row is the best arm.
#[derive(Clone, Debug, PartialEq)]
pub struct BanditTable {
    thresholds: Box<[f32]>,
    num_actions: usize,
}

impl BanditTable {
    /// Build a table from rows of thresholds.
    ///
    /// # Errors
    ///
    /// Fails if there are no rows or columns, the rows have different
    /// lengths, or a threshold is NaN or infinite.
    pub fn new<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, TableError> {
        let first = rows.first().ok_or(TableError::NoBandits)?.as_ref();
        let num_actions = first.len();
        if num_actions == 0 {
            return Err(TableError::NoArms);
        }

        let mut thresholds = Vec::with_capacity(rows.len() * num_actions);
        for (row, values) in rows.iter().map(AsRef::as_ref).enumerate() {
            if values.len() != num_actions {
                return Err(TableError::Ragged {
                    row,
                    expected: num_actions,
                    found: values.len(),
                });
            }
            if let Some(column) = values.iter().position(|t| !t.is_finite()) {
                return Err(TableError::NotFinite { row, column });
            }
            thresholds.extend_from_slice(values);
        }

        Ok(Self {
            thresholds: thresholds.into_boxed_slice(),
            num_actions,
        })
    }

    #[must_use]
    pub fn num_bandits(&self) -> usize {
        self.thresholds.len() / self.num_actions
    }

    #[must_use]
    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    #[must_use]
    pub fn row(&self, state: usize) -> &[f32] {
        assert!(
            state < self.num_bandits(),
            "state {state} is out of range for {} bandits",
            self.num_bandits()
        );
        &self.thresholds[state * self.num_actions..(state + 1) * self.num_actions]
    }

    #[must_use]
    pub fn threshold(&self, state: usize, action: usize) -> f32 {
        assert!(
            action < self.num_actions,
            "action {action} is out of range for {} arms",
            self.num_actions
        );
        self.row(state)[action]
    }

    /// The arm most likely to pay out, which is the one with the lowest
    /// threshold. Ties go to the lowest index.
    #[must_use]
    pub fn best_action(&self, state: usize) -> usize {
        self.row(state)
            .iter()
            .enumerate()
            .fold((0, f32::INFINITY), |(best, min), (action, &t)| {
                if t < min {
                    (action, t)
                } else {
                    (best, min)
                }
            })
            .0
    }
}

impl Default for BanditTable {
    fn default() -> Self {
        let rows: [[f32; 4]; 3] = [
            [0.2, 0.0, -0.0, -5.0],
            [0.1, -5.0, 1.0, 0.25],
            [-5.0, 5.0, 5.0, 5.0],
        ];
        Self::new(&rows).expect("the default table should be valid")
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContextualBandit {
    table: BanditTable,
    current_state: usize,
}

impl ContextualBandit {
    #[must_use]
    pub const fn new(table: BanditTable) -> Self {
        Self {
            table,
            current_state: 0,
        }
    }

    #[must_use]
    pub const fn table(&self) -> &BanditTable {
        &self.table
    }

    /// The state drawn by the last call to `sample_state`.
    #[must_use]
    pub const fn current_state(&self) -> usize {
        self.current_state
    }
}

impl Environment for ContextualBandit {
    fn num_states(&self) -> usize {
        self.table.num_bandits()
    }

    fn num_actions(&self) -> usize {
        self.table.num_actions()
    }

    fn sample_state(&mut self, rng: &mut impl Rng) -> usize {
        self.current_state = rng.gen_range(0..self.table.num_bandits());
        self.current_state
    }

    fn pull(&self, rng: &mut impl Rng, state: usize, action: usize) -> Reward {
        let threshold = self.table.threshold(state, action);
        let sample: f32 = rng.sample(StandardNormal);
        if sample > threshold {
            Reward::Positive
        } else {
            Reward::Negative
        }
    }
}
