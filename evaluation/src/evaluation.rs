use std::{iter::Sum, ops::AddAssign};

use bandit::trainer::Verdict;

/// How often each bandit's best arm was learned across runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub runs: u32,
    pub right: Vec<u32>,
}

impl Evaluation {
    #[must_use]
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        Self {
            runs: 1,
            right: verdicts.iter().map(|v| u32::from(v.is_right())).collect(),
        }
    }

    /// Fraction of runs in which `bandit` learned its best arm.
    #[must_use]
    pub fn accuracy(&self, bandit: usize) -> f32 {
        if self.runs == 0 {
            return 0.0;
        }
        self.right[bandit] as f32 / self.runs as f32
    }

    /// Fraction of all verdicts that were right.
    #[must_use]
    pub fn overall(&self) -> f32 {
        if self.runs == 0 || self.right.is_empty() {
            return 0.0;
        }
        self.right.iter().sum::<u32>() as f32 / (self.runs as usize * self.right.len()) as f32
    }
}

impl AddAssign for Evaluation {
    fn add_assign(&mut self, rhs: Self) {
        if self.right.len() < rhs.right.len() {
            self.right.resize(rhs.right.len(), 0);
        }
        self.runs += rhs.runs;
        self.right
            .iter_mut()
            .zip(rhs.right)
            .for_each(|(a, b)| *a += b);
    }
}

impl Sum for Evaluation {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut a, b| {
            a += b;
            a
        })
    }
}
