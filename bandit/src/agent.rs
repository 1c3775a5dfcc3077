use ordered_float::OrderedFloat;

use crate::env::Reward;

#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Index of the largest value. Ties go to the lowest index.
fn argmax(values: impl DoubleEndedIterator<Item = f32> + ExactSizeIterator) -> usize {
    values
        .enumerate()
        .rev()
        .max_by_key(|(_, x)| OrderedFloat(*x))
        .map(|(i, _)| i)
        .expect("there should be at least one action")
}

/// A single layer policy: one weight per (state, action) pair, squashed
/// through a sigmoid. The greedy action is the one with the highest
/// activation.
#[derive(Clone, Debug)]
pub struct PolicyAgent {
    weights: Box<[f32]>,
    num_states: usize,
    num_actions: usize,
    learning_rate: f32,
}

impl PolicyAgent {
    #[must_use]
    pub fn new(num_states: usize, num_actions: usize, learning_rate: f32) -> Self {
        assert!(
            num_states > 0 && num_actions > 0,
            "the policy needs at least one state and one action"
        );
        Self {
            weights: vec![1.0; num_states * num_actions].into_boxed_slice(),
            num_states,
            num_actions,
            learning_rate,
        }
    }

    #[must_use]
    pub const fn num_states(&self) -> usize {
        self.num_states
    }

    #[must_use]
    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    #[must_use]
    pub const fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    #[must_use]
    pub fn weights(&self, state: usize) -> &[f32] {
        assert!(
            state < self.num_states,
            "state {state} is out of range for {} states",
            self.num_states
        );
        &self.weights[state * self.num_actions..(state + 1) * self.num_actions]
    }

    fn index(&self, state: usize, action: usize) -> usize {
        assert!(
            state < self.num_states,
            "state {state} is out of range for {} states",
            self.num_states
        );
        assert!(
            action < self.num_actions,
            "action {action} is out of range for {} actions",
            self.num_actions
        );
        state * self.num_actions + action
    }

    pub fn probabilities(&self, state: usize) -> impl Iterator<Item = f32> + '_ {
        self.weights(state).iter().copied().map(sigmoid)
    }

    /// Greedy action for `state`.
    #[must_use]
    pub fn act(&self, state: usize) -> usize {
        argmax(self.weights(state).iter().copied().map(sigmoid))
    }

    /// Action with the highest raw weight. Agrees with [`Self::act`] except
    /// where the sigmoid saturates.
    #[must_use]
    pub fn most_promising(&self, state: usize) -> usize {
        argmax(self.weights(state).iter().copied())
    }

    /// One REINFORCE step on the weight of the chosen action.
    ///
    /// The loss is `-ln(sigmoid(w)) * reward`, whose derivative with respect
    /// to `w` is `-reward * (1 - sigmoid(w))`. Returns the loss before the
    /// step.
    pub fn update(&mut self, state: usize, action: usize, reward: Reward) -> f32 {
        let index = self.index(state, action);
        let reward = f32::from(reward);
        let weight = self.weights[index];
        let responsible = sigmoid(weight);
        let loss = -responsible.ln() * reward;
        let gradient = -reward * (1.0 - responsible);
        self.weights[index] = weight - self.learning_rate * gradient;
        loss
    }
}

#[cfg(test)]
mod tests {
    use super::{argmax, sigmoid, PolicyAgent};
    use crate::env::Reward;

    #[test]
    fn starts_at_ones() {
        let agent = PolicyAgent::new(3, 4, 0.001);
        for state in 0..3 {
            assert_eq!(agent.weights(state), &[1.0; 4]);
        }
    }

    #[test]
    fn sigmoid_values() {
        assert!((sigmoid(0.0) - 0.5).abs() < f32::EPSILON);
        assert!(sigmoid(10.0) < 1.0);
        assert!(sigmoid(-10.0) > 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn argmax_prefers_lowest_index() {
        assert_eq!(argmax([1.0, 3.0, 3.0, 2.0].into_iter()), 1);
        assert_eq!(argmax([1.0; 4].into_iter()), 0);
        assert_eq!(argmax([-1.0, -0.5].into_iter()), 1);
    }

    #[test]
    fn update_only_touches_selected_weight() {
        let mut agent = PolicyAgent::new(3, 4, 0.1);
        let before: Vec<Vec<f32>> = (0..3).map(|s| agent.weights(s).to_vec()).collect();
        agent.update(1, 2, Reward::Positive);
        for state in 0..3 {
            for action in 0..4 {
                let changed = agent.weights(state)[action] != before[state][action];
                assert_eq!(changed, (state, action) == (1, 2));
            }
        }
        assert_eq!(agent.num_states(), 3);
        assert_eq!(agent.num_actions(), 4);
    }

    #[test]
    fn update_follows_reward_sign() {
        let mut agent = PolicyAgent::new(1, 2, 0.5);
        let loss = agent.update(0, 0, Reward::Positive);
        let expected = 0.5f32.mul_add(1.0 - sigmoid(1.0), 1.0);
        assert!((agent.weights(0)[0] - expected).abs() < 1e-6);
        assert!((loss + sigmoid(1.0).ln()).abs() < 1e-6);
        assert!(loss > 0.0);

        let loss = agent.update(0, 1, Reward::Negative);
        assert!(agent.weights(0)[1] < 1.0);
        assert!(loss < 0.0);
    }

    #[test]
    fn act_follows_weights() {
        let mut agent = PolicyAgent::new(2, 4, 1.0);
        assert_eq!(agent.act(0), 0);
        agent.update(0, 3, Reward::Positive);
        assert_eq!(agent.act(0), 3);
        assert_eq!(agent.most_promising(0), 3);
        assert_eq!(agent.act(1), 0);
        agent.update(1, 0, Reward::Negative);
        assert_eq!(agent.act(1), 1);
    }

    #[test]
    fn act_is_idempotent() {
        let mut agent = PolicyAgent::new(3, 4, 0.3);
        agent.update(2, 1, Reward::Positive);
        agent.update(2, 3, Reward::Positive);
        let first = agent.act(2);
        for _ in 0..100 {
            assert_eq!(agent.act(2), first);
        }
        let probabilities: Vec<_> = agent.probabilities(2).collect();
        assert_eq!(probabilities.len(), 4);
        assert!(probabilities.iter().all(|p| *p > 0.0 && *p < 1.0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn act_out_of_range_panics() {
        let agent = PolicyAgent::new(3, 4, 0.1);
        let _ = agent.act(3);
    }
}
