//! Afterstate value table for temporal difference learning

use serde::{Deserialize, Serialize};

use crate::afterstates::AfterstateId;

/// Dense afterstate values, indexed by [`AfterstateId`]
///
/// Each entry estimates the return for the player who produced that
/// afterstate. Values start at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    values: Vec<f64>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
}

impl ValueTable {
    /// Create a zero-initialised table with `len` entries
    pub fn new(len: usize, learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            values: vec![0.0; len],
            learning_rate,
            discount_factor,
        }
    }

    /// Get the value of an afterstate
    pub fn get(&self, id: AfterstateId) -> f64 {
        self.values[id]
    }

    /// Set the value of an afterstate
    pub fn set(&mut self, id: AfterstateId, value: f64) {
        self.values[id] = value;
    }

    /// Highest value among `ids`, or `None` if there are none
    pub fn max_value(&self, ids: impl IntoIterator<Item = AfterstateId>) -> Option<f64> {
        ids.into_iter().map(|id| self.get(id)).reduce(f64::max)
    }

    /// Q-learning update on an afterstate
    ///
    /// V(a) ← V(a) + α[r + γ max_a' V(a') - V(a)], with the bootstrap term
    /// taken as 0 when the successor has no actions.
    pub fn q_learning_update(&mut self, id: AfterstateId, reward: f64, max_next: Option<f64>) {
        let current = self.get(id);
        let td_target = reward + self.discount_factor * max_next.unwrap_or(0.0);
        let td_error = td_target - current;
        self.set(id, current + self.learning_rate * td_error);
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Replace every value at once; the caller checks the length
    pub(crate) fn replace_values(&mut self, values: Vec<f64>) {
        self.values = values;
    }

    /// Reset all values to zero
    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
