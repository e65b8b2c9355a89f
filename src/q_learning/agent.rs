//! Afterstate Q-learning agent
//!
//! The agent scores each legal action by the value of the afterstate it
//! produces, so positions reached by different move orders share one value.

use std::{path::Path, sync::Arc};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use super::{serialization, value_table::ValueTable};
use crate::{
    Error, Result,
    afterstates::{AfterstateId, AfterstateTable},
    ports::Agent,
    tictactoe::{Action, StateCode},
};

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.9;
pub const DEFAULT_EPSILON: f64 = 0.1;

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// ε-greedy agent learning afterstate values with off-policy TD control
#[derive(Debug, Clone)]
pub struct AfterstateAgent {
    table: Arc<AfterstateTable>,
    values: ValueTable,
    epsilon: f64,
    explore: bool,
    rng: StdRng,
    rng_seed: Option<u64>,
    name: String,
}

impl AfterstateAgent {
    /// Create an agent with zeroed values over `table`.
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - α parameter (0.0 to 1.0)
    /// * `discount_factor` - γ parameter (0.0 to 1.0)
    /// * `epsilon` - Exploration rate, only used when `explore` is set
    /// * `explore` - Whether action selection is ε-greedy or purely greedy
    pub fn new(
        table: Arc<AfterstateTable>,
        learning_rate: f64,
        discount_factor: f64,
        epsilon: f64,
        explore: bool,
    ) -> Self {
        let values = ValueTable::new(table.afterstate_count(), learning_rate, discount_factor);
        Self {
            table,
            values,
            epsilon,
            explore,
            rng: build_rng(None),
            rng_seed: None,
            name: "afterstate".to_string(),
        }
    }

    /// Agent with α = 0.1, γ = 0.9, ε = 0.1 and exploration off
    pub fn with_defaults(table: Arc<AfterstateTable>) -> Self {
        Self::new(
            table,
            DEFAULT_LEARNING_RATE,
            DEFAULT_DISCOUNT_FACTOR,
            DEFAULT_EPSILON,
            false,
        )
    }

    /// Agent that picks uniformly among legal actions
    pub fn random(table: Arc<AfterstateTable>) -> Self {
        Self::new(table, 0.0, 0.0, 1.0, true).with_name("random")
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_explore(mut self, explore: bool) -> Self {
        self.explore = explore;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Greedy copy for evaluation; learning in the copy leaves `self` intact
    pub fn frozen(&self) -> Self {
        self.clone().with_explore(false)
    }

    pub fn table(&self) -> &Arc<AfterstateTable> {
        &self.table
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn explore(&self) -> bool {
        self.explore
    }

    pub fn seed(&self) -> Option<u64> {
        self.rng_seed
    }

    /// `(action, value)` for every recorded action of `state`, in table order
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownState`] if the state has no table entry.
    pub fn value_of_state(&self, state: StateCode) -> Result<Vec<(Action, f64)>> {
        Ok(self
            .table
            .transitions(state)?
            .iter()
            .map(|&(action, id)| (action, self.values.get(id)))
            .collect())
    }

    /// Afterstate ids of `legal_actions`, in table order
    fn legal_afterstates(
        &self,
        state: StateCode,
        legal_actions: &[Action],
    ) -> Result<Vec<(Action, AfterstateId)>> {
        let transitions = self.table.transitions(state)?;
        if let Some(&missing) = legal_actions
            .iter()
            .find(|action| !transitions.iter().any(|(recorded, _)| recorded == *action))
        {
            return Err(Error::UnknownAction {
                code: state,
                action: missing,
            });
        }

        Ok(transitions
            .iter()
            .filter(|(action, _)| legal_actions.contains(action))
            .copied()
            .collect())
    }

    /// First action with the highest value; ties keep table order
    fn greedy_action(&self, candidates: &[(Action, AfterstateId)]) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for &(action, id) in candidates {
            let value = self.values.get(id);
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Write the learned values in the fixed binary layout
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_values(&self, path: &Path) -> Result<()> {
        serialization::save(path, self.values.values(), self.table.fingerprint())
    }

    /// Replace the learned values with ones saved by [`Self::save_values`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, corrupted, or was written
    /// against a different afterstate table.
    pub fn load_values(&mut self, path: &Path) -> Result<()> {
        let values = serialization::load(
            path,
            self.table.afterstate_count(),
            self.table.fingerprint(),
        )?;
        self.values.replace_values(values);
        Ok(())
    }
}

impl Agent for AfterstateAgent {
    fn select_action(&mut self, state: StateCode, legal_actions: &[Action]) -> Result<Action> {
        if legal_actions.is_empty() {
            return Err(Error::NoValidActions);
        }

        if self.explore && self.rng.random::<f64>() < self.epsilon {
            return legal_actions
                .choose(&mut self.rng)
                .copied()
                .ok_or(Error::NoValidActions);
        }

        let candidates = self.legal_afterstates(state, legal_actions)?;
        self.greedy_action(&candidates).ok_or(Error::NoValidActions)
    }

    fn update(
        &mut self,
        state: StateCode,
        action: Action,
        reward: f64,
        next_state: StateCode,
        next_legal_actions: &[Action],
    ) -> Result<()> {
        let id = self.table.afterstate(state, action)?;
        let max_next = if next_legal_actions.is_empty() {
            None
        } else {
            let next = self.legal_afterstates(next_state, next_legal_actions)?;
            self.values.max_value(next.into_iter().map(|(_, id)| id))
        };

        self.values.q_learning_update(id, reward, max_next);
        Ok(())
    }

    fn policy(&self, state: StateCode, action: Action) -> Result<f64> {
        let greedy = self.greedy_action(self.table.transitions(state)?);
        Ok(if greedy == Some(action) { 1.0 } else { 0.0 })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::tictactoe::{BoardState, PASS, Variant};

    static STANDARD: LazyLock<Arc<AfterstateTable>> = LazyLock::new(|| {
        Arc::new(AfterstateTable::build(Variant::Standard).expect("table builds"))
    });

    fn state(s: &str) -> BoardState {
        BoardState::from_string(Variant::Standard, s).unwrap()
    }

    #[test]
    fn test_new_agent_values_are_zero() {
        let agent = AfterstateAgent::with_defaults(Arc::clone(&STANDARD));
        assert_eq!(agent.values().len(), 5477);

        let values = agent.value_of_state(0).unwrap();
        assert_eq!(values.len(), 9);
        assert!(values.iter().all(|&(_, v)| v == 0.0));
    }

    #[test]
    fn test_greedy_ties_pick_first_action() {
        let mut agent = AfterstateAgent::with_defaults(Arc::clone(&STANDARD));
        let legal: Vec<Action> = (0..9).collect();
        assert_eq!(agent.select_action(0, &legal).unwrap(), 0);
        assert_eq!(agent.select_action(0, &[3, 5]).unwrap(), 3);
    }

    #[test]
    fn test_terminal_update_moves_toward_reward() {
        let mut agent = AfterstateAgent::with_defaults(Arc::clone(&STANDARD));
        let before = state("XX.OO....");
        let after = before.apply(2).unwrap();

        agent.update(before.code(), 2, 1.0, after.code(), &[]).unwrap();

        let values = agent.value_of_state(before.code()).unwrap();
        assert_eq!(values.iter().find(|(a, _)| *a == 2).unwrap().1, 0.1);
        assert_eq!(agent.select_action(before.code(), &before.legal_actions()).unwrap(), 2);
        assert_eq!(agent.policy(before.code(), 2).unwrap(), 1.0);
        assert_eq!(agent.policy(before.code(), 5).unwrap(), 0.0);
    }

    #[test]
    fn test_update_bootstraps_from_next_state() {
        let mut agent = AfterstateAgent::with_defaults(Arc::clone(&STANDARD));
        let next = state(".........").apply(1).unwrap().reverse();
        assert_eq!(next.label(), ".O.......");
        let next_id = STANDARD.afterstate(next.code(), 8).unwrap();
        agent.values.set(next_id, 0.5);

        agent
            .update(0, 1, -0.2, next.code(), &next.legal_actions())
            .unwrap();

        // 0.1 * (-0.2 + 0.9 * 0.5)
        let id = STANDARD.afterstate(0, 1).unwrap();
        assert!((agent.values().get(id) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let mut agent = AfterstateAgent::with_defaults(Arc::clone(&STANDARD));
        let won = state("XXXOO....");

        assert!(agent.select_action(won.code(), &[5]).is_err());
        assert!(agent.select_action(0, &[PASS]).is_err());
        assert!(matches!(
            agent.select_action(0, &[]),
            Err(Error::NoValidActions)
        ));
        assert!(agent.update(0, PASS, 0.0, 1, &[]).is_err());
    }

    #[test]
    fn test_exploration_is_reproducible_with_seed() {
        let legal: Vec<Action> = (0..9).collect();
        let mut first = AfterstateAgent::random(Arc::clone(&STANDARD)).with_seed(7);
        let mut second = AfterstateAgent::random(Arc::clone(&STANDARD)).with_seed(7);

        let a: Vec<Action> = (0..20)
            .map(|_| first.select_action(0, &legal).unwrap())
            .collect();
        let b: Vec<Action> = (0..20)
            .map(|_| second.select_action(0, &legal).unwrap())
            .collect();
        assert_eq!(a, b);
        assert!(a.iter().any(|&action| action != a[0]));
    }

    #[test]
    fn test_frozen_copy_is_greedy_and_independent() {
        let agent = AfterstateAgent::with_defaults(Arc::clone(&STANDARD)).with_explore(true);
        let mut frozen = agent.frozen();
        assert!(!frozen.explore());

        frozen.update(0, 4, 1.0, 81, &[]).unwrap();
        assert_eq!(agent.values().get(STANDARD.afterstate(0, 4).unwrap()), 0.0);
    }
}
