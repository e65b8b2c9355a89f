//! Agent port - abstraction over action selection and learning
//!
//! Agents work purely on state codes and actions, which keeps them
//! independent of how an environment represents its boards.

use crate::{
    Result,
    tictactoe::{Action, StateCode},
};

/// Agent trait - unified interface for learning and fixed policies
///
/// # Examples
///
/// ```no_run
/// use afterstate::{
///     ports::{Agent, Environment},
///     tictactoe::{TicTacToeEnv, Variant},
/// };
///
/// fn greedy_move<A: Agent>(agent: &mut A, env: &TicTacToeEnv) -> afterstate::Result<usize> {
///     agent.select_action(env.state().code(), &env.valid_actions())
/// }
/// ```
pub trait Agent {
    /// Choose an action among `legal_actions` for the given state.
    ///
    /// # Errors
    ///
    /// Returns an error if `legal_actions` is empty or the state is unknown.
    fn select_action(&mut self, state: StateCode, legal_actions: &[Action]) -> Result<Action>;

    /// Learn from one transition.
    ///
    /// `next_legal_actions` is empty when `next_state` is terminal.
    fn update(
        &mut self,
        state: StateCode,
        action: Action,
        reward: f64,
        next_state: StateCode,
        next_legal_actions: &[Action],
    ) -> Result<()>;

    /// Probability that the agent's greedy policy picks `action` in `state`.
    fn policy(&self, state: StateCode, action: Action) -> Result<f64>;

    /// Name used in logs and summaries.
    fn name(&self) -> &str;
}
