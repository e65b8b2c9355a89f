//! Environment port - state-transition wrapper driven by agents

use crate::{
    Result,
    tictactoe::{Action, BoardState},
};

/// Environment trait - holds the current board and applies actions to it
///
/// The board is always held from the perspective of the side about to move.
/// Callers that alternate turns hand the reversed board back through
/// [`Environment::set_state`].
pub trait Environment {
    /// Actions legal in the current state; empty once the game is over.
    fn valid_actions(&self) -> Vec<Action>;

    /// Apply an action for the side to move.
    ///
    /// Returns the reward for the mover together with the resulting
    /// afterstate, which also becomes the current state.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::IllegalAction`] if `action` is not among
    /// [`Environment::valid_actions`].
    fn step(&mut self, action: Action) -> Result<(f64, BoardState)>;

    /// Return to the starting position.
    fn reset(&mut self);

    /// Current board state.
    fn state(&self) -> BoardState;

    /// Replace the current board state.
    fn set_state(&mut self, state: BoardState);
}
