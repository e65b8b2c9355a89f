//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing self-play events,
//! allowing composable data collection without coupling the driver
//! to specific output formats or metrics.

use crate::{
    Result,
    tictactoe::{Action, BoardState, GameOutcome},
};

/// Observer trait for monitoring self-play
///
/// # Event Sequence
///
/// 1. `on_training_start(total_games)` - Once at the beginning
/// 2. For each game:
///    - `on_game_start(game_num)`
///    - `on_move(...)` - For each half-move in the game
///    - `on_game_end(game_num, outcome, final_state)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use afterstate::{
///     ports::Observer,
///     tictactoe::{BoardState, GameOutcome},
/// };
///
/// struct DrawCounter {
///     draws: usize,
/// }
///
/// impl Observer for DrawCounter {
///     fn on_game_end(
///         &mut self,
///         _game_num: usize,
///         outcome: GameOutcome,
///         _final_state: &BoardState,
///     ) -> afterstate::Result<()> {
///         if outcome == GameOutcome::Draw {
///             self.draws += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer {
    /// Called when training starts.
    fn on_training_start(&mut self, _total_games: usize) -> Result<()> {
        Ok(())
    }

    /// Called when a game starts.
    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each half-move.
    ///
    /// # Parameters
    ///
    /// * `game_num` - Index of the current game (0-based)
    /// * `step_num` - Half-move number within the game (0-based)
    /// * `state` - Board before the move, from the mover's perspective
    /// * `action` - Action taken
    /// * `reward` - Immediate reward the mover received
    fn on_move(
        &mut self,
        _game_num: usize,
        _step_num: usize,
        _state: &BoardState,
        _action: Action,
        _reward: f64,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when a game ends.
    ///
    /// `final_state` is the terminal afterstate, seen from the side that
    /// made the last move.
    fn on_game_end(
        &mut self,
        _game_num: usize,
        _outcome: GameOutcome,
        _final_state: &BoardState,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
