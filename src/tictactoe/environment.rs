//! Tic-Tac-Toe environment

use super::{
    board::{Action, BoardState, Judgment, Player},
    variant::Variant,
};
use crate::{Result, ports::Environment};

/// Environment for one rule variant, holding the board of the side to move
#[derive(Debug, Clone)]
pub struct TicTacToeEnv {
    variant: Variant,
    state: BoardState,
}

impl TicTacToeEnv {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            state: variant.initial_state(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Reward for the mover: +1 when its own line stands, -1 for the
    /// opponent's, 0 otherwise.
    pub fn reward(judgment: Judgment) -> f64 {
        match judgment {
            Judgment::Win(Player::X) => 1.0,
            Judgment::Win(Player::O) => -1.0,
            _ => 0.0,
        }
    }
}

impl Environment for TicTacToeEnv {
    fn valid_actions(&self) -> Vec<Action> {
        self.state.legal_actions()
    }

    fn step(&mut self, action: Action) -> Result<(f64, BoardState)> {
        self.state = self.state.apply(action)?;
        Ok((Self::reward(self.state.judgment()), self.state))
    }

    fn reset(&mut self) {
        self.state = self.variant.initial_state();
    }

    fn state(&self) -> BoardState {
        self.state
    }

    fn set_state(&mut self, state: BoardState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::PASS;

    #[test]
    fn test_step_rewards_own_line() {
        let mut env = TicTacToeEnv::new(Variant::Standard);
        env.set_state(BoardState::from_string(Variant::Standard, "XX.OO....").unwrap());

        let (reward, after) = env.step(2).unwrap();
        assert_eq!(reward, 1.0);
        assert_eq!(after.judgment(), Judgment::Win(Player::X));
        assert!(env.valid_actions().is_empty());
    }

    #[test]
    fn test_step_rejects_illegal_action() {
        let mut env = TicTacToeEnv::new(Variant::Standard);
        env.step(4).unwrap();
        assert!(env.step(4).is_err());
        assert!(env.step(PASS).is_err());
        assert!(env.step(12).is_err());
    }

    #[test]
    fn test_capture_reset_forbids_opening_pass() {
        let mut env = TicTacToeEnv::new(Variant::Capture);
        assert!(!env.valid_actions().contains(&PASS));

        env.step(4).unwrap();
        env.set_state(env.state().reverse());
        assert!(env.valid_actions().contains(&PASS));

        env.reset();
        assert_eq!(env.state(), Variant::Capture.initial_state());
    }

    #[test]
    fn test_capture_move_can_complete_opponent_line() {
        // Placing at 3 flips 6 and 7 but cannot reach 8.
        let mut env = TicTacToeEnv::new(Variant::Capture);
        env.set_state(BoardState::from_string(Variant::Capture, "......XXO").unwrap());

        let (reward, after) = env.step(3).unwrap();
        assert_eq!(after.label(), "...X..OOO");
        assert_eq!(after.judgment(), Judgment::Win(Player::O));
        assert_eq!(reward, -1.0);
    }
}
