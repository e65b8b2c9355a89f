//! Game outcomes in absolute seats

use serde::{Deserialize, Serialize};

use super::board::{Judgment, Player};

/// Outcome of a game, with `X` the player who moved first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win(Player),
    Draw,
}

impl GameOutcome {
    /// Translate a final judgment, seen from the side that made the last
    /// move, into absolute seats.
    ///
    /// Returns `None` for boards that are still in progress or impossible.
    pub fn from_judgment(judgment: Judgment, last_mover: Player) -> Option<Self> {
        match judgment {
            Judgment::Win(Player::X) => Some(GameOutcome::Win(last_mover)),
            Judgment::Win(Player::O) => Some(GameOutcome::Win(last_mover.opponent())),
            Judgment::Draw => Some(GameOutcome::Draw),
            Judgment::InProgress | Judgment::Impossible => None,
        }
    }

    /// Swap the winner perspective (X ↔ O). Useful when mirroring games.
    pub fn swap_players(self) -> Self {
        match self {
            GameOutcome::Win(player) => GameOutcome::Win(player.opponent()),
            GameOutcome::Draw => GameOutcome::Draw,
        }
    }
}
