//! Match play between two agents
//!
//! Agents only select actions here; nothing is learned.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{Agent, Environment},
    tictactoe::{Judgment, Player},
};

/// Result of one game from the first agent's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

/// Play one game between `agent1` and `agent2`.
///
/// The board is reversed after every move so each agent sees itself as `X`.
pub fn play_match<E: Environment>(
    env: &mut E,
    agent1: &mut dyn Agent,
    agent2: &mut dyn Agent,
    agent1_first: bool,
) -> Result<MatchResult> {
    env.reset();
    let mut agent1_moves = agent1_first;

    loop {
        let agent: &mut dyn Agent = if agent1_moves {
            &mut *agent1
        } else {
            &mut *agent2
        };

        let state = env.state();
        let action = agent.select_action(state.code(), &env.valid_actions())?;
        let (_, afterstate) = env.step(action)?;

        let mover_won = match afterstate.judgment() {
            Judgment::InProgress => None,
            Judgment::Impossible => {
                return Err(Error::UnresolvedOutcome {
                    state: afterstate.label(),
                });
            }
            Judgment::Draw => return Ok(MatchResult::Draw),
            Judgment::Win(player) => Some(player == Player::X),
        };
        if let Some(mover_won) = mover_won {
            return Ok(if mover_won == agent1_moves {
                MatchResult::Win
            } else {
                MatchResult::Loss
            });
        }

        env.set_state(afterstate.reverse());
        agent1_moves = !agent1_moves;
    }
}

/// Win/lose/draw counts for both seats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub first_move_win: usize,
    pub first_move_lose: usize,
    pub first_move_draw: usize,
    pub second_move_win: usize,
    pub second_move_lose: usize,
    pub second_move_draw: usize,
}

impl HeadToHead {
    pub fn record(&mut self, agent1_first: bool, result: MatchResult) {
        let slot = match (agent1_first, result) {
            (true, MatchResult::Win) => &mut self.first_move_win,
            (true, MatchResult::Loss) => &mut self.first_move_lose,
            (true, MatchResult::Draw) => &mut self.first_move_draw,
            (false, MatchResult::Win) => &mut self.second_move_win,
            (false, MatchResult::Loss) => &mut self.second_move_lose,
            (false, MatchResult::Draw) => &mut self.second_move_draw,
        };
        *slot += 1;
    }

    pub fn total_games(&self) -> usize {
        self.wins() + self.losses() + self.draws()
    }

    pub fn wins(&self) -> usize {
        self.first_move_win + self.second_move_win
    }

    pub fn losses(&self) -> usize {
        self.first_move_lose + self.second_move_lose
    }

    pub fn draws(&self) -> usize {
        self.first_move_draw + self.second_move_draw
    }
}

/// Play `games_per_seat` games with `agent1` moving first, each followed by
/// one with `agent1` moving second.
pub fn head_to_head<E: Environment>(
    env: &mut E,
    agent1: &mut dyn Agent,
    agent2: &mut dyn Agent,
    games_per_seat: usize,
) -> Result<HeadToHead> {
    let mut tally = HeadToHead::default();
    for _ in 0..games_per_seat {
        for agent1_first in [true, false] {
            let result = play_match(env, agent1, agent2, agent1_first)?;
            tally.record(agent1_first, result);
        }
    }

    log::debug!(
        "{} vs {}: {} wins, {} losses, {} draws",
        agent1.name(),
        agent2.name(),
        tally.wins(),
        tally.losses(),
        tally.draws()
    );
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        afterstates::AfterstateTable,
        q_learning::AfterstateAgent,
        tictactoe::{Action, StateCode, TicTacToeEnv, Variant},
    };

    /// Always plays the lowest legal action
    struct FirstLegal;

    impl Agent for FirstLegal {
        fn select_action(&mut self, _state: StateCode, legal: &[Action]) -> Result<Action> {
            legal.first().copied().ok_or(Error::NoValidActions)
        }

        fn update(
            &mut self,
            _state: StateCode,
            _action: Action,
            _reward: f64,
            _next_state: StateCode,
            _next_legal_actions: &[Action],
        ) -> Result<()> {
            Ok(())
        }

        fn policy(&self, _state: StateCode, _action: Action) -> Result<f64> {
            Ok(0.0)
        }

        fn name(&self) -> &str {
            "first-legal"
        }
    }

    #[test]
    fn test_scripted_match_seats() {
        // Lowest-cell play lets the opener complete the 2-4-6 diagonal
        let mut env = TicTacToeEnv::new(Variant::Standard);
        let mut a = FirstLegal;
        let mut b = FirstLegal;

        let first = play_match(&mut env, &mut a, &mut b, true).unwrap();
        assert_eq!(first, MatchResult::Win);

        let second = play_match(&mut env, &mut a, &mut b, false).unwrap();
        assert_eq!(second, MatchResult::Loss);
    }

    #[test]
    fn test_head_to_head_counts() {
        let mut env = TicTacToeEnv::new(Variant::Standard);
        let mut a = FirstLegal;
        let mut b = FirstLegal;

        let tally = head_to_head(&mut env, &mut a, &mut b, 3).unwrap();
        assert_eq!(tally.first_move_win, 3);
        assert_eq!(tally.second_move_lose, 3);
        assert_eq!(tally.total_games(), 6);
    }

    #[test]
    fn test_random_agents_play_out() {
        let table = Arc::new(AfterstateTable::build(Variant::Capture).unwrap());
        let mut env = TicTacToeEnv::new(Variant::Capture);
        let mut a = AfterstateAgent::random(Arc::clone(&table)).with_seed(1);
        let mut b = AfterstateAgent::random(table).with_seed(2);

        let tally = head_to_head(&mut env, &mut a, &mut b, 25).unwrap();
        assert_eq!(tally.total_games(), 50);
    }
}
