//! Self-play training driver
//!
//! One agent plays both sides. Each move is credited twice: the mover's own
//! afterstate on a terminal move, and the previous mover's afterstate once
//! the reply is known.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{Agent, Environment, Observer},
    tictactoe::{Action, GameOutcome, Player, StateCode},
};

/// Result of a self-play run, counted in absolute seats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Total games played
    pub total_games: usize,

    /// Games won by the side that moved first
    pub first_player_wins: usize,

    /// Games won by the side that moved second
    pub second_player_wins: usize,

    /// Number of draws
    pub draws: usize,

    pub first_player_win_rate: f64,
    pub second_player_win_rate: f64,
    pub draw_rate: f64,
}

impl TrainingResult {
    /// Create a new training result
    pub fn new(
        total_games: usize,
        first_player_wins: usize,
        second_player_wins: usize,
        draws: usize,
    ) -> Self {
        let rate = |count: usize| {
            if total_games > 0 {
                count as f64 / total_games as f64
            } else {
                0.0
            }
        };

        Self {
            total_games,
            first_player_wins,
            second_player_wins,
            draws,
            first_player_win_rate: rate(first_player_wins),
            second_player_win_rate: rate(second_player_wins),
            draw_rate: rate(draws),
        }
    }

    fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win(Player::X) => self.first_player_wins += 1,
            GameOutcome::Win(Player::O) => self.second_player_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
        self.total_games += 1;
        *self = Self::new(
            self.total_games,
            self.first_player_wins,
            self.second_player_wins,
            self.draws,
        );
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Self-play driver for one learning agent in one environment
pub struct SelfPlay<E: Environment> {
    env: E,
    observers: Vec<Box<dyn Observer>>,
}

impl<E: Environment> SelfPlay<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the driver
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// Play `games` games, learning from every move
    pub fn run<A: Agent>(&mut self, agent: &mut A, games: usize) -> Result<TrainingResult> {
        self.run_with(agent, games, |_, _| Ok(()))
    }

    /// Like [`Self::run`], calling `after_game(games_played, agent)` after
    /// every game so callers can checkpoint or evaluate mid-run.
    pub fn run_with<A, F>(
        &mut self,
        agent: &mut A,
        games: usize,
        mut after_game: F,
    ) -> Result<TrainingResult>
    where
        A: Agent,
        F: FnMut(usize, &A) -> Result<()>,
    {
        let mut result = TrainingResult::new(0, 0, 0, 0);

        // Notify observers of training start
        for observer in &mut self.observers {
            observer.on_training_start(games)?;
        }

        for game_num in 0..games {
            let outcome = self.play_game(game_num, agent)?;
            result.record(outcome);
            after_game(game_num + 1, agent)?;
        }

        // Notify observers of training end
        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        log::debug!(
            "Self-play finished: {} games, first {} / second {} / draw {}",
            result.total_games,
            result.first_player_wins,
            result.second_player_wins,
            result.draws
        );
        Ok(result)
    }

    /// Play one game against itself and apply the delayed updates
    pub fn play_game<A: Agent>(&mut self, game_num: usize, agent: &mut A) -> Result<GameOutcome> {
        for observer in &mut self.observers {
            observer.on_game_start(game_num)?;
        }

        self.env.reset();
        let mut previous: Option<(StateCode, Action)> = None;
        let mut mover = Player::X;
        let mut step_num = 0;

        loop {
            let state = self.env.state();
            let action = agent.select_action(state.code(), &self.env.valid_actions())?;
            let (reward, afterstate) = self.env.step(action)?;

            for observer in &mut self.observers {
                observer.on_move(game_num, step_num, &state, action, reward)?;
            }

            // The opponent's view of the same board
            let next = afterstate.reverse();
            let next_actions = next.legal_actions();

            if let Some((prev_state, prev_action)) = previous {
                agent.update(prev_state, prev_action, -reward, next.code(), &next_actions)?;
            }

            if afterstate.is_terminal() {
                agent.update(state.code(), action, reward, afterstate.code(), &[])?;

                let outcome = GameOutcome::from_judgment(afterstate.judgment(), mover)
                    .ok_or_else(|| Error::UnresolvedOutcome {
                        state: afterstate.label(),
                    })?;
                for observer in &mut self.observers {
                    observer.on_game_end(game_num, outcome, &afterstate)?;
                }
                return Ok(outcome);
            }

            previous = Some((state.code(), action));
            self.env.set_state(next);
            mover = mover.opponent();
            step_num += 1;
        }
    }
}
