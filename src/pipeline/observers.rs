//! Observer implementations for self-play
//!
//! Observers allow composable data collection during training without coupling
//! the driver to specific output formats.

use std::{
    cell::{Ref, RefCell},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    rc::Rc,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::Observer,
    tictactoe::{Action, BoardState, GameOutcome, Player},
};

/// Observation of a single half-move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepObservation {
    /// Half-move number within the game
    pub step_num: usize,
    /// Board label before the move, mover's perspective
    pub state: String,
    /// Action taken ([`crate::tictactoe::PASS`] for a pass)
    pub action: Action,
    /// Immediate reward for the mover
    pub reward: f64,
}

/// Complete observation of a self-play game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub game_num: usize,
    /// Final outcome
    pub outcome: GameOutcome,
    /// Terminal afterstate label, seen by the last mover
    pub final_state: String,
    pub steps: Vec<StepObservation>,
    pub total_moves: usize,
}

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    first_wins: usize,
    second_wins: usize,
    draws: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            first_wins: 0,
            second_wins: 0,
            draws: 0,
        }
    }

    fn message(&self) -> String {
        format!(
            "{} S:{} D:{}",
            self.first_wins, self.second_wins, self.draws
        )
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_games: usize) -> Result<()> {
        let pb = ProgressBar::new(total_games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games (F:{msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_game_end(
        &mut self,
        game_num: usize,
        outcome: GameOutcome,
        _final_state: &BoardState,
    ) -> Result<()> {
        match outcome {
            GameOutcome::Win(Player::X) => self.first_wins += 1,
            GameOutcome::Win(Player::O) => self.second_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(game_num as u64 + 1);
            // Throttle message redraws
            if game_num.is_multiple_of(1000) {
                pb.set_message(self.message());
            }
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
pub struct MetricsObserver {
    first_wins: usize,
    second_wins: usize,
    draws: usize,
    total_games: usize,
    move_counts: Vec<usize>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self {
            first_wins: 0,
            second_wins: 0,
            draws: 0,
            total_games: 0,
            move_counts: Vec::new(),
        }
    }

    fn rate(&self, count: usize) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            count as f64 / self.total_games as f64
        }
    }

    pub fn first_player_win_rate(&self) -> f64 {
        self.rate(self.first_wins)
    }

    pub fn second_player_win_rate(&self) -> f64 {
        self.rate(self.second_wins)
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }

    /// Get average game length in half-moves
    pub fn avg_game_length(&self) -> f64 {
        if self.move_counts.is_empty() {
            0.0
        } else {
            self.move_counts.iter().sum::<usize>() as f64 / self.move_counts.len() as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_games: self.total_games,
            first_player_wins: self.first_wins,
            second_player_wins: self.second_wins,
            draws: self.draws,
            first_player_win_rate: self.first_player_win_rate(),
            second_player_win_rate: self.second_player_win_rate(),
            draw_rate: self.draw_rate(),
            avg_game_length: self.avg_game_length(),
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_games: usize,
    pub first_player_wins: usize,
    pub second_player_wins: usize,
    pub draws: usize,
    pub first_player_win_rate: f64,
    pub second_player_win_rate: f64,
    pub draw_rate: f64,
    pub avg_game_length: f64,
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        self.move_counts.push(0);
        Ok(())
    }

    fn on_move(
        &mut self,
        _game_num: usize,
        _step_num: usize,
        _state: &BoardState,
        _action: Action,
        _reward: f64,
    ) -> Result<()> {
        if let Some(last) = self.move_counts.last_mut() {
            *last += 1;
        }
        Ok(())
    }

    fn on_game_end(
        &mut self,
        _game_num: usize,
        outcome: GameOutcome,
        _final_state: &BoardState,
    ) -> Result<()> {
        self.total_games += 1;
        match outcome {
            GameOutcome::Win(Player::X) => self.first_wins += 1,
            GameOutcome::Win(Player::O) => self.second_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
        Ok(())
    }
}

/// Sample observer - logs the result and final board every `interval` games
pub struct SampleLogObserver {
    interval: usize,
}

impl SampleLogObserver {
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl Observer for SampleLogObserver {
    fn on_game_end(
        &mut self,
        game_num: usize,
        outcome: GameOutcome,
        final_state: &BoardState,
    ) -> Result<()> {
        let played = game_num + 1;
        if played.is_multiple_of(self.interval) {
            log::info!("game {played}: {outcome:?}\n{final_state}");
        }
        Ok(())
    }
}

/// Milestone observer - Tracks when self-play settles into draws
///
/// Converged self-play between two greedy sides is a draw every game, so the
/// last decisive game is a rough convergence marker.
#[derive(Debug, Default)]
pub struct MilestoneObserver {
    first_draw: Option<usize>,
    last_decisive: Option<usize>,
    games: usize,
}

impl MilestoneObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_draw(&self) -> Option<usize> {
        self.first_draw
    }

    pub fn last_decisive(&self) -> Option<usize> {
        self.last_decisive
    }

    pub fn games(&self) -> usize {
        self.games
    }
}

impl Observer for MilestoneObserver {
    fn on_game_end(
        &mut self,
        game_num: usize,
        outcome: GameOutcome,
        _final_state: &BoardState,
    ) -> Result<()> {
        self.games += 1;
        match outcome {
            GameOutcome::Draw => {
                self.first_draw.get_or_insert(game_num);
            }
            GameOutcome::Win(_) => self.last_decisive = Some(game_num),
        }
        Ok(())
    }
}

/// JSONL observer - Exports observations to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    current_game_steps: Vec<StepObservation>,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| crate::Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
            current_game_steps: Vec::new(),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        self.current_game_steps.clear();
        Ok(())
    }

    fn on_move(
        &mut self,
        _game_num: usize,
        step_num: usize,
        state: &BoardState,
        action: Action,
        reward: f64,
    ) -> Result<()> {
        self.current_game_steps.push(StepObservation {
            step_num,
            state: state.label(),
            action,
            reward,
        });
        Ok(())
    }

    fn on_game_end(
        &mut self,
        game_num: usize,
        outcome: GameOutcome,
        final_state: &BoardState,
    ) -> Result<()> {
        let observation = Observation {
            game_num,
            outcome,
            final_state: final_state.label(),
            total_moves: self.current_game_steps.len(),
            steps: std::mem::take(&mut self.current_game_steps),
        };

        // Write as JSONL (one JSON object per line)
        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Observer handle that stays readable after the driver takes ownership
///
/// ```
/// use afterstate::pipeline::{MetricsObserver, SharedObserver};
///
/// let metrics = SharedObserver::new(MetricsObserver::new());
/// let handle = metrics.clone();
/// // driver.with_observer(Box::new(metrics)) ... then after training:
/// assert_eq!(handle.borrow().summary().total_games, 0);
/// ```
pub struct SharedObserver<O> {
    inner: Rc<RefCell<O>>,
}

impl<O> SharedObserver<O> {
    pub fn new(observer: O) -> Self {
        Self {
            inner: Rc::new(RefCell::new(observer)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, O> {
        self.inner.borrow()
    }
}

impl<O> Clone for SharedObserver<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<O: Observer> Observer for SharedObserver<O> {
    fn on_training_start(&mut self, total_games: usize) -> Result<()> {
        self.inner.borrow_mut().on_training_start(total_games)
    }

    fn on_game_start(&mut self, game_num: usize) -> Result<()> {
        self.inner.borrow_mut().on_game_start(game_num)
    }

    fn on_move(
        &mut self,
        game_num: usize,
        step_num: usize,
        state: &BoardState,
        action: Action,
        reward: f64,
    ) -> Result<()> {
        self.inner
            .borrow_mut()
            .on_move(game_num, step_num, state, action, reward)
    }

    fn on_game_end(
        &mut self,
        game_num: usize,
        outcome: GameOutcome,
        final_state: &BoardState,
    ) -> Result<()> {
        self.inner
            .borrow_mut()
            .on_game_end(game_num, outcome, final_state)
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.inner.borrow_mut().on_training_end()
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufRead;

    use super::*;
    use crate::tictactoe::Variant;

    fn board() -> BoardState {
        BoardState::empty(Variant::Standard)
    }

    #[test]
    fn test_metrics_observer() {
        let mut observer = MetricsObserver::new();

        assert_eq!(observer.draw_rate(), 0.0);

        // Simulate 3 games
        observer
            .on_game_end(1, GameOutcome::Win(Player::X), &board())
            .unwrap();
        observer.on_game_end(2, GameOutcome::Draw, &board()).unwrap();
        observer
            .on_game_end(3, GameOutcome::Win(Player::X), &board())
            .unwrap();

        assert_eq!(observer.total_games, 3);
        assert_eq!(observer.first_wins, 2);
        assert_eq!(observer.draws, 1);
        assert_eq!(observer.second_wins, 0);
        assert!((observer.first_player_win_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_metrics_game_length() {
        let mut observer = MetricsObserver::new();
        observer.on_game_start(0).unwrap();
        for step in 0..5 {
            observer.on_move(0, step, &board(), step, 0.0).unwrap();
        }
        observer.on_game_start(1).unwrap();
        for step in 0..9 {
            observer.on_move(1, step, &board(), step, 0.0).unwrap();
        }
        assert_eq!(observer.avg_game_length(), 7.0);
    }

    #[test]
    fn test_milestone_observer() {
        let mut observer = MilestoneObserver::new();

        observer
            .on_game_end(0, GameOutcome::Win(Player::O), &board())
            .unwrap();
        assert_eq!(observer.last_decisive(), Some(0));
        assert_eq!(observer.first_draw(), None);

        observer.on_game_end(1, GameOutcome::Draw, &board()).unwrap();
        observer
            .on_game_end(2, GameOutcome::Win(Player::X), &board())
            .unwrap();
        observer.on_game_end(3, GameOutcome::Draw, &board()).unwrap();

        assert_eq!(observer.first_draw(), Some(1));
        assert_eq!(observer.last_decisive(), Some(2));
        assert_eq!(observer.games(), 4);
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_game() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("games.jsonl");

        let mut observer = JsonlObserver::new(&path).unwrap();
        for game in 0..2 {
            observer.on_game_start(game).unwrap();
            observer.on_move(game, 0, &board(), 4, 0.0).unwrap();
            let end = board().apply(4).unwrap();
            observer
                .on_game_end(game, GameOutcome::Draw, &end)
                .unwrap();
        }
        observer.on_training_end().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let observation: Observation = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(observation.game_num, 1);
        assert_eq!(observation.total_moves, 1);
        assert_eq!(observation.final_state, "....X....");
        assert_eq!(observation.outcome, GameOutcome::Draw);
    }

    #[test]
    fn test_shared_observer_exposes_inner_state() {
        let shared = SharedObserver::new(MetricsObserver::new());
        let mut boxed: Box<dyn Observer> = Box::new(shared.clone());

        boxed
            .on_game_end(0, GameOutcome::Win(Player::O), &board())
            .unwrap();
        assert_eq!(shared.borrow().summary().second_player_wins, 1);
    }
}
