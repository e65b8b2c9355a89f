//! Tic-Tac-Toe game implementation
//!
//! Boards are always seen from the side about to move: `X` is "me" and `O` is
//! the opponent. Turn alternation happens by reversing the board.

pub mod board;
pub mod environment;
pub mod game;
pub mod lines;
pub mod variant;

pub use board::{Action, BOARD_CELLS, BoardState, Cell, Judgment, PASS, Player, StateCode};
pub use environment::TicTacToeEnv;
pub use game::GameOutcome;
pub use lines::{LineAnalyzer, WINNING_LINES};
pub use variant::Variant;
