//! Rule variants: standard tic-tac-toe and the capture variant with a pass move

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{
    board::{BOARD_CELLS, BoardState, CELL_CODESPACE, Cell, Judgment, Player},
    lines::LineAnalyzer,
};

/// Game rules, chosen once when an environment or table is built
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Plain tic-tac-toe
    #[default]
    Standard,
    /// Placing a marker flips every adjacent marker; one consecutive pass allowed
    Capture,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Standard, Variant::Capture];

    /// Number of integer codes: 3^9, doubled when the pass flag exists
    pub fn codespace(self) -> u32 {
        match self {
            Variant::Standard => CELL_CODESPACE,
            Variant::Capture => 2 * CELL_CODESPACE,
        }
    }

    pub fn allows_pass(self) -> bool {
        matches!(self, Variant::Capture)
    }

    pub fn captures(self) -> bool {
        matches!(self, Variant::Capture)
    }

    /// Starting position.
    ///
    /// The capture variant starts flagged as if a pass had just happened, so
    /// the opening move cannot be a pass.
    pub fn initial_state(self) -> BoardState {
        BoardState::from_parts(self, [Cell::Empty; BOARD_CELLS], self.allows_pass())
    }

    /// Classify a board under this variant's rules
    pub(crate) fn judge(self, cells: &[Cell; BOARD_CELLS]) -> Judgment {
        let x_wins = LineAnalyzer::has_won(cells, Player::X);
        let o_wins = LineAnalyzer::has_won(cells, Player::O);

        match (x_wins, o_wins) {
            // Captures make double lines reachable, so they score as a draw
            (true, true) => match self {
                Variant::Standard => Judgment::Impossible,
                Variant::Capture => Judgment::Draw,
            },
            (true, false) => Judgment::Win(Player::X),
            (false, true) => Judgment::Win(Player::O),
            (false, false) if cells.contains(&Cell::Empty) => Judgment::InProgress,
            (false, false) => Judgment::Draw,
        }
    }

    /// Whether the afterstate table records transitions for this state.
    ///
    /// Standard boards must be non-terminal and balanced from the mover's
    /// side: equal counts (mover opened) or one fewer (opponent opened).
    /// Capture boards have no count invariant and only need a legal action.
    pub fn is_decision_state(self, state: &BoardState) -> bool {
        match self {
            Variant::Standard => {
                let (mine, theirs) = state.piece_counts();
                !state.is_terminal() && (mine == theirs || mine + 1 == theirs)
            }
            Variant::Capture => !state.legal_actions().is_empty(),
        }
    }

    /// Neighbours flipped by a capture at `pos`.
    ///
    /// Order: above, below, then the left column (up-left, left, down-left)
    /// unless `pos` is on the left edge, then the right column (up-right,
    /// right, down-right) unless `pos` is on the right edge.
    pub(crate) fn capture_neighbors(pos: usize) -> impl Iterator<Item = usize> {
        let col = pos % 3;
        let mut offsets: Vec<isize> = vec![-3, 3];
        if col != 0 {
            offsets.extend([-4, -1, 2]);
        }
        if col != 2 {
            offsets.extend([-2, 1, 4]);
        }

        offsets
            .into_iter()
            .map(move |offset| pos as isize + offset)
            .filter(|&target| (0..BOARD_CELLS as isize).contains(&target))
            .map(|target| target as usize)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Standard => write!(f, "standard"),
            Variant::Capture => write!(f, "capture"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_neighbors_center() {
        let neighbors: Vec<usize> = Variant::capture_neighbors(4).collect();
        assert_eq!(neighbors, vec![1, 7, 0, 3, 6, 2, 5, 8]);
    }

    #[test]
    fn test_capture_neighbors_corner() {
        let neighbors: Vec<usize> = Variant::capture_neighbors(0).collect();
        assert_eq!(neighbors, vec![3, 1, 4]);

        let neighbors: Vec<usize> = Variant::capture_neighbors(8).collect();
        assert_eq!(neighbors, vec![5, 4, 7]);
    }

    #[test]
    fn test_capture_neighbors_left_edge() {
        let neighbors: Vec<usize> = Variant::capture_neighbors(3).collect();
        assert_eq!(neighbors, vec![0, 6, 1, 4, 7]);
    }

    #[test]
    fn test_double_line_resolution() {
        // XXX
        // OOO
        // ...
        let mut cells = [Cell::Empty; BOARD_CELLS];
        for idx in 0..3 {
            cells[idx] = Cell::X;
            cells[idx + 3] = Cell::O;
        }

        assert_eq!(Variant::Standard.judge(&cells), Judgment::Impossible);
        assert_eq!(Variant::Capture.judge(&cells), Judgment::Draw);
    }

    #[test]
    fn test_initial_states() {
        let standard = Variant::Standard.initial_state();
        assert_eq!(standard.code(), 0);
        assert!(!standard.passed());

        let capture = Variant::Capture.initial_state();
        assert_eq!(capture.code(), CELL_CODESPACE);
        assert!(capture.passed());
        assert_eq!(capture.legal_actions(), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_standard_decision_filter() {
        let balanced = BoardState::from_string(Variant::Standard, "XO.......").unwrap();
        let behind = BoardState::from_string(Variant::Standard, "O........").unwrap();
        let ahead = BoardState::from_string(Variant::Standard, "X........").unwrap();

        assert!(Variant::Standard.is_decision_state(&balanced));
        assert!(Variant::Standard.is_decision_state(&behind));
        assert!(!Variant::Standard.is_decision_state(&ahead));
    }
}
