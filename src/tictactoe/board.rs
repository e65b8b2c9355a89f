//! Board state representation and canonical integer codes

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{lines::LineAnalyzer, variant::Variant};

/// Number of cells on the 3x3 board
pub const BOARD_CELLS: usize = 9;

/// Number of distinct cell configurations (3^9)
pub(crate) const CELL_CODESPACE: u32 = 19_683;

/// Action index: a cell position (0-8), or [`PASS`]
pub type Action = usize;

/// Canonical integer code of a board state
pub type StateCode = u32;

/// Pass sentinel, only legal in the capture variant
pub const PASS: Action = BOARD_CELLS;

/// A cell on the Tic-Tac-Toe board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | '_' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' | '0' => Some(Cell::O),
            _ => None,
        }
    }

    /// Base-3 digit of this cell in the canonical code
    fn digit(self) -> u32 {
        match self {
            Cell::Empty => 0,
            Cell::X => 1,
            Cell::O => 2,
        }
    }

    fn from_digit(digit: u32) -> Cell {
        match digit {
            0 => Cell::Empty,
            1 => Cell::X,
            _ => Cell::O,
        }
    }

    fn swapped(self) -> Cell {
        match self {
            Cell::X => Cell::O,
            Cell::O => Cell::X,
            Cell::Empty => Cell::Empty,
        }
    }
}

/// A player in the game
///
/// Inside a [`BoardState`], `X` is always the side about to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the opponent player
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Convert player to cell
    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }
}

/// Classification of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgment {
    InProgress,
    Win(Player),
    Draw,
    /// Both players hold a line; unreachable in the standard variant
    Impossible,
}

impl Judgment {
    pub fn is_terminal(self) -> bool {
        self != Judgment::InProgress
    }

    /// Swap the winner perspective (X ↔ O)
    pub fn swap_players(self) -> Self {
        match self {
            Judgment::Win(player) => Judgment::Win(player.opponent()),
            other => other,
        }
    }
}

/// Board cells plus the capture variant's `passed` flag
///
/// States are values: every transformation returns a new state. The judgment
/// is computed once when the state is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardState {
    cells: [Cell; BOARD_CELLS],
    passed: bool,
    variant: Variant,
    judgment: Judgment,
}

impl BoardState {
    /// Create an empty board without the pass flag
    pub fn empty(variant: Variant) -> Self {
        Self::from_parts(variant, [Cell::Empty; BOARD_CELLS], false)
    }

    pub(crate) fn from_parts(variant: Variant, cells: [Cell; BOARD_CELLS], passed: bool) -> Self {
        BoardState {
            cells,
            passed,
            variant,
            judgment: variant.judge(&cells),
        }
    }

    /// Build a state from explicit cells.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PassNotSupported`] when `passed` is set on a
    /// standard board.
    pub fn from_cells(
        variant: Variant,
        cells: [Cell; BOARD_CELLS],
        passed: bool,
    ) -> Result<Self, crate::Error> {
        if passed && !variant.allows_pass() {
            return Err(crate::Error::PassNotSupported);
        }
        Ok(Self::from_parts(variant, cells, passed))
    }

    /// Decode a canonical code back into a state
    ///
    /// Cell `i` is the `i`-th base-3 digit; the capture variant stores the
    /// pass flag as one extra leading digit.
    ///
    /// # Errors
    ///
    /// Returns an error if `code` lies outside the variant's codespace.
    pub fn decode(variant: Variant, code: StateCode) -> Result<Self, crate::Error> {
        let codespace = variant.codespace();
        if code >= codespace {
            return Err(crate::Error::InvalidCode {
                code,
                codespace,
                variant,
            });
        }

        let passed = code >= CELL_CODESPACE;
        let mut rest = code % CELL_CODESPACE;
        let mut cells = [Cell::Empty; BOARD_CELLS];
        for cell in &mut cells {
            *cell = Cell::from_digit(rest % 3);
            rest /= 3;
        }

        Ok(Self::from_parts(variant, cells, passed))
    }

    /// Canonical integer code of this state
    pub fn code(&self) -> StateCode {
        let board = self
            .cells
            .iter()
            .rev()
            .fold(0, |acc, cell| acc * 3 + cell.digit());
        if self.passed {
            board + CELL_CODESPACE
        } else {
            board
        }
    }

    /// Create a board from a string representation.
    ///
    /// Nine cell characters (`.`/`_`, `x`, `o`; whitespace is ignored),
    /// optionally followed by `p` to mark a capture-variant board whose last
    /// move was a pass.
    ///
    /// # Errors
    ///
    /// Returns error if the board is too short, contains an invalid
    /// character, or sets the pass flag on a standard board.
    pub fn from_string(variant: Variant, s: &str) -> Result<Self, crate::Error> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() < BOARD_CELLS {
            return Err(crate::Error::InvalidBoardLength {
                expected: BOARD_CELLS,
                got: chars.len(),
                context: s.to_string(),
            });
        }

        let mut cells = [Cell::Empty; BOARD_CELLS];
        for (i, &c) in chars.iter().take(BOARD_CELLS).enumerate() {
            cells[i] = Cell::from_char(c).ok_or_else(|| crate::Error::InvalidCellCharacter {
                character: c,
                position: i,
                context: s.to_string(),
            })?;
        }

        let passed = match &chars[BOARD_CELLS..] {
            [] => false,
            ['p' | 'P'] => true,
            [c, ..] => {
                return Err(crate::Error::InvalidCellCharacter {
                    character: *c,
                    position: BOARD_CELLS,
                    context: s.to_string(),
                });
            }
        };

        Self::from_cells(variant, cells, passed)
    }

    /// Compact one-line label, the inverse of [`BoardState::from_string`]
    pub fn label(&self) -> String {
        let mut label: String = self.cells.iter().map(|&c| c.to_char()).collect();
        if self.passed {
            label.push('p');
        }
        label
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.cells
    }

    /// Get cell at position (0-8)
    pub fn get(&self, pos: usize) -> Cell {
        self.cells[pos]
    }

    /// Whether the previous move was a pass
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn judgment(&self) -> Judgment {
        self.judgment
    }

    /// Check if the game is over (win, draw or impossible board)
    pub fn is_terminal(&self) -> bool {
        self.judgment.is_terminal()
    }

    /// Count `(X, O)` pieces on the board
    pub fn piece_counts(&self) -> (usize, usize) {
        self.cells.iter().fold((0, 0), |(x, o), cell| match cell {
            Cell::X => (x + 1, o),
            Cell::O => (x, o + 1),
            Cell::Empty => (x, o),
        })
    }

    /// Get all empty positions
    pub fn empty_positions(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Cell::Empty)
            .map(|(i, _)| i)
            .collect()
    }

    /// Legal actions: empty cells, plus [`PASS`] when the variant allows it
    /// and the previous move was not a pass. Empty once the game is over.
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut actions = self.empty_positions();
        if self.variant.allows_pass() && !self.passed {
            actions.push(PASS);
        }
        actions
    }

    pub fn is_legal(&self, action: Action) -> bool {
        if self.is_terminal() {
            return false;
        }
        if action == PASS {
            return self.variant.allows_pass() && !self.passed;
        }
        action < BOARD_CELLS && self.cells[action] == Cell::Empty
    }

    /// Apply an action for the side to move (always `X` in this frame).
    ///
    /// In the capture variant a placement also flips every occupied
    /// neighbouring cell and clears the pass flag; [`PASS`] only sets it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::IllegalAction`] if the action is not legal here.
    #[must_use = "apply returns a new board state; this one is unchanged"]
    pub fn apply(&self, action: Action) -> Result<BoardState, crate::Error> {
        if !self.is_legal(action) {
            return Err(crate::Error::IllegalAction {
                action,
                state: self.label(),
            });
        }

        if action == PASS {
            return Ok(Self::from_parts(self.variant, self.cells, true));
        }

        let mut cells = self.cells;
        cells[action] = Cell::X;
        if self.variant.captures() {
            for neighbor in Variant::capture_neighbors(action) {
                cells[neighbor] = cells[neighbor].swapped();
            }
        }

        Ok(Self::from_parts(self.variant, cells, false))
    }

    /// Swap X and O pieces on the board; the pass flag is kept.
    ///
    /// Used to hand the board to the other side, who then sees itself as `X`.
    #[must_use = "reverse returns a new board state; this one is unchanged"]
    pub fn reverse(&self) -> Self {
        let mut cells = self.cells;
        for cell in &mut cells {
            *cell = cell.swapped();
        }
        Self::from_parts(self.variant, cells, self.passed)
    }

    /// Check if a player has three in a row
    pub fn has_won(&self, player: Player) -> bool {
        LineAnalyzer::has_won(&self.cells, player)
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &cell) in self.cells.iter().enumerate() {
            write!(f, "{}", cell.to_char())?;
            if (i + 1).is_multiple_of(3) && i < 8 {
                writeln!(f)?;
            }
        }
        if self.passed {
            write!(f, " passed")?;
        }
        Ok(())
    }
}
