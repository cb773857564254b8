#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow truncation when casting from usize to i32 since board dimensions are always small enough to fit in i32
    clippy::cast_possible_truncation,
    // Allow sign loss when going from signed to unsigned types since we validate values are non-negative before casting
    clippy::cast_sign_loss,
    // Allow potential wrapping when casting between types of same size as we validate values are in range
    clippy::cast_possible_wrap
)]

use bevy_ecs::prelude::*;

use crate::game::{self, LINE_SCORES, LINES_PER_LEVEL, STARTING_LEVEL};

/// The seven canonical piece tags. The set is closed; nothing introduces new
/// kinds at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Canonical base matrix for this kind. I is 4x4, O is 2x2, the rest 3x3.
    #[must_use]
    pub fn base_shape(self) -> Shape {
        match self {
            PieceKind::I => Shape::from_rows(&[
                [false, false, false, false],
                [true, true, true, true],
                [false, false, false, false],
                [false, false, false, false],
            ]),
            PieceKind::O => Shape::from_rows(&[[true, true], [true, true]]),
            PieceKind::T => Shape::from_rows(&[
                [false, true, false],
                [true, true, true],
                [false, false, false],
            ]),
            PieceKind::S => Shape::from_rows(&[
                [false, true, true],
                [true, true, false],
                [false, false, false],
            ]),
            PieceKind::Z => Shape::from_rows(&[
                [true, true, false],
                [false, true, true],
                [false, false, false],
            ]),
            PieceKind::J => Shape::from_rows(&[
                [true, false, false],
                [true, true, true],
                [false, false, false],
            ]),
            PieceKind::L => Shape::from_rows(&[
                [false, false, true],
                [true, true, true],
                [false, false, false],
            ]),
        }
    }

    #[must_use]
    pub fn color(self) -> ratatui::style::Color {
        match self {
            PieceKind::I => ratatui::style::Color::Cyan,
            PieceKind::O => ratatui::style::Color::Yellow,
            PieceKind::T => ratatui::style::Color::Magenta,
            PieceKind::S => ratatui::style::Color::Green,
            PieceKind::Z => ratatui::style::Color::Red,
            PieceKind::J => ratatui::style::Color::Blue,
            PieceKind::L => ratatui::style::Color::LightYellow,
        }
    }
}

/// A square boolean occupancy matrix. Every shape holds exactly four filled
/// cells through any number of rotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    cells: Vec<Vec<bool>>,
}

impl Shape {
    fn from_rows<const N: usize>(rows: &[[bool; N]]) -> Self {
        Self {
            cells: rows.iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Side length N of the matrix.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.cells[row][col]
    }

    /// Iterates the (row, col) coordinates of filled cells.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(col, _)| (row, col))
        })
    }

    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.filled_cells().count()
    }

    /// Candidate shape for a 90-degree clockwise rotation:
    /// `rotated[i][j] = cells[N-1-j][i]`. The caller decides whether the
    /// candidate is legal; this never inspects the board.
    #[must_use]
    pub fn rotated(&self) -> Shape {
        let n = self.size();
        let cells = (0..n)
            .map(|i| (0..n).map(|j| self.cells[n - 1 - j][i]).collect())
            .collect();
        Shape { cells }
    }
}

/// Grid anchor of a piece: the board position of the shape matrix's top-left
/// corner. `y` may be negative while a piece straddles the top edge.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// The falling piece. Replaced wholesale at each spawn; the shape matrix is
/// the current orientation.
#[derive(Component, Debug, Clone)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub shape: Shape,
}

impl Tetromino {
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            shape: kind.base_shape(),
        }
    }

    /// Spawn anchor for this shape: horizontally centered, top row at y = 0.
    #[must_use]
    pub fn spawn_position(&self, board_width: usize) -> Position {
        Position {
            x: (board_width / 2) as i32 - (self.shape.size() / 2) as i32,
            y: 0,
        }
    }
}

/// The persistent locked-cell grid, row-major with row 0 at the top. Cells
/// become tagged only by locking a piece and empty only by line removal.
#[derive(Resource, Debug, Clone)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    cells: Vec<Vec<Option<PieceKind>>>,
}

impl Board {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![None; width]; height],
        }
    }

    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(None);
        }
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<PieceKind> {
        self.cells[y][x]
    }

    pub fn set_cell(&mut self, x: usize, y: usize, kind: Option<PieceKind>) {
        self.cells[y][x] = kind;
    }

    /// Whether `shape` anchored at `anchor` is a legal occupancy: every
    /// filled cell in bounds horizontally, above the floor, and not
    /// overlapping a locked cell. Cells above the visible board (y < 0) are
    /// legal so freshly spawned pieces may straddle the top edge.
    #[must_use]
    pub fn is_legal(&self, shape: &Shape, anchor: Position) -> bool {
        for (row, col) in shape.filled_cells() {
            let x = anchor.x + col as i32;
            let y = anchor.y + row as i32;

            if x < 0 || x >= self.width as i32 || y >= self.height as i32 {
                return false;
            }

            if y >= 0 && self.cells[y as usize][x as usize].is_some() {
                return false;
            }
        }

        true
    }

    /// Commits a piece into the grid. The caller must have verified legality;
    /// locking an illegal occupancy is a programming error.
    pub fn place(&mut self, shape: &Shape, anchor: Position, kind: PieceKind) {
        debug_assert!(
            self.is_legal(shape, anchor),
            "place() called with an illegal occupancy at ({}, {})",
            anchor.x,
            anchor.y
        );

        for (row, col) in shape.filled_cells() {
            let x = anchor.x + col as i32;
            let y = anchor.y + row as i32;

            if y >= 0 {
                self.cells[y as usize][x as usize] = Some(kind);
            }
        }
    }

    /// Removes every full row, shifting the rows above down and inserting an
    /// empty row at the top for each. Scans bottom-to-top and re-examines the
    /// same index after a removal, since the shifted content may be full too.
    /// Returns the number of rows cleared.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = self.height;

        while y > 0 {
            y -= 1;
            if self.cells[y].iter().all(Option::is_some) {
                self.cells.remove(y);
                self.cells.insert(0, vec![None; self.width]);
                cleared += 1;
                // The row that shifted into this index has not been examined.
                y += 1;
            }
        }

        cleared
    }
}

/// Session run state. `GameOver` is terminal: everything but `Reset` is
/// ignored until a fresh session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    GameOver,
}

/// All mutable session state outside the board: score, level, lines, the
/// gravity accumulator, and the single-slot next-piece buffer.
#[derive(Resource, Debug, Clone)]
pub struct GameSession {
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
    pub run_state: RunState,
    /// Seconds accumulated toward the next gravity step. Preserved across
    /// pause/resume.
    pub drop_timer: f32,
    pub next_piece: Option<Tetromino>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            score: 0,
            level: STARTING_LEVEL,
            lines_cleared: 0,
            run_state: RunState::default(),
            drop_timer: 0.0,
            next_piece: None,
        }
    }
}

impl GameSession {
    /// Current drop interval in seconds, derived from the level.
    #[must_use]
    pub fn drop_interval(&self) -> f32 {
        game::drop_interval_ms(self.level) as f32 / 1000.0
    }

    /// Awards the score for `n` cleared rows, updates the line total, and
    /// recomputes the level. Returns the new level if it increased.
    pub fn award_line_clear(&mut self, n: usize) -> Option<u32> {
        debug_assert!(n >= 1 && n < LINE_SCORES.len());

        self.score += LINE_SCORES[n] * self.level;
        self.lines_cleared += n as u32;

        let new_level = self.lines_cleared / LINES_PER_LEVEL + STARTING_LEVEL;
        if new_level > self.level {
            self.level = new_level;
            Some(new_level)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }
}

/// Piece selection: independent uniform draws over the seven kinds, no bag
/// deduplication, so back-to-back repeats are possible. Seedable so tests can
/// replay a sequence.
#[derive(Resource, Debug)]
pub struct PieceSource {
    rng: fastrand::Rng,
}

impl PieceSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn next_piece(&mut self) -> Tetromino {
        Tetromino::new(PieceKind::ALL[self.rng.usize(0..PieceKind::ALL.len())])
    }
}

impl Default for PieceSource {
    fn default() -> Self {
        Self::new()
    }
}
