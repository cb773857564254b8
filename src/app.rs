#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow truncation when casting from usize to i32 since board dimensions are always small enough to fit in i32
    clippy::cast_possible_truncation,
    // Allow potential wrapping when casting between types as board coordinates are within reasonable ranges
    clippy::cast_possible_wrap
)]

use bevy_ecs::prelude::*;
use std::error;

use crate::Time;
use crate::components::{
    Board, GameSession, PieceKind, PieceSource, Position, RunState, Shape, Tetromino,
};
use crate::events::{EventQueue, GameEvent};
use crate::game::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::systems::{self, Command};

pub type AppResult<T> = std::result::Result<T, Box<dyn error::Error>>;

/// Read-only view of the session for one rendered frame: locked cells, the
/// active piece and its ghost, the next-piece preview, and the tracked
/// score/level/lines.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub locked: Vec<(Position, PieceKind)>,
    pub active: Vec<(Position, PieceKind)>,
    pub ghost: Vec<Position>,
    pub next: Option<(PieceKind, Shape)>,
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
    pub run_state: RunState,
}

/// Owns the world and with it every piece of mutable session state. All
/// engine mutation goes through `command` and `tick`; everything else reads.
pub struct App {
    pub world: World,
    pub should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::with_piece_source(PieceSource::new())
    }

    /// Builds an app with a caller-supplied piece source, so tests can seed
    /// the piece sequence.
    #[must_use]
    pub fn with_piece_source(source: PieceSource) -> Self {
        let mut world = World::new();
        world.insert_resource(Time::new());
        world.insert_resource(Board::new(BOARD_WIDTH, BOARD_HEIGHT));
        world.insert_resource(GameSession::default());
        world.insert_resource(EventQueue::default());
        world.insert_resource(source);

        Self {
            world,
            should_quit: false,
        }
    }

    /// Applies one player command.
    pub fn command(&mut self, command: Command) {
        systems::apply_command(&mut self.world, command);
    }

    /// Advances gravity by the elapsed frame time.
    pub fn tick(&mut self, delta_seconds: f32) {
        systems::gravity_system(&mut self.world, delta_seconds);
    }

    /// Events accumulated since the last drain, in the order they fired.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.resource_mut::<EventQueue>().drain()
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.world.resource::<GameSession>().run_state
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.world.resource::<GameSession>().score
    }

    /// Builds the per-frame render snapshot.
    pub fn snapshot(&mut self) -> Snapshot {
        let mut locked = Vec::new();
        {
            let board = self.world.resource::<Board>();
            for y in 0..board.height {
                for x in 0..board.width {
                    if let Some(kind) = board.cell(x, y) {
                        locked.push((
                            Position {
                                x: x as i32,
                                y: y as i32,
                            },
                            kind,
                        ));
                    }
                }
            }
        }

        let mut active = Vec::new();
        let mut ghost = Vec::new();
        let piece = self
            .world
            .query::<(&Tetromino, &Position)>()
            .iter(&self.world)
            .next()
            .map(|(piece, position)| (piece.clone(), *position));

        if let Some((piece, position)) = piece {
            let board = self.world.resource::<Board>();
            let ghost_y = systems::ghost_drop_y(board, &piece.shape, position);

            for (row, col) in piece.shape.filled_cells() {
                active.push((
                    Position {
                        x: position.x + col as i32,
                        y: position.y + row as i32,
                    },
                    piece.kind,
                ));
                ghost.push(Position {
                    x: position.x + col as i32,
                    y: ghost_y + row as i32,
                });
            }
        }

        let session = self.world.resource::<GameSession>();
        Snapshot {
            locked,
            active,
            ghost,
            next: session
                .next_piece
                .as_ref()
                .map(|piece| (piece.kind, piece.shape.clone())),
            score: session.score,
            level: session.level,
            lines_cleared: session.lines_cleared,
            run_state: session.run_state,
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
