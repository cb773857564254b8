#![warn(clippy::all, clippy::pedantic)]

pub mod config_tests;
pub mod systems_tests;

// Shared test helpers
pub mod test_utils {
    use bevy_ecs::prelude::*;

    use crate::app::App;
    use crate::components::{Board, PieceKind, PieceSource, Position, Tetromino};
    use crate::systems::Command;

    #[must_use]
    pub fn seeded_app(seed: u64) -> App {
        App::with_piece_source(PieceSource::seeded(seed))
    }

    /// An app with a running session and an already-drained event queue, so
    /// tests only observe the events they cause.
    #[must_use]
    pub fn started_app(seed: u64) -> App {
        let mut app = seeded_app(seed);
        app.command(Command::Reset);
        app.drain_events();
        app
    }

    /// Replaces the active piece with a specific one at a specific anchor.
    pub fn set_active_piece(world: &mut World, piece: Tetromino, position: Position) {
        let existing: Vec<Entity> = world
            .query_filtered::<Entity, With<Tetromino>>()
            .iter(world)
            .collect();
        for entity in existing {
            world.despawn(entity);
        }
        world.spawn((piece, position));
    }

    #[must_use]
    pub fn active_piece(world: &mut World) -> Option<(Tetromino, Position)> {
        world
            .query::<(&Tetromino, &Position)>()
            .iter(world)
            .next()
            .map(|(piece, position)| (piece.clone(), *position))
    }

    #[must_use]
    pub fn active_position(world: &mut World) -> Option<Position> {
        active_piece(world).map(|(_, position)| position)
    }

    /// Fills row `y` with locked cells except at the listed columns.
    pub fn fill_row_except(board: &mut Board, y: usize, skip: &[usize]) {
        for x in 0..board.width {
            if !skip.contains(&x) {
                board.set_cell(x, y, Some(PieceKind::J));
            }
        }
    }

    /// Count of locked cells on the board.
    #[must_use]
    pub fn locked_cell_count(board: &Board) -> usize {
        let mut count = 0;
        for y in 0..board.height {
            for x in 0..board.width {
                if board.cell(x, y).is_some() {
                    count += 1;
                }
            }
        }
        count
    }
}
