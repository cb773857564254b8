#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use log::{debug, info, trace};

use crate::components::{Board, GameSession, PieceSource, Position, RunState, Shape, Tetromino};
use crate::events::{EventQueue, GameEvent};
use crate::game::{HARD_DROP_POINTS, SOFT_DROP_POINTS};

/// Discrete player commands, delivered one at a time by the driver. Commands
/// are applied atomically between gravity ticks and never interleave with a
/// half-completed lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    RotateCw,
    SoftDrop,
    HardDrop,
    Pause,
    Resume,
    Reset,
}

/// Applies one player command against the current run state. Illegal moves
/// are silent no-ops: no state change, no event.
pub fn apply_command(world: &mut World, command: Command) {
    let run_state = world.resource::<GameSession>().run_state;

    match run_state {
        RunState::Idle => {
            // No session yet; Reset and Resume both begin one.
            if matches!(command, Command::Reset | Command::Resume) {
                start_session(world);
            }
        }
        RunState::GameOver => {
            // Terminal until reset.
            if command == Command::Reset {
                start_session(world);
            }
        }
        RunState::Paused => match command {
            Command::Resume => {
                // The drop accumulator keeps its partial progress.
                world.resource_mut::<GameSession>().run_state = RunState::Running;
                debug!("Session resumed");
            }
            Command::Reset => start_session(world),
            _ => {}
        },
        RunState::Running => match command {
            Command::MoveLeft => {
                if try_shift(world, -1) {
                    push_event(world, GameEvent::Moved);
                }
            }
            Command::MoveRight => {
                if try_shift(world, 1) {
                    push_event(world, GameEvent::Moved);
                }
            }
            Command::RotateCw => {
                if try_rotate(world) {
                    push_event(world, GameEvent::Rotated);
                }
            }
            Command::SoftDrop => soft_drop(world),
            Command::HardDrop => hard_drop(world),
            Command::Pause => {
                world.resource_mut::<GameSession>().run_state = RunState::Paused;
                debug!("Session paused");
            }
            Command::Resume => {}
            Command::Reset => start_session(world),
        },
    }
}

/// One external time tick. In `Running`, accumulates `delta_seconds` toward
/// the current drop interval; at the threshold, attempts one downward move of
/// the active piece, locking it if the move is illegal. At most one
/// gravity-driven move-or-lock occurs per call.
pub fn gravity_system(world: &mut World, delta_seconds: f32) {
    trace!("Gravity tick with delta: {delta_seconds}");

    let should_drop = {
        let mut session = world.resource_mut::<GameSession>();
        if !session.is_running() {
            return;
        }

        session.drop_timer += delta_seconds;
        if session.drop_timer >= session.drop_interval() {
            session.drop_timer = 0.0;
            true
        } else {
            false
        }
    };

    if should_drop && !try_descend(world) {
        lock_active_piece(world);
    }
}

/// Discards the board, active piece, and next-piece buffer, and begins a
/// fresh running session.
pub fn start_session(world: &mut World) {
    info!("Starting a new session");

    let pieces: Vec<Entity> = world
        .query_filtered::<Entity, With<Tetromino>>()
        .iter(world)
        .collect();
    for entity in pieces {
        world.despawn(entity);
    }

    world.resource_mut::<Board>().clear();

    let next = world.resource_mut::<PieceSource>().next_piece();
    {
        let mut session = world.resource_mut::<GameSession>();
        *session = GameSession {
            run_state: RunState::Running,
            next_piece: Some(next),
            ..GameSession::default()
        };
    }

    push_event(world, GameEvent::GameStarted);
    spawn_piece(world);
}

/// Promotes the buffered next piece to active and refills the buffer. An
/// immediately illegal spawn position ends the session.
pub fn spawn_piece(world: &mut World) {
    let replacement = world.resource_mut::<PieceSource>().next_piece();
    let buffered = world
        .resource_mut::<GameSession>()
        .next_piece
        .replace(replacement);
    let piece = match buffered {
        Some(piece) => piece,
        // Only reachable if a session begins with an empty buffer.
        None => world.resource_mut::<PieceSource>().next_piece(),
    };

    let position = piece.spawn_position(world.resource::<Board>().width);

    let blocked = !world.resource::<Board>().is_legal(&piece.shape, position);
    if blocked {
        info!("Spawn position blocked, session over");
        world.resource_mut::<GameSession>().run_state = RunState::GameOver;
        push_event(world, GameEvent::GameOver);
        return;
    }

    world.spawn((piece, position));
}

/// Lowest legal resting row for `shape` anchored at `anchor`: the greatest y
/// still legal when descending straight down. Pure; never mutates anything.
#[must_use]
pub fn ghost_drop_y(board: &Board, shape: &Shape, anchor: Position) -> i32 {
    let mut y = anchor.y;
    while board.is_legal(shape, Position { x: anchor.x, y: y + 1 }) {
        y += 1;
    }
    y
}

fn active_piece(world: &mut World) -> Option<(Entity, Tetromino, Position)> {
    let mut query = world.query::<(Entity, &Tetromino, &Position)>();
    query
        .iter(world)
        .next()
        .map(|(entity, piece, position)| (entity, piece.clone(), *position))
}

fn try_shift(world: &mut World, dx: i32) -> bool {
    let Some((entity, piece, position)) = active_piece(world) else {
        return false;
    };

    let candidate = Position {
        x: position.x + dx,
        y: position.y,
    };

    if !world.resource::<Board>().is_legal(&piece.shape, candidate) {
        return false;
    }

    world.entity_mut(entity).insert(candidate);
    true
}

fn try_rotate(world: &mut World) -> bool {
    let Some((entity, piece, position)) = active_piece(world) else {
        return false;
    };

    // Candidate orientation, unchanged anchor. No wall kicks: a blocked
    // rotation leaves the piece as it was.
    let rotated = piece.shape.rotated();

    if !world.resource::<Board>().is_legal(&rotated, position) {
        return false;
    }

    world.entity_mut(entity).insert(Tetromino {
        kind: piece.kind,
        shape: rotated,
    });
    true
}

/// Moves the active piece down one row if legal. Returns false when blocked
/// (or when no piece is active).
fn try_descend(world: &mut World) -> bool {
    let Some((entity, piece, position)) = active_piece(world) else {
        return false;
    };

    let candidate = Position {
        x: position.x,
        y: position.y + 1,
    };

    if !world.resource::<Board>().is_legal(&piece.shape, candidate) {
        return false;
    }

    world.entity_mut(entity).insert(candidate);
    true
}

fn soft_drop(world: &mut World) {
    if try_descend(world) {
        world.resource_mut::<GameSession>().score += SOFT_DROP_POINTS;
        push_event(world, GameEvent::Moved);
    } else if active_piece(world).is_some() {
        // The requested downward move was illegal: lock immediately.
        lock_active_piece(world);
    }
}

fn hard_drop(world: &mut World) {
    let Some((entity, piece, position)) = active_piece(world) else {
        return;
    };

    let final_y = {
        let board = world.resource::<Board>();
        ghost_drop_y(board, &piece.shape, position)
    };
    let distance = (final_y - position.y) as u32;

    world.entity_mut(entity).insert(Position {
        x: position.x,
        y: final_y,
    });

    {
        let mut session = world.resource_mut::<GameSession>();
        session.score += HARD_DROP_POINTS * distance;
        // A forced lock resets the accumulator just like a gravity lock.
        session.drop_timer = 0.0;
    }

    push_event(world, GameEvent::HardDropped(distance));
    lock_active_piece(world);
}

/// The lock-and-clear pipeline: commit the active piece into the board,
/// remove full rows, award score and level, then promote the buffered next
/// piece.
fn lock_active_piece(world: &mut World) {
    let Some((entity, piece, position)) = active_piece(world) else {
        return;
    };

    info!(
        "Locking {:?} at ({}, {})",
        piece.kind, position.x, position.y
    );

    {
        let mut board = world.resource_mut::<Board>();
        board.place(&piece.shape, position, piece.kind);
    }
    world.despawn(entity);

    let cleared = world.resource_mut::<Board>().clear_full_rows();
    if cleared > 0 {
        let leveled_up = world
            .resource_mut::<GameSession>()
            .award_line_clear(cleared);

        info!("Cleared {cleared} lines");
        push_event(world, GameEvent::LinesCleared(cleared));
        if let Some(new_level) = leveled_up {
            info!("Level up: {new_level}");
            push_event(world, GameEvent::LeveledUp(new_level));
        }
    }

    spawn_piece(world);
}

fn push_event(world: &mut World, event: GameEvent) {
    world.resource_mut::<EventQueue>().push(event);
}
