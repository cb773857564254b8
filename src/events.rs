#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;

/// Fire-and-forget notifications for collaborators outside the engine (sound
/// effects, UI chrome, high-score persistence). Rejected moves emit nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    GameStarted,
    Moved,
    Rotated,
    LinesCleared(usize),
    LeveledUp(u32),
    HardDropped(u32),
    GameOver,
}

/// Events accumulated since the driver last drained the queue. The engine
/// only pushes; the driver drains once per frame.
#[derive(Resource, Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
