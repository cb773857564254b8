#[cfg(test)]
mod tests {
    use crate::components::{Board, GameSession, PieceKind, Position, RunState, Tetromino};
    use crate::events::GameEvent;
    use crate::systems::{Command, ghost_drop_y};
    use crate::tests::test_utils::{
        active_piece, active_position, fill_row_except, locked_cell_count, set_active_piece,
        started_app,
    };

    #[test]
    fn reset_starts_a_running_session() {
        let mut app = crate::tests::test_utils::seeded_app(1);
        assert_eq!(app.run_state(), RunState::Idle);

        app.command(Command::Reset);

        assert_eq!(app.run_state(), RunState::Running);
        assert!(app.drain_events().contains(&GameEvent::GameStarted));
        assert!(active_piece(&mut app.world).is_some());

        let session = app.world.resource::<GameSession>();
        assert_eq!(session.score, 0);
        assert_eq!(session.level, 1);
        assert!(session.next_piece.is_some());
    }

    #[test]
    fn resume_starts_a_session_from_idle() {
        let mut app = crate::tests::test_utils::seeded_app(1);
        app.command(Command::Resume);
        assert_eq!(app.run_state(), RunState::Running);
    }

    #[test]
    fn horizontal_moves_stop_at_the_walls() {
        let mut app = started_app(2);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::O),
            Position { x: 4, y: 0 },
        );

        // The O matrix fills both its columns, so the anchor spans 0..=8
        for _ in 0..20 {
            app.command(Command::MoveLeft);
        }
        assert_eq!(active_position(&mut app.world).unwrap().x, 0);

        for _ in 0..20 {
            app.command(Command::MoveRight);
        }
        assert_eq!(active_position(&mut app.world).unwrap().x, 8);
    }

    #[test]
    fn successful_moves_emit_events_and_rejected_ones_do_not() {
        let mut app = started_app(2);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::O),
            Position { x: 0, y: 0 },
        );

        app.command(Command::MoveLeft);
        assert!(app.drain_events().is_empty(), "blocked move must be silent");

        app.command(Command::MoveRight);
        assert_eq!(app.drain_events(), vec![GameEvent::Moved]);
    }

    #[test]
    fn blocked_rotation_leaves_the_piece_unchanged() {
        let mut app = started_app(3);

        // A vertical I hugging the left wall has no room to swing horizontal
        let vertical = Tetromino {
            kind: PieceKind::I,
            shape: PieceKind::I.base_shape().rotated(),
        };
        set_active_piece(&mut app.world, vertical.clone(), Position { x: -2, y: 5 });

        app.command(Command::RotateCw);

        let (piece, position) = active_piece(&mut app.world).unwrap();
        assert_eq!(piece.shape, vertical.shape);
        assert_eq!(position, Position { x: -2, y: 5 });
        assert!(app.drain_events().is_empty());
    }

    #[test]
    fn rotation_in_the_open_emits_rotated() {
        let mut app = started_app(3);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::T),
            Position { x: 4, y: 5 },
        );

        app.command(Command::RotateCw);

        let (piece, _) = active_piece(&mut app.world).unwrap();
        assert_eq!(piece.shape, PieceKind::T.base_shape().rotated());
        assert_eq!(app.drain_events(), vec![GameEvent::Rotated]);
    }

    #[test]
    fn soft_drop_descends_and_scores_one_point() {
        let mut app = started_app(4);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::T),
            Position { x: 4, y: 0 },
        );

        app.command(Command::SoftDrop);

        assert_eq!(active_position(&mut app.world).unwrap().y, 1);
        assert_eq!(app.world.resource::<GameSession>().score, 1);
        assert_eq!(app.drain_events(), vec![GameEvent::Moved]);
    }

    #[test]
    fn soft_drop_against_the_floor_locks_immediately() {
        let mut app = started_app(4);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::O),
            Position { x: 4, y: 18 },
        );

        app.command(Command::SoftDrop);

        // Piece locked, no descent point, replacement spawned from the buffer
        let board = app.world.resource::<Board>();
        assert_eq!(board.cell(4, 18), Some(PieceKind::O));
        assert_eq!(board.cell(5, 19), Some(PieceKind::O));
        assert_eq!(app.world.resource::<GameSession>().score, 0);
        assert!(active_piece(&mut app.world).is_some());
    }

    #[test]
    fn hard_drop_scores_twice_the_distance_and_locks() {
        let mut app = started_app(5);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::O),
            Position { x: 4, y: 0 },
        );

        app.command(Command::HardDrop);

        // O descends from anchor 0 to 18 on an empty board
        let board = app.world.resource::<Board>();
        assert_eq!(board.cell(4, 18), Some(PieceKind::O));
        assert_eq!(board.cell(5, 19), Some(PieceKind::O));
        assert_eq!(app.world.resource::<GameSession>().score, 36);

        let events = app.drain_events();
        assert!(events.contains(&GameEvent::HardDropped(18)));

        // The buffered piece took over immediately
        assert!(active_piece(&mut app.world).is_some());
    }

    #[test]
    fn completing_a_nine_tenths_row_clears_it() {
        let mut app = started_app(6);

        {
            let mut board = app.world.resource_mut::<Board>();
            fill_row_except(&mut board, 19, &[0]);
        }

        // Vertical I over the open column
        let vertical = Tetromino {
            kind: PieceKind::I,
            shape: PieceKind::I.base_shape().rotated(),
        };
        set_active_piece(&mut app.world, vertical, Position { x: -2, y: 0 });

        app.command(Command::HardDrop);

        let session = app.world.resource::<GameSession>();
        assert_eq!(session.lines_cleared, 1);
        // 16 rows of hard drop plus one single-line clear at level 1
        assert_eq!(session.score, 2 * 16 + 40);

        // The cleared row is gone; the rest of the I shifted down onto it
        let board = app.world.resource::<Board>();
        assert_eq!(board.cell(0, 19), Some(PieceKind::I));
        assert_eq!(board.cell(0, 18), Some(PieceKind::I));
        assert_eq!(board.cell(0, 17), Some(PieceKind::I));
        assert_eq!(board.cell(1, 19), None);
        assert_eq!(locked_cell_count(board), 3);

        let events = app.drain_events();
        assert!(events.contains(&GameEvent::LinesCleared(1)));
    }

    #[test]
    fn quadruple_clear_at_level_one_scores_1200() {
        let mut app = started_app(7);

        {
            let mut board = app.world.resource_mut::<Board>();
            for y in 16..20 {
                fill_row_except(&mut board, y, &[0]);
            }
        }

        let vertical = Tetromino {
            kind: PieceKind::I,
            shape: PieceKind::I.base_shape().rotated(),
        };
        set_active_piece(&mut app.world, vertical, Position { x: -2, y: 0 });

        app.command(Command::HardDrop);

        let session = app.world.resource::<GameSession>();
        assert_eq!(session.lines_cleared, 4);
        assert_eq!(session.score, 2 * 16 + 1200);
        assert_eq!(locked_cell_count(app.world.resource::<Board>()), 0);

        let events = app.drain_events();
        assert!(events.contains(&GameEvent::LinesCleared(4)));
    }

    #[test]
    fn clearing_the_tenth_line_levels_up() {
        let mut app = started_app(8);

        {
            let mut session = app.world.resource_mut::<GameSession>();
            session.lines_cleared = 9;
        }
        {
            let mut board = app.world.resource_mut::<Board>();
            fill_row_except(&mut board, 19, &[4, 5]);
        }

        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::O),
            Position { x: 4, y: 18 },
        );

        app.command(Command::HardDrop);

        let session = app.world.resource::<GameSession>();
        assert_eq!(session.level, 2);
        assert_eq!(session.lines_cleared, 10);

        let events = app.drain_events();
        assert!(events.contains(&GameEvent::LeveledUp(2)));
        // The clear event precedes the level-up event
        let cleared_at = events
            .iter()
            .position(|e| matches!(e, GameEvent::LinesCleared(_)))
            .unwrap();
        let leveled_at = events
            .iter()
            .position(|e| matches!(e, GameEvent::LeveledUp(_)))
            .unwrap();
        assert!(cleared_at < leveled_at);
    }

    #[test]
    fn gravity_descends_after_one_drop_interval() {
        let mut app = started_app(9);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::T),
            Position { x: 4, y: 0 },
        );

        // Level 1 interval is one second
        app.tick(0.5);
        assert_eq!(active_position(&mut app.world).unwrap().y, 0);

        app.tick(0.5);
        assert_eq!(active_position(&mut app.world).unwrap().y, 1);

        // At most one gravity move per tick, however large the delta
        app.tick(10.0);
        assert_eq!(active_position(&mut app.world).unwrap().y, 2);
    }

    #[test]
    fn manual_moves_do_not_reset_the_gravity_accumulator() {
        let mut app = started_app(9);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::T),
            Position { x: 4, y: 0 },
        );

        app.tick(0.9);
        app.command(Command::MoveLeft);
        app.command(Command::RotateCw);

        // The accumulated 0.9s still counts toward the next drop
        app.tick(0.1);
        assert_eq!(active_position(&mut app.world).unwrap().y, 1);
    }

    #[test]
    fn pause_freezes_gravity_but_keeps_the_accumulator() {
        let mut app = started_app(10);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::T),
            Position { x: 4, y: 0 },
        );

        app.tick(0.7);
        app.command(Command::Pause);
        assert_eq!(app.run_state(), RunState::Paused);

        // Time passing while paused accrues nothing
        app.tick(30.0);
        assert_eq!(active_position(&mut app.world).unwrap().y, 0);

        app.command(Command::Resume);
        app.tick(0.3);
        assert_eq!(active_position(&mut app.world).unwrap().y, 1);
    }

    #[test]
    fn paused_sessions_reject_movement_commands() {
        let mut app = started_app(10);
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::T),
            Position { x: 4, y: 5 },
        );
        app.command(Command::Pause);
        app.drain_events();

        app.command(Command::MoveLeft);
        app.command(Command::RotateCw);
        app.command(Command::SoftDrop);
        app.command(Command::HardDrop);

        let (piece, position) = active_piece(&mut app.world).unwrap();
        assert_eq!(position, Position { x: 4, y: 5 });
        assert_eq!(piece.shape, PieceKind::T.base_shape());
        assert!(app.drain_events().is_empty());
        assert_eq!(app.world.resource::<GameSession>().score, 0);
    }

    #[test]
    fn blocked_spawn_ends_the_session() {
        let mut app = started_app(11);

        // Wall off the spawn rows so the next piece cannot appear
        {
            let mut board = app.world.resource_mut::<Board>();
            for y in 0..3 {
                for x in 2..8 {
                    board.set_cell(x, y, Some(PieceKind::J));
                }
            }
        }

        // Drop the current piece; promoting the buffer must fail
        set_active_piece(
            &mut app.world,
            Tetromino::new(PieceKind::O),
            Position { x: 0, y: 18 },
        );
        app.command(Command::SoftDrop);

        assert_eq!(app.run_state(), RunState::GameOver);
        assert!(app.drain_events().contains(&GameEvent::GameOver));
        assert!(active_piece(&mut app.world).is_none());
    }

    #[test]
    fn game_over_is_terminal_until_reset() {
        let mut app = started_app(11);

        {
            let mut session = app.world.resource_mut::<GameSession>();
            session.run_state = RunState::GameOver;
        }
        {
            let mut board = app.world.resource_mut::<Board>();
            board.set_cell(0, 19, Some(PieceKind::L));
        }
        app.drain_events();

        let before = app.world.resource::<Board>().clone();

        // Ticks and gameplay commands are all inert now
        app.tick(30.0);
        app.command(Command::MoveLeft);
        app.command(Command::HardDrop);
        app.command(Command::Pause);
        app.command(Command::Resume);

        assert_eq!(app.run_state(), RunState::GameOver);
        assert_eq!(
            locked_cell_count(app.world.resource::<Board>()),
            locked_cell_count(&before)
        );
        assert!(app.drain_events().is_empty());

        // Reset brings back a fresh running session on an empty board
        app.command(Command::Reset);
        assert_eq!(app.run_state(), RunState::Running);
        assert_eq!(
            locked_cell_count(app.world.resource::<Board>()),
            0
        );
        assert_eq!(app.world.resource::<GameSession>().score, 0);
    }

    #[test]
    fn ghost_projects_to_the_lowest_legal_row() {
        let mut app = started_app(12);
        let o = PieceKind::O.base_shape();

        {
            let board = app.world.resource::<Board>();
            assert_eq!(ghost_drop_y(board, &o, Position { x: 4, y: 0 }), 18);
        }

        // An obstacle in the drop column raises the resting row
        {
            let mut board = app.world.resource_mut::<Board>();
            board.set_cell(4, 19, Some(PieceKind::T));
        }
        let board = app.world.resource::<Board>();
        assert_eq!(ghost_drop_y(board, &o, Position { x: 4, y: 0 }), 17);

        // A piece already resting projects onto itself
        assert_eq!(ghost_drop_y(board, &o, Position { x: 4, y: 17 }), 17);
    }
}
