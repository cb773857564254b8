#![warn(clippy::all, clippy::pedantic)]

use std::io;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use gridfall::Time;
use gridfall::app::{App, AppResult};
use gridfall::components::RunState;
use gridfall::events::GameEvent;
use gridfall::sound::AudioState;
use gridfall::systems::Command;
use gridfall::{config, highscores, ui};
use log::{error, info};
use ratatui::{Terminal, prelude::*};

fn main() -> AppResult<()> {
    // Create log file and redirect stderr to it so the TUI stays clean
    let log_path = "gridfall.log";
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .expect("Failed to create log file");

    let stderr_handle = std::io::stderr();
    let stderr_fd = stderr_handle.as_raw_fd();
    let log_file_fd = log_file.as_raw_fd();

    // Safety: We're redirecting stderr to our log file using standard POSIX operations
    unsafe {
        libc::dup2(log_file_fd, stderr_fd);
    }

    // Configure the logger to use stderr (which is now redirected to our file)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    info!("Starting gridfall");

    let app_config = match config::load_config_from_file() {
        Ok(loaded) => {
            info!("Configuration loaded successfully");
            loaded
        }
        Err(e) => {
            error!("Failed to load configuration: {e:?}");
            config::Config::default()
        }
    };

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let render_rate = Duration::from_millis(33); // ~30 FPS
    let game_tick_rate = Duration::from_millis(50); // Game logic updates less often

    let app = App::new();
    let res = run_app(&mut terminal, app, &app_config, render_rate, game_tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Game error: {err:?}");
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    app_config: &config::Config,
    render_rate: Duration,
    game_tick_rate: Duration,
) -> AppResult<()> {
    let mut last_render = Instant::now();
    let mut last_game_tick = Instant::now();

    let mut audio = AudioState::with_config(&app_config.audio);
    let mut high_score = highscores::load_high_score();

    // Flush any input events already buffered before the game begins
    while crossterm::event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    let mut audio_error_logged = false;

    loop {
        if last_render.elapsed() >= render_rate {
            terminal.draw(|f| ui::render(f, &mut app, high_score))?;
            last_render = Instant::now();
        }

        if last_game_tick.elapsed() >= game_tick_rate {
            let delta_seconds = last_game_tick.elapsed().as_secs_f32();
            last_game_tick = Instant::now();

            {
                let mut time = app.world.resource_mut::<Time>();
                time.update();
            }

            if !audio.is_audio_available() && !audio_error_logged {
                error!("Audio device is unavailable. Continuing without sound.");
                audio_error_logged = true;
            }

            if app.should_quit {
                save_audio_config(&audio, app_config);
                return Ok(());
            }

            app.tick(delta_seconds);
            high_score = handle_events(&mut app, &audio, high_score);
        }

        // Process keyboard input
        if crossterm::event::poll(Duration::from_millis(5))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == event::KeyEventKind::Release {
                    continue;
                }

                match key.code {
                    KeyCode::Char('q') => {
                        app.should_quit = true;
                        continue;
                    }
                    KeyCode::Char('m') => {
                        audio.toggle_sound();
                        continue;
                    }
                    KeyCode::Char('+' | '=') => {
                        let volume = audio.get_volume();
                        audio.set_volume(volume + 0.1);
                        continue;
                    }
                    KeyCode::Char('-' | '_') => {
                        let volume = audio.get_volume();
                        audio.set_volume(volume - 0.1);
                        continue;
                    }
                    _ => {}
                }

                if let Some(command) = map_key(key.code, app.run_state()) {
                    app.command(command);
                    high_score = handle_events(&mut app, &audio, high_score);
                }
            }
        }
    }
}

/// Translates a key press into an engine command, given the current run
/// state. The engine itself rejects whatever is not valid in that state.
fn map_key(code: KeyCode, run_state: RunState) -> Option<Command> {
    match code {
        KeyCode::Left | KeyCode::Char('a') => Some(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') => Some(Command::MoveRight),
        KeyCode::Up | KeyCode::Char('w') => Some(Command::RotateCw),
        KeyCode::Down | KeyCode::Char('s') => Some(Command::SoftDrop),
        KeyCode::Char(' ') => Some(Command::HardDrop),
        KeyCode::Char('p') => Some(if run_state == RunState::Paused {
            Command::Resume
        } else {
            Command::Pause
        }),
        KeyCode::Char('r') => Some(Command::Reset),
        KeyCode::Enter => match run_state {
            RunState::Idle => Some(Command::Resume),
            RunState::GameOver => Some(Command::Reset),
            _ => None,
        },
        _ => None,
    }
}

/// Drains the engine's event queue into side effects: sounds, background
/// music, and the high-score collaborator. Returns the updated best score.
fn handle_events(app: &mut App, audio: &AudioState, mut high_score: u32) -> u32 {
    let final_score = app.score();

    for event in app.drain_events() {
        audio.play_event(event);

        match event {
            GameEvent::GameStarted => audio.set_music_playing(true),
            GameEvent::GameOver => {
                audio.set_music_playing(false);
                high_score = highscores::submit_score(final_score);
                info!("Session over with score {final_score} (best {high_score})");
            }
            _ => {}
        }
    }

    high_score
}

// Persist audio toggles so they survive restarts
fn save_audio_config(audio: &AudioState, app_config: &config::Config) {
    let updated = config::Config {
        audio: config::AudioConfig {
            sound: audio.is_sound_enabled(),
            music: audio.is_music_enabled(),
            volume: audio.get_volume(),
        },
        ui: app_config.ui.clone(),
    };

    if let Err(e) = config::save_config_to_file(&updated) {
        error!("Failed to save configuration: {e:?}");
    }
}
