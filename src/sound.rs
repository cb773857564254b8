use anyhow::Result;
use bevy_ecs::system::Resource;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender, bounded};
use fundsp::hacker32::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::events::GameEvent;

/// Sound effects the engine's event stream maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Move,
    Rotate,
    HardDrop,
    LineClear,
    Quad,
    LevelUp,
    GameOver,
    GameStart,
}

impl SoundEffect {
    /// Effect for a game event, if it has one.
    #[must_use]
    pub fn for_event(event: GameEvent) -> Option<Self> {
        match event {
            GameEvent::GameStarted => Some(SoundEffect::GameStart),
            GameEvent::Moved => Some(SoundEffect::Move),
            GameEvent::Rotated => Some(SoundEffect::Rotate),
            // Clearing all four rows at once gets the fanfare.
            GameEvent::LinesCleared(4) => Some(SoundEffect::Quad),
            GameEvent::LinesCleared(_) => Some(SoundEffect::LineClear),
            GameEvent::LeveledUp(_) => Some(SoundEffect::LevelUp),
            GameEvent::HardDropped(0) => None,
            GameEvent::HardDropped(_) => Some(SoundEffect::HardDrop),
            GameEvent::GameOver => Some(SoundEffect::GameOver),
        }
    }
}

// Command to control the audio thread
enum AudioCommand {
    PlaySound(SoundEffect),
    PlayMusic(bool), // true to start, false to stop
    SetVolume(f32),  // 0.0 to 1.0
}

/// Handle to the audio thread. All playback is fire-and-forget; a missing or
/// failing output device degrades to silence.
#[derive(Resource)]
pub struct AudioState {
    sender: Option<Sender<AudioCommand>>,
    available: Arc<AtomicBool>,
    music_enabled: bool,
    sound_enabled: bool,
    volume: f32,
}

impl AudioState {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = bounded(64);
        let available = Arc::new(AtomicBool::new(true));

        let thread_available = Arc::clone(&available);
        thread::spawn(move || {
            if let Err(e) = run_audio_thread(receiver) {
                thread_available.store(false, Ordering::Relaxed);
                log::error!("Audio thread error: {e}");
            }
        });

        Self {
            sender: Some(sender),
            available,
            music_enabled: true,
            sound_enabled: true,
            volume: 0.5,
        }
    }

    /// Applies the persisted audio configuration.
    #[must_use]
    pub fn with_config(config: &crate::config::AudioConfig) -> Self {
        let mut state = Self::new();
        state.sound_enabled = config.sound;
        state.set_volume(config.volume);
        if !config.music {
            state.toggle_music();
        }
        state
    }

    pub fn play_sound(&self, effect: SoundEffect) -> bool {
        if self.sound_enabled {
            if let Some(sender) = &self.sender {
                let _ = sender.try_send(AudioCommand::PlaySound(effect));
            }
            true
        } else {
            false
        }
    }

    /// Plays the effect mapped to a game event, if any.
    pub fn play_event(&self, event: GameEvent) {
        if let Some(effect) = SoundEffect::for_event(event) {
            self.play_sound(effect);
        }
    }

    #[must_use]
    pub fn is_audio_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_music_enabled(&self) -> bool {
        self.music_enabled
    }

    #[must_use]
    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn toggle_sound(&mut self) {
        self.sound_enabled = !self.sound_enabled;
    }

    pub fn toggle_music(&mut self) {
        self.music_enabled = !self.music_enabled;

        if let Some(sender) = &self.sender {
            let _ = sender.try_send(AudioCommand::PlayMusic(self.music_enabled));
        }
    }

    /// Starts or stops the background melody without touching the enabled
    /// toggle; used when a session starts or ends.
    pub fn set_music_playing(&self, playing: bool) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(AudioCommand::PlayMusic(playing && self.music_enabled));
        }
    }

    #[must_use]
    pub fn get_volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);

        if let Some(sender) = &self.sender {
            let _ = sender.try_send(AudioCommand::SetVolume(self.volume));
        }
    }
}

impl Default for AudioState {
    fn default() -> Self {
        Self::new()
    }
}

/// The looping background melody, as (frequency Hz, duration seconds) notes.
/// Frequency 0 is a rest.
pub const MELODY: [(f32, f32); 20] = [
    (659.25, 0.4), // E5
    (493.88, 0.2), // B4
    (523.25, 0.2), // C5
    (587.33, 0.4), // D5
    (523.25, 0.2), // C5
    (493.88, 0.2), // B4
    (440.00, 0.4), // A4
    (440.00, 0.2), // A4
    (523.25, 0.2), // C5
    (659.25, 0.4), // E5
    (587.33, 0.2), // D5
    (523.25, 0.2), // C5
    (493.88, 0.6), // B4
    (523.25, 0.2), // C5
    (587.33, 0.4), // D5
    (659.25, 0.4), // E5
    (523.25, 0.4), // C5
    (440.00, 0.4), // A4
    (440.00, 0.4), // A4
    (0.0, 0.4),    // rest
];

fn run_audio_thread(receiver: Receiver<AudioCommand>) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No audio output device found"))?;
    let config = device.default_output_config()?;

    // Channels into the audio callback: one for effects, one for music/volume
    // state changes.
    let (sound_sender, sound_receiver) = bounded::<SoundEffect>(64);
    let (cmd_sender, cmd_receiver) = bounded::<(bool, f32)>(16);

    let mut volume = 0.5f32;
    let mut music_playing = false;

    let _stream = match config.sample_format() {
        cpal::SampleFormat::F32 => run_audio_stream::<f32>(
            &device,
            &config.into(),
            sound_receiver,
            cmd_receiver,
            volume,
            music_playing,
        )?,
        cpal::SampleFormat::I16 => run_audio_stream::<i16>(
            &device,
            &config.into(),
            sound_receiver,
            cmd_receiver,
            volume,
            music_playing,
        )?,
        cpal::SampleFormat::U16 => run_audio_stream::<u16>(
            &device,
            &config.into(),
            sound_receiver,
            cmd_receiver,
            volume,
            music_playing,
        )?,
        _ => return Err(anyhow::anyhow!("Unsupported audio format")),
    };

    // Keep the thread alive and forward commands into the callback
    loop {
        match receiver.recv() {
            Ok(command) => match command {
                AudioCommand::PlaySound(effect) => {
                    let _ = sound_sender.try_send(effect);
                }
                AudioCommand::PlayMusic(playing) => {
                    music_playing = playing;
                    let _ = cmd_sender.try_send((music_playing, volume));
                }
                AudioCommand::SetVolume(new_volume) => {
                    volume = new_volume;
                    let _ = cmd_sender.try_send((music_playing, volume));
                }
            },
            Err(_) => break, // Channel closed
        }
    }

    Ok(())
}

fn run_audio_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sound_receiver: Receiver<SoundEffect>,
    cmd_receiver: Receiver<(bool, f32)>,
    initial_volume: f32,
    initial_music_playing: bool,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let sample_rate = f64::from(config.sample_rate.0);
    let channels = config.channels as usize;

    let mut music_playing = initial_music_playing;
    let mut volume = initial_volume;

    // Active effect units with their remaining lifetime in samples
    let mut active_sounds: Vec<(Box<dyn AudioUnit>, u64)> = Vec::new();

    // Background melody sequencing state
    let mut note_index = 0usize;
    let mut note_unit: Option<Box<dyn AudioUnit>> = None;
    let mut note_remaining = 0u64;

    let mut next_value = move || {
        while let Ok((new_music_playing, new_volume)) = cmd_receiver.try_recv() {
            if new_music_playing && !music_playing {
                // Restart the melody from the top
                note_index = 0;
                note_unit = None;
                note_remaining = 0;
            }
            music_playing = new_music_playing;
            volume = new_volume;
        }

        while let Ok(effect) = sound_receiver.try_recv() {
            let (mut unit, duration) = create_sound_effect(effect);
            unit.set_sample_rate(sample_rate);
            active_sounds.push((unit, (f64::from(duration) * sample_rate) as u64));
        }

        let mut left = 0.0f32;
        let mut right = 0.0f32;

        active_sounds.retain_mut(|(unit, remaining)| {
            if *remaining == 0 {
                return false;
            }
            *remaining -= 1;
            let (l, r) = unit.get_stereo();
            left += l;
            right += r;
            true
        });

        if music_playing {
            if note_remaining == 0 {
                let (freq, duration) = MELODY[note_index];
                note_index = (note_index + 1) % MELODY.len();
                note_remaining = (f64::from(duration) * sample_rate) as u64;
                note_unit = if freq > 0.0 {
                    let mut unit = create_melody_note(freq, duration);
                    unit.set_sample_rate(sample_rate);
                    Some(unit)
                } else {
                    None
                };
            }
            note_remaining -= 1;
            if let Some(unit) = &mut note_unit {
                let (l, r) = unit.get_stereo();
                left += l;
                right += r;
            }
        }

        left = (left * volume).clamp(-1.0, 1.0);
        right = (right * volume).clamp(-1.0, 1.0);

        (left, right)
    };

    let err_fn = |err| log::error!("Error in audio stream: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let sample = next_value();
                let left = T::from_sample(sample.0);
                let right = T::from_sample(sample.1);

                for (channel, sample) in frame.iter_mut().enumerate() {
                    if channel & 1 == 0 {
                        *sample = left;
                    } else {
                        *sample = right;
                    }
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

// One square-wave melody note with a soft attack and release
fn create_melody_note(freq: f32, duration: f32) -> Box<dyn AudioUnit> {
    let unit = square_hz(freq)
        * envelope(move |t| {
            if t < 0.01 {
                t / 0.01
            } else if t > duration - 0.05 {
                ((duration - t) / 0.05).max(0.0)
            } else {
                1.0
            }
        })
        * 0.06;
    Box::new(unit >> pan(0.0))
}

/// Builds the unit for a sound effect, returning it with its duration in
/// seconds.
fn create_sound_effect(effect: SoundEffect) -> (Box<dyn AudioUnit>, f32) {
    match effect {
        SoundEffect::Move => create_move_click(),
        SoundEffect::Rotate => create_rotate_click(),
        SoundEffect::HardDrop => create_hard_drop(),
        SoundEffect::LineClear => create_line_clear(),
        SoundEffect::Quad => create_quad(),
        SoundEffect::LevelUp => create_level_up(),
        SoundEffect::GameOver => create_game_over(),
        SoundEffect::GameStart => create_game_start(),
    }
}

// Short click for horizontal movement and soft drops
fn create_move_click() -> (Box<dyn AudioUnit>, f32) {
    let unit = sine_hz(200.0) * envelope(|t| exp(-30.0 * t)) * 0.3;
    (Box::new(unit >> pan(0.0)), 0.1)
}

// Slightly higher click for rotation
fn create_rotate_click() -> (Box<dyn AudioUnit>, f32) {
    let unit = sine_hz(300.0) * envelope(|t| exp(-20.0 * t)) * 0.3;
    (Box::new(unit >> pan(0.0)), 0.15)
}

// Low thud when a hard drop lands
fn create_hard_drop() -> (Box<dyn AudioUnit>, f32) {
    let noise_comp = noise() * envelope(|t| exp(-20.0 * t)) * 0.1;
    let tone_comp = sine_hz(150.0) * envelope(|t| exp(-15.0 * t)) * 0.3;
    (Box::new((noise_comp + tone_comp) >> pan(0.2)), 0.2)
}

// Ascending four-note run for a line clear
fn create_line_clear() -> (Box<dyn AudioUnit>, f32) {
    let note = |freq, t_start, t_end| {
        let env = envelope(move |t| if t >= t_start && t < t_end { 1.0 } else { 0.0 });
        sine_hz(freq) * env
    };

    let unit = (note(500.0, 0.0, 0.1)
        + note(600.0, 0.1, 0.2)
        + note(700.0, 0.2, 0.3)
        + note(800.0, 0.3, 0.5))
        * 0.3;
    (Box::new(unit >> pan(-0.2)), 0.5)
}

// Longer fanfare for clearing four rows at once
fn create_quad() -> (Box<dyn AudioUnit>, f32) {
    let note = |freq, t_start, t_end| {
        let env = envelope(move |t| if t >= t_start && t < t_end { 1.0 } else { 0.0 });
        sine_hz(freq) * env
    };

    let unit = (note(400.0, 0.0, 0.1)
        + note(500.0, 0.1, 0.2)
        + note(600.0, 0.2, 0.3)
        + note(700.0, 0.3, 0.4)
        + note(800.0, 0.4, 0.7))
        * 0.3;
    (Box::new(unit >> pan(0.0)), 0.7)
}

// Rising arpeggio when a new level is reached
fn create_level_up() -> (Box<dyn AudioUnit>, f32) {
    let note = |freq, t_start, t_end| {
        let env = envelope(move |t| if t >= t_start && t < t_end { 1.0 } else { 0.0 });
        sine_hz(freq) * env
    };

    let unit = (note(400.0, 0.0, 0.1)
        + note(500.0, 0.1, 0.2)
        + note(600.0, 0.2, 0.3)
        + note(800.0, 0.3, 0.6))
        * 0.3;
    (Box::new(unit >> pan(0.0)), 0.6)
}

// Three descending tones when the session ends
fn create_game_over() -> (Box<dyn AudioUnit>, f32) {
    let note = |freq, t_start, t_end| {
        let env = envelope(move |t| if t >= t_start && t < t_end { 1.0 } else { 0.0 });
        sine_hz(freq) * env
    };

    let unit = (note(200.0, 0.0, 0.3) + note(150.0, 0.3, 0.6) + note(100.0, 0.6, 1.1)) * 0.3;
    (Box::new(unit >> pan(0.0)), 1.1)
}

// Three ascending tones when a session starts
fn create_game_start() -> (Box<dyn AudioUnit>, f32) {
    let note = |freq, t_start, t_end| {
        let env = envelope(move |t| if t >= t_start && t < t_end { 1.0 } else { 0.0 });
        sine_hz(freq) * env
    };

    let unit = (note(300.0, 0.0, 0.15) + note(400.0, 0.15, 0.3) + note(500.0, 0.3, 0.5)) * 0.3;
    (Box::new(unit >> pan(0.0)), 0.5)
}
