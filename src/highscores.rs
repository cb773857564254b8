#![warn(clippy::all, clippy::pedantic)]

//! Best-score persistence, consulted when a session ends.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

const FILENAME: &str = "highscore";

// Environment variable override first, then the user config directory.
fn score_path() -> PathBuf {
    if let Ok(path) = std::env::var("GRIDFALL_HIGHSCORE") {
        return PathBuf::from(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("gridfall").join(FILENAME)
    } else {
        PathBuf::from(FILENAME)
    }
}

/// Loads the saved best score. A missing or unparseable file reads as zero.
#[must_use]
pub fn load_high_score() -> u32 {
    let Ok(content) = fs::read_to_string(score_path()) else {
        return 0;
    };
    content.trim().parse().unwrap_or(0)
}

/// Saves the best score, creating the directory if needed.
pub fn save_high_score(score: u32) -> Result<()> {
    let path = score_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{score}\n"))?;
    Ok(())
}

/// Offers a final score for persistence. Returns the new best score, saving
/// only when the previous one is beaten.
pub fn submit_score(score: u32) -> u32 {
    let best = load_high_score();
    if score > best {
        if let Err(err) = save_high_score(score) {
            log::error!("Failed to save high score: {err:?}");
        }
        score
    } else {
        best
    }
}
