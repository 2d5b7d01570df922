//! Outside collaborators: audio output and the gamemaster.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Audio playback failures. Reactions log these; they never fail a trigger.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio backend is attached")]
    NoBackend,

    #[error("Sound file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Something that can play sound files.
pub trait AudioOutput {
    fn play(&mut self, path: &Path) -> Result<(), AudioError>;

    fn stop(&mut self);
}

/// Audio output used until a real backend is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn play(&mut self, path: &Path) -> Result<(), AudioError> {
        debug!(path = %path.display(), "No audio backend, dropping sound");
        Err(AudioError::NoBackend)
    }

    fn stop(&mut self) {}
}

/// The person (or program) running the session.
pub trait Gamemaster {
    /// Bring something to the gamemaster's attention.
    fn flag_event(&mut self, message: &str);
}
