use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to open audio output stream: {0}")]
    Device(String),

    #[error("Failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode audio file {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("No audio file loaded")]
    NoTrack,
}

/// One independent playback output. The transport owns two of these.
///
/// Positions are never read back from the channel; the transport keeps its
/// own clock per channel.
pub trait PlaybackChannel {
    /// Load a track without starting it. Returns the probed length in
    /// seconds, `None` when the backend can't tell.
    fn load_track(&mut self, path: &Path) -> Result<Option<f64>, AudioError>;

    /// Start the loaded track from `offset_seconds`.
    fn play(&mut self, offset_seconds: f64) -> Result<(), AudioError>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    /// Volume multiplier in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    /// True while the channel is producing audio.
    fn is_playing(&self) -> bool;
}

/// An audio file plus the duration declared by its sidecar description, used
/// when the backend can't probe the length.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAsset {
    pub path: PathBuf,
    pub duration_hint: Option<f64>,
}

impl TrackAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration_hint: None,
        }
    }

    pub fn with_duration_hint(mut self, duration: Option<f64>) -> Self {
        self.duration_hint = duration.filter(|d| *d > 0.0);
        self
    }
}
