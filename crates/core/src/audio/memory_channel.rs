//! A playback channel that produces no sound.
//!
//! Used when no audio device is available so the show keeps running on its
//! virtual clock, and by tests to observe what the transport asked for.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::channel::{AudioError, PlaybackChannel};

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryChannelState {
    pub loaded: Option<PathBuf>,
    pub playing: bool,
    pub paused: bool,
    pub volume: f32,
    pub last_offset: Option<f64>,
    /// Length reported by `load_track`.
    pub probe_length: Option<f64>,
    /// Paths that fail to load.
    pub missing: Vec<PathBuf>,
}

impl Default for MemoryChannelState {
    fn default() -> Self {
        Self {
            loaded: None,
            playing: false,
            paused: false,
            volume: 1.0,
            last_offset: None,
            probe_length: None,
            missing: Vec::new(),
        }
    }
}

/// Shared view into a [`MemoryChannel`].
#[derive(Debug, Clone, Default)]
pub struct MemoryChannelHandle {
    state: Arc<Mutex<MemoryChannelState>>,
}

impl MemoryChannelHandle {
    pub fn snapshot(&self) -> MemoryChannelState {
        self.state.lock().clone()
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn is_playing(&self) -> bool {
        let state = self.state.lock();
        state.playing && !state.paused
    }

    pub fn set_probe_length(&self, length: Option<f64>) {
        self.state.lock().probe_length = length;
    }

    pub fn mark_missing(&self, path: impl Into<PathBuf>) {
        self.state.lock().missing.push(path.into());
    }

    /// Simulate the track running out.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.paused = false;
    }
}

#[derive(Debug, Default)]
pub struct MemoryChannel {
    handle: MemoryChannelHandle,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MemoryChannelHandle {
        self.handle.clone()
    }
}

impl PlaybackChannel for MemoryChannel {
    fn load_track(&mut self, path: &Path) -> Result<Option<f64>, AudioError> {
        let mut state = self.handle.state.lock();
        state.playing = false;
        state.paused = false;

        if state.missing.iter().any(|p| p == path) {
            state.loaded = None;
            return Err(AudioError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        state.loaded = Some(path.to_path_buf());
        Ok(state.probe_length)
    }

    fn play(&mut self, offset_seconds: f64) -> Result<(), AudioError> {
        let mut state = self.handle.state.lock();
        if state.loaded.is_none() {
            return Err(AudioError::NoTrack);
        }
        state.playing = true;
        state.paused = false;
        state.last_offset = Some(offset_seconds);
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.handle.state.lock();
        if state.playing {
            state.paused = true;
        }
    }

    fn resume(&mut self) {
        self.handle.state.lock().paused = false;
    }

    fn stop(&mut self) {
        let mut state = self.handle.state.lock();
        state.playing = false;
        state.paused = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.handle.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }
}
