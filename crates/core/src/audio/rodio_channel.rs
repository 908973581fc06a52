use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::channel::{AudioError, PlaybackChannel};
use super::probe::probe_duration;

/// Owns the audio output stream. Must outlive every channel created from it.
pub struct AudioDevice {
    stream: OutputStream,
}

impl AudioDevice {
    pub fn open_default() -> Result<Self, AudioError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        Ok(Self { stream })
    }

    pub fn channel(&self) -> RodioChannel {
        RodioChannel::new(self.stream.mixer().clone())
    }
}

/// A [`PlaybackChannel`] playing through a rodio sink on the shared mixer.
///
/// A stopped sink can't be restarted, so every `play` builds a fresh sink
/// from the loaded path and seeks it to the requested offset.
pub struct RodioChannel {
    mixer: Mixer,
    sink: Option<Sink>,
    current_file: Option<PathBuf>,
    volume: f32,
}

impl RodioChannel {
    pub fn new(mixer: Mixer) -> Self {
        Self {
            mixer,
            sink: None,
            current_file: None,
            volume: 1.0,
        }
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    fn open_source(path: &Path) -> Result<Decoder<BufReader<File>>, AudioError> {
        let file = File::open(path).map_err(|source| AudioError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl PlaybackChannel for RodioChannel {
    fn load_track(&mut self, path: &Path) -> Result<Option<f64>, AudioError> {
        self.stop();
        self.current_file = None;

        let source = Self::open_source(path)?;
        let length = match source.total_duration() {
            Some(duration) if !duration.is_zero() => Some(duration.as_secs_f64()),
            _ => probe_duration(path).unwrap_or_else(|e| {
                log::warn!("Could not probe length of {}: {}", path.display(), e);
                None
            }),
        };

        self.current_file = Some(path.to_path_buf());
        log::info!("Loaded {} ({:?}s)", path.display(), length);
        Ok(length)
    }

    fn play(&mut self, offset_seconds: f64) -> Result<(), AudioError> {
        let path = self.current_file.clone().ok_or(AudioError::NoTrack)?;
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }

        let source = Self::open_source(&path)?;
        let sink = Sink::connect_new(&self.mixer);
        sink.pause();
        sink.append(source);
        sink.set_volume(self.volume);

        if offset_seconds > 0.0 {
            if let Err(e) = sink.try_seek(Duration::from_secs_f64(offset_seconds)) {
                log::warn!(
                    "Seek to {:.2}s failed for {}: {}",
                    offset_seconds,
                    path.display(),
                    e
                );
            }
        }

        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn is_playing(&self) -> bool {
        if let Some(sink) = &self.sink {
            !sink.is_paused() && !sink.empty()
        } else {
            false
        }
    }
}
