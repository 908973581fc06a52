use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::beats::BeatTable;
use super::cue::CueId;
use crate::audio::TrackAsset;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct WaveformSidecar {
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BeatFile {
    Flat(Vec<f64>),
    Described {
        #[serde(default)]
        tempo_bpm: Option<f64>,
        #[serde(default)]
        beats_sec: Vec<f64>,
    },
}

/// Where each cue's audio and sidecar files live.
#[derive(Debug, Clone, Default)]
pub struct CueAssets {
    songs: BTreeMap<CueId, PathBuf>,
    assets_dir: Option<PathBuf>,
}

impl CueAssets {
    pub fn new(songs: BTreeMap<CueId, PathBuf>, assets_dir: Option<PathBuf>) -> Self {
        Self { songs, assets_dir }
    }

    pub fn song_path(&self, cue: CueId) -> Option<&Path> {
        self.songs.get(&cue).map(PathBuf::as_path)
    }

    pub fn assets_dir(&self) -> Option<&Path> {
        self.assets_dir.as_deref()
    }

    /// Track for `cue`, with the waveform sidecar duration as a hint when
    /// one is readable.
    pub fn track(&self, cue: CueId) -> Option<TrackAsset> {
        let path = self.song_path(cue)?;
        let hint = self.assets_dir.as_ref().and_then(|dir| {
            let sidecar = dir.join(cue.waveform_file_name());
            if !sidecar.exists() {
                return None;
            }
            match read_sidecar_duration(&sidecar) {
                Ok(duration) => duration,
                Err(e) => {
                    log::warn!("Ignoring waveform sidecar: {}", e);
                    None
                }
            }
        });

        Some(TrackAsset::new(path).with_duration_hint(hint))
    }

    /// Beat table for `cue`. Cues without beats, and unreadable files, give
    /// an empty table.
    pub fn beats(&self, cue: CueId) -> BeatTable {
        let (Some(dir), Some(name)) = (self.assets_dir.as_ref(), cue.beats_file_name()) else {
            return BeatTable::empty();
        };
        let path = dir.join(name);
        if !path.exists() {
            log::debug!("No beat table at {}", path.display());
            return BeatTable::empty();
        }

        match read_beat_table(&path) {
            Ok(table) => {
                log::info!("Loaded {} beats for {}", table.len(), cue);
                table
            }
            Err(e) => {
                log::warn!("Ignoring beat table: {}", e);
                BeatTable::empty()
            }
        }
    }
}

fn read_json(path: &Path) -> Result<String, AssetError> {
    let content = fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

/// Reads `duration` from a waveform sidecar. Zero or negative durations
/// count as absent.
pub fn read_sidecar_duration(path: &Path) -> Result<Option<f64>, AssetError> {
    let content = read_json(path)?;
    let sidecar: WaveformSidecar =
        serde_json::from_str(&content).map_err(|source| AssetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(sidecar.duration).filter(|d| d.is_finite() && *d > 0.0))
}

pub fn read_beat_table(path: &Path) -> Result<BeatTable, AssetError> {
    let content = read_json(path)?;
    let file: BeatFile = serde_json::from_str(&content).map_err(|source| AssetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match file {
        BeatFile::Flat(beats) => BeatTable::new(beats, None),
        BeatFile::Described {
            tempo_bpm,
            beats_sec,
        } => BeatTable::new(beats_sec, tempo_bpm),
    })
}
