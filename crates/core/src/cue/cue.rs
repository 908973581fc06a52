use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The cues of the show, in running order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CueId {
    #[serde(rename = "19")]
    Unloading,
    #[serde(rename = "20")]
    HeadElf,
    #[serde(rename = "21")]
    Rockin,
}

impl CueId {
    /// The cue the show starts on and returns to on reset.
    pub const INITIAL: CueId = CueId::Unloading;

    pub fn all() -> [CueId; 3] {
        [CueId::Unloading, CueId::HeadElf, CueId::Rockin]
    }

    /// Cue number as printed in the running order.
    pub fn number(&self) -> u8 {
        match self {
            Self::Unloading => 19,
            Self::HeadElf => 20,
            Self::Rockin => 21,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            19 => Some(Self::Unloading),
            20 => Some(Self::HeadElf),
            21 => Some(Self::Rockin),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Unloading => "UNLOADING",
            Self::HeadElf => "HEAD ELF",
            Self::Rockin => "ROCKIN",
        }
    }

    /// Audio file name looked up in the music directory when none is configured.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Unloading => "CUE 19 - UNLOADING.mp3",
            Self::HeadElf => "CUE 20 - HEAD ELF SCENE.mp3",
            Self::Rockin => "CUE 21 - ROCKIN.mp3",
        }
    }

    /// Waveform description in the assets directory, carries the duration.
    pub fn waveform_file_name(&self) -> &'static str {
        match self {
            Self::Unloading => "CUE_19_-_UNLOADING_waveform.json",
            Self::HeadElf => "CUE_20_-_HEAD_ELF_SCENE_waveform.json",
            Self::Rockin => "CUE_21_-_ROCKIN_waveform.json",
        }
    }

    /// Beat table in the assets directory, only the rockin cue has one.
    pub fn beats_file_name(&self) -> Option<&'static str> {
        match self {
            Self::Rockin => Some("CUE_21_-_ROCKIN_beats.json"),
            _ => None,
        }
    }
}

impl fmt::Display for CueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CUE {} - {}", self.number(), self.title())
    }
}

impl FromStr for CueId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(CueId::from_number)
            .ok_or_else(|| format!("Unknown cue: {}", s))
    }
}
