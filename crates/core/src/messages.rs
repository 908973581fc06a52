use serde::{Deserialize, Serialize};

use crate::cue::CueId;
use crate::link::LinkStatus;

/// Commands sent from an operator surface to the show.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowCommand {
    SelectCue(CueId),
    Play,
    /// Toggles between paused and running.
    Pause,
    Stop,
    /// Jump to a fraction (0..1) of the current track.
    Seek(f64),
    Reset,
    /// Fade the primary track out over the given milliseconds.
    FadeOut(u64),
    Shutdown,
}

/// Read-only view of the show for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowSnapshot {
    pub cue: Option<CueId>,
    pub position_seconds: f64,
    pub length_seconds: f64,
    pub paused: bool,
    pub overlay_active: bool,
    pub hold_white: bool,
    pub link_status: LinkStatus,
}

impl ShowSnapshot {
    /// Position as a fraction of the track, 0 when the length is unknown.
    pub fn progress(&self) -> f64 {
        if self.length_seconds > 0.0 {
            (self.position_seconds / self.length_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn position_label(&self) -> String {
        format_mm_ss(self.position_seconds)
    }

    pub fn length_label(&self) -> String {
        format_mm_ss(self.length_seconds)
    }
}

/// Formats seconds as `MM:SS`, truncating fractions.
pub fn format_mm_ss(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0) as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
