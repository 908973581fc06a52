//! Maps (cue, elapsed seconds) to a fixture color frame.
//!
//! Everything here is a function of its inputs plus the small amount of held
//! state in [`ProgramState`], which the caller owns and clears on cue
//! reloads and resets.

use serde::{Deserialize, Serialize};

use super::color::{blend, FixtureColorFrame, LOW_WHITE};
use super::rockin::{stepped_alternation, RockinPattern};
use super::timeline::{dissolve, Pattern, Segment, Timeline};
use crate::cue::CueId;

/// Dissolve speed for the unloading cue relative to track time.
pub const UNLOADING_TIME_SCALE: f64 = 0.8;

/// Where the head elf script hands over to the closing white fade.
pub const HEAD_ELF_WHITE_FADE_AT: f64 = 187.0;
pub const HEAD_ELF_WHITE_FADE_SECS: f64 = 3.0;
const HEAD_ELF_BLEND_SECS: f64 = 2.0;

/// Rockin alternation rate and the point where it latches to white.
pub const ROCKIN_STEPS_PER_SECOND: f64 = 2.0;
pub const ROCKIN_HOLD_WHITE_AT: f64 = 150.5;

/// Held state carried between ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramState {
    /// Track position at which the closing white fade started.
    pub white_fade_anchor: Option<f64>,
    /// Once set the rockin cue stays low white.
    pub hold_white_latched: bool,
    /// Index of the last beat at or before the current position.
    pub beat_cursor: Option<usize>,
    /// Whether the current cue has a usable beat table.
    pub has_beats: bool,
}

impl ProgramState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What drives the rockin cue's alternation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RockinSource {
    /// Fixed step rate from elapsed time.
    #[default]
    Steps,
    /// The cue's beat table, through one of the beat patterns.
    Beats(RockinPattern),
}

pub struct ColorProgramEngine {
    fixture_count: usize,
    rockin_source: RockinSource,
    head_elf: Timeline,
}

impl ColorProgramEngine {
    pub fn new(fixture_count: usize) -> Self {
        Self {
            fixture_count,
            rockin_source: RockinSource::default(),
            head_elf: head_elf_timeline(),
        }
    }

    pub fn with_rockin_source(mut self, source: RockinSource) -> Self {
        self.rockin_source = source;
        self
    }

    pub fn fixture_count(&self) -> usize {
        self.fixture_count
    }

    pub fn rockin_source(&self) -> RockinSource {
        self.rockin_source
    }

    pub fn blank(&self) -> FixtureColorFrame {
        FixtureColorFrame::off(self.fixture_count)
    }

    pub fn colors_at(
        &self,
        cue: CueId,
        elapsed: f64,
        state: &mut ProgramState,
    ) -> FixtureColorFrame {
        let elapsed = elapsed.max(0.0);
        let colors = match cue {
            CueId::Unloading => dissolve(self.fixture_count, elapsed * UNLOADING_TIME_SCALE),
            CueId::HeadElf => return self.head_elf_at(elapsed, state),
            CueId::Rockin => return self.rockin_at(elapsed, state),
        };
        FixtureColorFrame::new(colors)
    }

    fn head_elf_at(&self, elapsed: f64, state: &mut ProgramState) -> FixtureColorFrame {
        let n = self.fixture_count;
        if let Some(colors) = self.head_elf.render(n, elapsed, elapsed) {
            return FixtureColorFrame::new(colors);
        }

        // past the script: fade from the dissolve to white once, then hold
        let anchor = *state.white_fade_anchor.get_or_insert(elapsed);
        let alpha = (elapsed - anchor) / HEAD_ELF_WHITE_FADE_SECS;
        let base = dissolve(n, elapsed);
        FixtureColorFrame::new(blend(&base, &vec![LOW_WHITE; n], alpha))
    }

    fn rockin_at(&self, elapsed: f64, state: &mut ProgramState) -> FixtureColorFrame {
        let n = self.fixture_count;
        if state.hold_white_latched {
            return FixtureColorFrame::uniform(n, LOW_WHITE);
        }
        if elapsed >= ROCKIN_HOLD_WHITE_AT {
            log::info!("Rockin reached {:.1}s, holding white until reset", elapsed);
            state.hold_white_latched = true;
            return FixtureColorFrame::uniform(n, LOW_WHITE);
        }

        let colors = match self.rockin_source {
            RockinSource::Steps => stepped_alternation(n, elapsed, ROCKIN_STEPS_PER_SECOND),
            RockinSource::Beats(_) if !state.has_beats => {
                stepped_alternation(n, elapsed, ROCKIN_STEPS_PER_SECOND)
            }
            RockinSource::Beats(pattern) => match state.beat_cursor {
                Some(beat) => pattern.render(n, beat),
                None => return FixtureColorFrame::off(n),
            },
        };
        FixtureColorFrame::new(colors)
    }
}

fn head_elf_timeline() -> Timeline {
    use Pattern::{Dissolve, GreenRight, RedLeft};

    let back_to_base = |from| Segment::Blend {
        from,
        to: Dissolve,
        seconds: HEAD_ELF_BLEND_SECS,
    };

    Timeline::from_breakpoints(
        0.0,
        &[
            (0.0, Segment::Hold(Dissolve)),
            (38.9, Segment::Hold(RedLeft)),
            (40.2, Segment::Hold(GreenRight)),
            (41.9, Segment::Hold(RedLeft)),
            (43.2, Segment::Hold(GreenRight)),
            (45.0, Segment::Hold(RedLeft)),
            (46.1, Segment::Hold(GreenRight)),
            (48.0, back_to_base(GreenRight)),
            (50.0, Segment::Hold(Dissolve)),
            (67.5, Segment::Hold(GreenRight)),
            (68.6, Segment::Hold(RedLeft)),
            (70.1, Segment::Hold(GreenRight)),
            (71.7, Segment::Hold(RedLeft)),
            (73.1, Segment::Hold(GreenRight)),
            (74.6, Segment::Hold(RedLeft)),
            (76.1, back_to_base(RedLeft)),
            (78.1, Segment::Hold(Dissolve)),
        ],
        HEAD_ELF_WHITE_FADE_AT,
    )
}
