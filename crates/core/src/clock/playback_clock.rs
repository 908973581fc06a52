//! Virtual playback clock.
//!
//! Tracks the position of a playing track from wall-clock deltas instead of
//! asking the audio backend, whose own position reporting is too coarse for a
//! 20 Hz lighting tick. The clock is an anchor instant plus the track offset
//! that was true at that instant; pausing freezes it and resuming slides the
//! anchor forward by the time spent paused.

use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    /// Wall-clock time at which `anchor_offset` was the track position.
    anchor_wall_time: Option<Instant>,
    /// Track position in seconds at the anchor moment.
    anchor_offset: f64,
    /// Set while paused.
    pause_wall_time: Option<Instant>,
    /// Track length in seconds, 0.0 when unknown.
    length: f64,
}

impl PlaybackClock {
    pub fn new(length: f64) -> Self {
        Self {
            length: length.max(0.0),
            ..Self::default()
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn set_length(&mut self, length: f64) {
        self.length = length.max(0.0);
    }

    /// Anchor the clock to `now` at the given track offset.
    pub fn start(&mut self, now: Instant, offset_seconds: f64) {
        self.anchor_wall_time = Some(now);
        self.anchor_offset = offset_seconds.max(0.0);
        self.pause_wall_time = None;
    }

    pub fn pause(&mut self, now: Instant) {
        if self.anchor_wall_time.is_some() && self.pause_wall_time.is_none() {
            self.pause_wall_time = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(paused_at) = self.pause_wall_time.take() {
            if let Some(anchor) = self.anchor_wall_time.as_mut() {
                *anchor += now.saturating_duration_since(paused_at);
            }
        }
    }

    /// Clear the anchor. The position reads 0 until the next `start`.
    pub fn stop(&mut self) {
        self.anchor_wall_time = None;
        self.anchor_offset = 0.0;
        self.pause_wall_time = None;
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor_wall_time.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.pause_wall_time.is_some()
    }

    /// Elapsed track position in seconds, clamped to `[0, length]`.
    pub fn position(&self, now: Instant) -> f64 {
        let Some(anchor) = self.anchor_wall_time else {
            return 0.0;
        };

        let reference = self.pause_wall_time.unwrap_or(now);
        let elapsed = reference.saturating_duration_since(anchor).as_secs_f64();
        let position = self.anchor_offset + elapsed;

        self.clamp(position)
    }

    fn clamp(&self, position: f64) -> f64 {
        let position = position.max(0.0);
        if self.length > 0.0 {
            position.min(self.length)
        } else {
            position
        }
    }
}
