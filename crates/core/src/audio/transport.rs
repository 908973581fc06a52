//! Two-channel transport with a manual crossfade handoff.
//!
//! The primary channel carries the current cue. The overlay channel is only
//! used for the overlapping handoff: the next cue starts on the overlay at
//! full volume while the primary tails out. While the overlay is running it
//! is the authoritative clock for position and length.

use std::sync::Arc;
use std::time::Instant;

use super::channel::{PlaybackChannel, TrackAsset};
use super::fade::ManualFade;
use crate::clock::{PlaybackClock, WallClock};

struct TransportChannel<C> {
    channel: C,
    clock: PlaybackClock,
    loaded: bool,
}

impl<C: PlaybackChannel> TransportChannel<C> {
    fn new(channel: C) -> Self {
        Self {
            channel,
            clock: PlaybackClock::default(),
            loaded: false,
        }
    }

    /// Load an asset and settle its length: probed length first, then the
    /// sidecar duration, then zero.
    fn load(&mut self, asset: &TrackAsset) {
        self.channel.stop();
        self.clock = PlaybackClock::default();

        match self.channel.load_track(&asset.path) {
            Ok(probed) => {
                let length = probed
                    .filter(|l| *l > 0.0)
                    .or(asset.duration_hint)
                    .unwrap_or(0.0);
                if probed.is_none() {
                    log::debug!(
                        "No native length for {}, using {:.2}s",
                        asset.path.display(),
                        length
                    );
                }
                self.clock.set_length(length);
                self.loaded = true;
            }
            Err(e) => {
                log::warn!("Track unavailable, playback disabled: {}", e);
                self.loaded = false;
            }
        }
    }

    fn halt(&mut self) {
        self.channel.stop();
        self.clock.stop();
    }
}

pub struct CrossfadeTransport<C: PlaybackChannel> {
    wall_clock: Arc<dyn WallClock>,
    primary: TransportChannel<C>,
    overlay: TransportChannel<C>,
    overlay_active: bool,
    ramp_in: Option<ManualFade>,
    tail_fade: Option<ManualFade>,
    primary_volume: f32,
    paused_at: Option<Instant>,
}

impl<C: PlaybackChannel> CrossfadeTransport<C> {
    pub fn new(primary: C, overlay: C, wall_clock: Arc<dyn WallClock>) -> Self {
        Self {
            wall_clock,
            primary: TransportChannel::new(primary),
            overlay: TransportChannel::new(overlay),
            overlay_active: false,
            ramp_in: None,
            tail_fade: None,
            primary_volume: 1.0,
            paused_at: None,
        }
    }

    fn now(&self) -> Instant {
        self.wall_clock.now()
    }

    /// Stop everything and load `asset` as the primary track.
    pub fn load(&mut self, asset: &TrackAsset) {
        self.stop();
        self.primary.load(asset);
    }

    /// Stop everything and leave the primary channel without a track, so
    /// length reads zero and play is a no-op.
    pub fn eject(&mut self) {
        self.stop();
        self.primary.loaded = false;
        self.primary.clock = PlaybackClock::default();
    }

    /// Start the primary track at `start_seconds`, optionally ramping the
    /// volume up from silence over `ramp_in_seconds`.
    pub fn play(&mut self, start_seconds: f64, ramp_in_seconds: f64) {
        if !self.primary.loaded {
            log::debug!("play ignored, no primary track loaded");
            return;
        }
        if self.paused_at.is_some() {
            self.resume();
        }

        let start_seconds = start_seconds.max(0.0);
        if let Err(e) = self.primary.channel.play(start_seconds) {
            log::warn!("Primary playback failed: {}", e);
            self.primary.clock.stop();
            return;
        }

        let now = self.now();
        self.primary.clock.start(now, start_seconds);
        self.tail_fade = None;

        if ramp_in_seconds > 0.0 {
            self.set_primary_volume(0.0);
            self.ramp_in = Some(ManualFade::fade_in(now, ramp_in_seconds));
        } else {
            self.set_primary_volume(1.0);
            self.ramp_in = None;
        }
    }

    /// Start `asset` on the overlay channel at full volume. The overlay takes
    /// over position and length reporting until it ends or is stopped.
    /// A paused transport is resumed first so both channels stay in step.
    pub fn play_overlay(&mut self, asset: &TrackAsset) {
        if self.paused_at.is_some() {
            self.resume();
        }
        self.overlay.halt();
        self.overlay_active = false;
        self.overlay.load(asset);

        if !self.overlay.loaded {
            return;
        }

        self.overlay.channel.set_volume(1.0);
        if let Err(e) = self.overlay.channel.play(0.0) {
            log::warn!("Overlay playback failed: {}", e);
            return;
        }

        let now = self.now();
        self.overlay.clock.start(now, 0.0);
        self.overlay_active = true;
        log::info!(
            "Overlay started: {} ({:.2}s)",
            asset.path.display(),
            self.overlay.clock.length()
        );
    }

    /// Fade the primary channel out over `duration_seconds` and stop it.
    /// Cancels any ramp-in; the overlay is untouched.
    pub fn start_tail_fade(&mut self, duration_seconds: f64) {
        self.ramp_in = None;
        if duration_seconds <= 0.0 {
            self.finish_tail_fade();
            return;
        }
        self.tail_fade = Some(ManualFade::fade_out(self.now(), duration_seconds));
    }

    pub fn quick_fade_out(&mut self, millis: u64) {
        self.start_tail_fade(millis as f64 / 1000.0);
    }

    /// Pause both channels against a single captured instant.
    pub fn pause(&mut self) {
        if self.paused_at.is_some() || (!self.primary.clock.is_anchored() && !self.overlay_active) {
            return;
        }

        let now = self.now();
        self.primary.channel.pause();
        self.primary.clock.pause(now);
        if self.overlay_active {
            self.overlay.channel.pause();
            self.overlay.clock.pause(now);
        }
        self.paused_at = Some(now);
    }

    pub fn resume(&mut self) {
        let Some(paused_at) = self.paused_at.take() else {
            return;
        };

        let now = self.now();
        self.primary.channel.resume();
        self.primary.clock.resume(now);
        if self.overlay_active {
            self.overlay.channel.resume();
            self.overlay.clock.resume(now);
        }

        let paused_for = now.saturating_duration_since(paused_at);
        for fade in [self.ramp_in.as_mut(), self.tail_fade.as_mut()].into_iter().flatten() {
            fade.delay(paused_for);
        }
    }

    pub fn stop(&mut self) {
        self.primary.halt();
        self.overlay.halt();
        self.overlay_active = false;
        self.ramp_in = None;
        self.tail_fade = None;
        self.paused_at = None;
        self.set_primary_volume(1.0);
    }

    /// Advance any active manual fade. Called once per scheduler period.
    pub fn tick(&mut self) {
        if self.paused_at.is_some() {
            return;
        }
        let now = self.now();

        if let Some(fade) = self.tail_fade {
            if fade.is_complete(now) {
                self.finish_tail_fade();
            } else {
                self.set_primary_volume(fade.volume(now));
            }
            return;
        }

        if let Some(fade) = self.ramp_in {
            if fade.is_complete(now) {
                self.set_primary_volume(fade.terminal_volume());
                self.ramp_in = None;
            } else {
                self.set_primary_volume(fade.volume(now));
            }
        }
    }

    fn finish_tail_fade(&mut self) {
        self.tail_fade = None;
        self.set_primary_volume(0.0);
        self.primary.halt();
        log::debug!("Primary tail fade complete");
    }

    fn set_primary_volume(&mut self, volume: f32) {
        self.primary_volume = volume.clamp(0.0, 1.0);
        self.primary.channel.set_volume(self.primary_volume);
    }

    /// Current position in seconds of whichever channel is authoritative.
    ///
    /// When the overlay runs out it is retired and its length is reported as
    /// the final position for this call.
    pub fn position(&mut self) -> f64 {
        if self.overlay_active {
            let length = self.overlay.clock.length();
            if self.overlay.channel.is_playing() || self.overlay.clock.is_paused() {
                let position = self.overlay.clock.position(self.now());
                return if length > 0.0 {
                    position.min(length)
                } else {
                    position
                };
            }

            log::info!("Overlay finished at {:.2}s", length);
            self.overlay_active = false;
            self.overlay.clock.stop();
            return length;
        }

        self.primary.clock.position(self.now())
    }

    /// Length in seconds of whichever channel is authoritative.
    pub fn length(&self) -> f64 {
        if self.overlay_active {
            self.overlay.clock.length()
        } else {
            self.primary.clock.length()
        }
    }

    /// True while the primary clock is running or paused mid-track.
    pub fn is_anchored(&self) -> bool {
        self.primary.clock.is_anchored()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_overlay_active(&self) -> bool {
        self.overlay_active
    }

    pub fn primary_volume(&self) -> f32 {
        self.primary_volume
    }

    pub fn is_ramping_in(&self) -> bool {
        self.ramp_in.is_some()
    }

    pub fn is_tail_fading(&self) -> bool {
        self.tail_fade.is_some()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::audio::{MemoryChannel, MemoryChannelHandle};
    use crate::clock::ManualClock;

    struct Rig {
        transport: CrossfadeTransport<MemoryChannel>,
        clock: ManualClock,
        primary: MemoryChannelHandle,
        overlay: MemoryChannelHandle,
    }

    fn rig() -> Rig {
        let clock = ManualClock::new();
        let primary = MemoryChannel::new();
        let overlay = MemoryChannel::new();
        let (primary_handle, overlay_handle) = (primary.handle(), overlay.handle());
        Rig {
            transport: CrossfadeTransport::new(primary, overlay, Arc::new(clock.clone())),
            clock,
            primary: primary_handle,
            overlay: overlay_handle,
        }
    }

    fn asset(name: &str, length: f64) -> TrackAsset {
        TrackAsset::new(name).with_duration_hint(Some(length))
    }

    #[test]
    fn test_position_tracks_wall_time_at_tick_rate() {
        let mut rig = rig();
        rig.transport.load(&asset("a.mp3", 30.0));
        rig.transport.play(0.0, 0.0);

        for tick in 1..=100 {
            rig.clock.advance_secs(0.05);
            rig.transport.tick();
            assert_relative_eq!(rig.transport.position(), tick as f64 * 0.05, epsilon = 1e-6);
        }

        rig.clock.advance_secs(60.0);
        assert_relative_eq!(rig.transport.position(), 30.0);
    }

    #[test]
    fn test_sidecar_duration_used_when_probe_fails() {
        let mut rig = rig();
        rig.transport.load(&asset("a.mp3", 42.5));
        assert_relative_eq!(rig.transport.length(), 42.5);

        rig.primary.set_probe_length(Some(99.0));
        rig.transport.load(&asset("a.mp3", 42.5));
        assert_relative_eq!(rig.transport.length(), 99.0);

        rig.primary.set_probe_length(Some(0.0));
        rig.transport.load(&TrackAsset::new("a.mp3"));
        assert_eq!(rig.transport.length(), 0.0);
    }

    #[test]
    fn test_missing_asset_makes_play_a_no_op() {
        let mut rig = rig();
        rig.primary.mark_missing("gone.mp3");
        rig.transport.load(&asset("gone.mp3", 10.0));

        assert_eq!(rig.transport.length(), 0.0);
        rig.transport.play(0.0, 0.0);
        assert!(!rig.transport.is_anchored());
        assert!(!rig.primary.is_playing());
        rig.clock.advance_secs(3.0);
        assert_eq!(rig.transport.position(), 0.0);
    }

    #[test]
    fn test_ramp_in_reaches_full_volume() {
        let mut rig = rig();
        rig.transport.load(&asset("a.mp3", 30.0));
        rig.transport.play(0.0, 1.0);
        assert_eq!(rig.primary.volume(), 0.0);

        rig.clock.advance_secs(0.5);
        rig.transport.tick();
        assert_relative_eq!(rig.primary.volume(), 0.5);

        rig.clock.advance_secs(0.6);
        rig.transport.tick();
        assert_eq!(rig.primary.volume(), 1.0);
        assert!(!rig.transport.is_ramping_in());
    }

    #[test]
    fn test_tail_fade_cancels_ramp_and_stops_primary() {
        let mut rig = rig();
        rig.transport.load(&asset("a.mp3", 30.0));
        rig.transport.play(0.0, 4.0);
        rig.clock.advance_secs(1.0);
        rig.transport.tick();

        rig.transport.start_tail_fade(2.0);
        assert!(!rig.transport.is_ramping_in());

        rig.clock.advance_secs(1.0);
        rig.transport.tick();
        assert_relative_eq!(rig.transport.primary_volume(), 0.5);
        assert!(rig.primary.is_playing());

        rig.clock.advance_secs(1.0);
        rig.transport.tick();
        assert_eq!(rig.transport.primary_volume(), 0.0);
        assert!(!rig.primary.is_playing());
        assert!(!rig.transport.is_anchored());
    }

    #[test]
    fn test_overlay_is_authoritative_until_it_finishes() {
        let mut rig = rig();
        rig.transport.load(&asset("19.mp3", 100.0));
        rig.transport.play(0.0, 0.0);
        rig.clock.advance_secs(5.0);

        rig.transport.play_overlay(&asset("20.mp3", 8.0));
        rig.transport.start_tail_fade(2.0);
        assert!(rig.transport.is_overlay_active());
        assert_eq!(rig.transport.position(), 0.0);
        assert_relative_eq!(rig.transport.length(), 8.0);
        assert_eq!(rig.overlay.volume(), 1.0);

        rig.clock.advance_secs(3.0);
        rig.transport.tick();
        assert_relative_eq!(rig.transport.position(), 3.0);
        assert_eq!(rig.overlay.volume(), 1.0);

        rig.overlay.finish();
        assert_relative_eq!(rig.transport.position(), 8.0);
        assert!(!rig.transport.is_overlay_active());
    }

    #[test]
    fn test_pause_resume_moves_both_channels_together() {
        let mut rig = rig();
        rig.transport.load(&asset("19.mp3", 100.0));
        rig.transport.play(0.0, 0.0);
        rig.clock.advance_secs(5.0);
        rig.transport.play_overlay(&asset("20.mp3", 80.0));
        rig.clock.advance_secs(1.5);

        rig.transport.pause();
        assert!(!rig.primary.is_playing());
        assert!(!rig.overlay.is_playing());
        rig.clock.advance_secs(30.0);
        assert_relative_eq!(rig.transport.position(), 1.5);

        rig.transport.resume();
        rig.clock.advance_secs(0.5);
        assert_relative_eq!(rig.transport.position(), 2.0);
        assert!(rig.overlay.is_playing());
    }

    #[test]
    fn test_fades_hold_while_paused() {
        let mut rig = rig();
        rig.transport.load(&asset("a.mp3", 30.0));
        rig.transport.play(0.0, 0.0);
        rig.transport.start_tail_fade(2.0);

        rig.clock.advance_secs(0.5);
        rig.transport.tick();
        rig.transport.pause();
        rig.clock.advance_secs(10.0);
        rig.transport.tick();
        rig.transport.resume();
        rig.clock.advance_secs(0.5);
        rig.transport.tick();

        assert_relative_eq!(rig.transport.primary_volume(), 0.5);
    }

    #[test]
    fn test_stop_clears_everything() {
        let mut rig = rig();
        rig.transport.load(&asset("19.mp3", 100.0));
        rig.transport.play(0.0, 2.0);
        rig.transport.play_overlay(&asset("20.mp3", 80.0));
        rig.clock.advance_secs(1.0);

        rig.transport.stop();
        assert_eq!(rig.transport.position(), 0.0);
        assert!(!rig.transport.is_overlay_active());
        assert!(!rig.transport.is_ramping_in());
        assert!(!rig.primary.is_playing());
        assert!(!rig.overlay.is_playing());
        assert_eq!(rig.transport.primary_volume(), 1.0);
    }

    #[test]
    fn test_play_restarts_primary_at_offset_without_touching_overlay() {
        let mut rig = rig();
        rig.transport.load(&asset("19.mp3", 100.0));
        rig.transport.play(0.0, 0.0);
        rig.transport.play_overlay(&asset("20.mp3", 80.0));
        rig.clock.advance_secs(2.0);

        rig.transport.play(40.0, 0.0);
        assert_eq!(rig.primary.snapshot().last_offset, Some(40.0));
        assert!(rig.transport.is_overlay_active());
        assert_relative_eq!(rig.transport.position(), 2.0);
    }

    #[test]
    fn test_eject_disables_play() {
        let mut rig = rig();
        rig.transport.load(&asset("19.mp3", 100.0));
        rig.transport.play(0.0, 0.0);

        rig.transport.eject();
        rig.transport.play(0.0, 0.0);
        rig.clock.advance_secs(1.0);
        assert_eq!(rig.transport.length(), 0.0);
        assert_eq!(rig.transport.position(), 0.0);
        assert!(!rig.transport.is_anchored());
    }
}
