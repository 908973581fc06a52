//! The show's single owner of cue, transport and lighting state.
//!
//! Everything runs on the tick's thread: commands and ticks both take
//! `&mut ShowState`, so no part of the state is shared.

use crate::audio::{CrossfadeTransport, PlaybackChannel};
use crate::cue::{BeatTable, CueAssets, CueId};
use crate::link::LinkStatus;
use crate::messages::{ShowCommand, ShowSnapshot};
use crate::program::{ColorProgramEngine, FixtureColorFrame, ProgramState};

/// Tail fade on the unloading cue when the head elf cue takes over.
pub const HANDOFF_TAIL_FADE_SECS: f64 = 2.0;
pub const DEFAULT_FADE_OUT_MS: u64 = 800;

pub struct ShowState<C: PlaybackChannel> {
    transport: CrossfadeTransport<C>,
    assets: CueAssets,
    engine: ColorProgramEngine,
    current_cue: Option<CueId>,
    previous_cue: Option<CueId>,
    program: ProgramState,
    beats: BeatTable,
    displayed_length: f64,
    position: f64,
    frame: FixtureColorFrame,
    link_status: LinkStatus,
}

impl<C: PlaybackChannel> ShowState<C> {
    pub fn new(
        transport: CrossfadeTransport<C>,
        assets: CueAssets,
        engine: ColorProgramEngine,
    ) -> Self {
        let frame = engine.blank();
        Self {
            transport,
            assets,
            engine,
            current_cue: None,
            previous_cue: None,
            program: ProgramState::default(),
            beats: BeatTable::empty(),
            displayed_length: 0.0,
            position: 0.0,
            frame,
            link_status: LinkStatus::Down,
        }
    }

    /// Enter the first cue without starting playback.
    pub fn initialize(&mut self) {
        self.request_load(CueId::INITIAL, false);
    }

    /// Switch to `target`. From a running unloading cue into the head elf
    /// cue the tracks overlap; every other switch is a plain load.
    pub fn request_load(&mut self, target: CueId, auto_play: bool) {
        let previous = self.current_cue;
        self.previous_cue = previous;
        self.current_cue = Some(target);
        self.program.white_fade_anchor = None;

        if previous == Some(CueId::Unloading)
            && target == CueId::HeadElf
            && self.transport.is_anchored()
        {
            self.hand_off(target);
            return;
        }

        self.load_cue(target, auto_play);
    }

    fn hand_off(&mut self, target: CueId) {
        match self.assets.track(target) {
            Some(asset) => self.transport.play_overlay(&asset),
            None => log::warn!("No track configured for {}", target),
        }
        self.transport.start_tail_fade(HANDOFF_TAIL_FADE_SECS);

        self.displayed_length = self.transport.length().max(0.0);
        self.beats = BeatTable::empty();
        self.program.beat_cursor = None;
        self.program.has_beats = false;
        log::info!(
            "Handoff to {} over a {:.1}s tail fade",
            target,
            HANDOFF_TAIL_FADE_SECS
        );
    }

    fn load_cue(&mut self, target: CueId, auto_play: bool) {
        match self.assets.track(target) {
            Some(asset) => self.transport.load(&asset),
            None => {
                log::warn!("No track configured for {}", target);
                self.transport.eject();
            }
        }

        self.displayed_length = self.transport.length();
        self.beats = self.assets.beats(target);
        self.program.beat_cursor = None;
        self.program.has_beats = !self.beats.is_empty();
        if target == CueId::Rockin {
            self.program.hold_white_latched = false;
        }

        if auto_play {
            self.transport.play(0.0, 0.0);
        }
        log::info!(
            "Loaded {} ({:.2}s, {} beats)",
            target,
            self.displayed_length,
            self.beats.len()
        );
    }

    /// Stop everything, blank the fixtures and go back to the first cue.
    pub fn reset(&mut self) {
        self.transport.stop();
        self.frame = self.engine.blank();
        self.program.clear();
        self.previous_cue = None;
        self.current_cue = Some(CueId::INITIAL);
        self.position = 0.0;
        self.load_cue(CueId::INITIAL, false);
        log::info!("Show reset");
    }

    /// Restart the primary track at `ratio` of the current length. The
    /// overlay is left alone.
    pub fn seek(&mut self, ratio: f64) {
        let length = self.transport.length();
        if length <= 0.0 || !ratio.is_finite() {
            log::debug!("Seek ignored, no track length");
            return;
        }

        let offset = ratio.clamp(0.0, 1.0) * length;
        self.transport.play(offset, 0.0);
        self.program.beat_cursor = self.beats.cursor_at(offset);
        log::debug!("Seek to {:.2}s", offset);
    }

    pub fn play(&mut self) {
        if self.transport.is_paused() {
            self.transport.resume();
        } else {
            self.transport.play(0.0, 0.0);
        }
    }

    /// Toggles pause.
    pub fn pause(&mut self) {
        if self.transport.is_paused() {
            self.transport.resume();
        } else {
            self.transport.pause();
        }
    }

    pub fn stop(&mut self) {
        self.transport.stop();
    }

    pub fn fade_out(&mut self, millis: u64) {
        self.transport.quick_fade_out(millis);
    }

    /// One scheduler period: advance fades, sample the position, follow the
    /// beat table and render the current cue.
    pub fn tick(&mut self) -> &FixtureColorFrame {
        self.transport.tick();
        self.position = self.transport.position().max(0.0);

        if !self.beats.is_empty() {
            self.program.beat_cursor = self.beats.cursor_at(self.position);
        }

        if let Some(cue) = self.current_cue {
            self.frame = self.engine.colors_at(cue, self.position, &mut self.program);
        }
        &self.frame
    }

    pub fn handle_command(&mut self, command: ShowCommand) {
        log::debug!("Command: {:?}", command);
        match command {
            ShowCommand::SelectCue(cue) => self.request_load(cue, true),
            ShowCommand::Play => self.play(),
            ShowCommand::Pause => self.pause(),
            ShowCommand::Stop => self.stop(),
            ShowCommand::Seek(ratio) => self.seek(ratio),
            ShowCommand::Reset => self.reset(),
            ShowCommand::FadeOut(millis) => self.fade_out(millis),
            ShowCommand::Shutdown => self.stop(),
        }
    }

    pub fn set_link_status(&mut self, status: LinkStatus) {
        self.link_status = status;
    }

    pub fn snapshot(&self) -> ShowSnapshot {
        ShowSnapshot {
            cue: self.current_cue,
            position_seconds: self.position,
            length_seconds: self.displayed_length,
            paused: self.transport.is_paused(),
            overlay_active: self.transport.is_overlay_active(),
            hold_white: self.program.hold_white_latched,
            link_status: self.link_status,
        }
    }

    pub fn current_cue(&self) -> Option<CueId> {
        self.current_cue
    }

    pub fn previous_cue(&self) -> Option<CueId> {
        self.previous_cue
    }

    pub fn frame(&self) -> &FixtureColorFrame {
        &self.frame
    }

    pub fn program(&self) -> &ProgramState {
        &self.program
    }

    pub fn beats(&self) -> &BeatTable {
        &self.beats
    }

    pub fn transport(&self) -> &CrossfadeTransport<C> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut CrossfadeTransport<C> {
        &mut self.transport
    }

    pub fn displayed_length(&self) -> f64 {
        self.displayed_length
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::audio::{MemoryChannel, MemoryChannelHandle};
    use crate::clock::ManualClock;
    use crate::program::{dissolve, RockinPattern, RockinSource, LOW_WHITE, OFF};

    const N: usize = 38;

    struct Rig {
        show: ShowState<MemoryChannel>,
        clock: ManualClock,
        primary: MemoryChannelHandle,
        overlay: MemoryChannelHandle,
        _assets_dir: TempDir,
    }

    fn song(cue: CueId) -> PathBuf {
        PathBuf::from(format!("/music/{}", cue.default_file_name()))
    }

    fn rig_with(source: RockinSource, beats: Option<&str>) -> Rig {
        let dir = TempDir::new().unwrap();
        if let Some(beats) = beats {
            fs::write(dir.path().join("CUE_21_-_ROCKIN_beats.json"), beats).unwrap();
        }
        for (cue, length) in [
            (CueId::Unloading, 200.0),
            (CueId::HeadElf, 190.0),
            (CueId::Rockin, 160.0),
        ] {
            fs::write(
                dir.path().join(cue.waveform_file_name()),
                format!("{{\"duration\": {}}}", length),
            )
            .unwrap();
        }

        let songs: BTreeMap<_, _> = CueId::all().into_iter().map(|c| (c, song(c))).collect();
        let assets = CueAssets::new(songs, Some(dir.path().to_path_buf()));

        let clock = ManualClock::new();
        let primary = MemoryChannel::new();
        let overlay = MemoryChannel::new();
        let (primary_handle, overlay_handle) = (primary.handle(), overlay.handle());
        let transport = CrossfadeTransport::new(primary, overlay, Arc::new(clock.clone()));
        let engine = ColorProgramEngine::new(N).with_rockin_source(source);

        let mut show = ShowState::new(transport, assets, engine);
        show.initialize();
        Rig {
            show,
            clock,
            primary: primary_handle,
            overlay: overlay_handle,
            _assets_dir: dir,
        }
    }

    fn is_flat(frame: &FixtureColorFrame) -> bool {
        frame.colors().windows(2).all(|pair| pair[0] == pair[1])
    }

    fn rig() -> Rig {
        rig_with(RockinSource::Steps, None)
    }

    #[test]
    fn test_initialize_enters_first_cue_idle() {
        let mut rig = rig();
        assert_eq!(rig.show.current_cue(), Some(CueId::Unloading));
        assert_eq!(rig.show.previous_cue(), None);
        assert_eq!(rig.show.displayed_length(), 200.0);
        assert!(!rig.primary.is_playing());

        rig.clock.advance_secs(3.0);
        rig.show.tick();
        assert_eq!(rig.show.snapshot().position_seconds, 0.0);
    }

    #[test]
    fn test_position_follows_wall_time() {
        let mut rig = rig();
        rig.show.play();
        for _ in 0..40 {
            rig.clock.advance_secs(0.05);
            rig.show.tick();
        }
        assert_relative_eq!(rig.show.snapshot().position_seconds, 2.0, epsilon = 1e-9);
        assert_eq!(
            rig.show.frame().colors(),
            dissolve(N, 2.0 * 0.8).as_slice()
        );
    }

    #[test]
    fn test_unloading_to_head_elf_hands_off() {
        let mut rig = rig();
        rig.show.play();
        rig.clock.advance_secs(5.0);
        rig.show.tick();

        rig.show.request_load(CueId::HeadElf, true);
        assert_eq!(rig.show.current_cue(), Some(CueId::HeadElf));
        assert_eq!(rig.show.previous_cue(), Some(CueId::Unloading));
        assert!(rig.show.transport().is_overlay_active());
        assert!(rig.overlay.is_playing());
        assert_eq!(rig.overlay.volume(), 1.0);
        assert_eq!(rig.show.displayed_length(), 190.0);
        assert_eq!(rig.show.program().beat_cursor, None);

        rig.show.tick();
        assert_eq!(rig.show.snapshot().position_seconds, 0.0);

        rig.clock.advance_secs(1.0);
        rig.show.tick();
        assert_relative_eq!(rig.primary.volume(), 0.5, epsilon = 1e-6);
        assert!(rig.primary.is_playing());
        assert_relative_eq!(rig.show.snapshot().position_seconds, 1.0);

        rig.clock.advance_secs(1.0);
        rig.show.tick();
        assert!(!rig.primary.is_playing());
        assert_eq!(rig.primary.volume(), 0.0);
        assert!(rig.overlay.is_playing());
        assert_relative_eq!(rig.show.snapshot().position_seconds, 2.0);
    }

    #[test]
    fn test_handoff_while_paused_resumes_both_channels() {
        let mut rig = rig();
        rig.show.play();
        rig.clock.advance_secs(5.0);
        rig.show.pause();
        rig.clock.advance_secs(10.0);

        rig.show.request_load(CueId::HeadElf, true);
        let snapshot = rig.show.snapshot();
        assert!(!snapshot.paused);
        assert!(snapshot.overlay_active);
        assert!(rig.overlay.is_playing());
        assert!(rig.primary.is_playing());

        rig.clock.advance_secs(1.0);
        rig.show.tick();
        assert_relative_eq!(rig.primary.volume(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(rig.show.snapshot().position_seconds, 1.0);

        rig.clock.advance_secs(1.0);
        rig.show.tick();
        assert!(!rig.primary.is_playing());
        assert_eq!(rig.primary.volume(), 0.0);
        assert!(rig.overlay.is_playing());
    }

    #[test]
    fn test_head_elf_after_stopped_unloading_loads_plainly() {
        let mut rig = rig();
        rig.show.play();
        rig.clock.advance_secs(5.0);
        rig.show.tick();
        rig.show.stop();

        rig.show.request_load(CueId::HeadElf, true);
        assert!(!rig.show.transport().is_overlay_active());
        assert!(!rig.overlay.is_playing());
        assert_eq!(rig.primary.snapshot().loaded, Some(song(CueId::HeadElf)));
        assert!(rig.primary.is_playing());
        assert_eq!(rig.primary.volume(), 1.0);
        assert_eq!(rig.show.displayed_length(), 190.0);
    }

    #[test]
    fn test_head_elf_colors_follow_overlay_clock() {
        let mut rig = rig();
        rig.show.play();
        rig.clock.advance_secs(60.0);
        rig.show.tick();

        rig.show.request_load(CueId::HeadElf, true);
        rig.clock.advance_secs(10.0);
        rig.show.tick();
        assert_eq!(rig.show.frame().colors(), dissolve(N, 10.0).as_slice());
    }

    #[test]
    fn test_handoff_needs_running_unloading_cue() {
        let mut rig = rig();
        rig.show.request_load(CueId::HeadElf, true);
        assert!(!rig.show.transport().is_overlay_active());
        assert_eq!(
            rig.primary.snapshot().loaded,
            Some(song(CueId::HeadElf))
        );
        assert!(rig.primary.is_playing());
    }

    #[test]
    fn test_other_transitions_use_plain_load() {
        let mut rig = rig();
        rig.show.play();
        rig.clock.advance_secs(5.0);

        rig.show.request_load(CueId::Unloading, true);
        assert!(!rig.show.transport().is_overlay_active());

        rig.clock.advance_secs(5.0);
        rig.show.request_load(CueId::Rockin, true);
        assert!(!rig.show.transport().is_overlay_active());
        assert_eq!(rig.primary.snapshot().loaded, Some(song(CueId::Rockin)));

        rig.clock.advance_secs(5.0);
        rig.show.request_load(CueId::HeadElf, true);
        assert!(!rig.show.transport().is_overlay_active());
        assert_eq!(rig.primary.snapshot().loaded, Some(song(CueId::HeadElf)));

        rig.clock.advance_secs(5.0);
        rig.show.request_load(CueId::Unloading, true);
        assert!(!rig.show.transport().is_overlay_active());
        assert_eq!(rig.show.previous_cue(), Some(CueId::HeadElf));
    }

    #[test]
    fn test_rockin_latch_survives_seek_until_reset() {
        let mut rig = rig();
        rig.show.request_load(CueId::Rockin, true);
        rig.clock.advance_secs(151.0);
        rig.show.tick();
        assert!(rig.show.frame().is_uniform(LOW_WHITE));

        rig.show.seek(0.1);
        rig.clock.advance_secs(0.05);
        rig.show.tick();
        assert_eq!(rig.show.frame().colors()[0], LOW_WHITE);
        assert!(rig.show.snapshot().hold_white);

        rig.show.reset();
        assert!(!rig.show.program().hold_white_latched);
    }

    #[test]
    fn test_reentering_rockin_clears_latch() {
        let mut rig = rig();
        rig.show.request_load(CueId::Rockin, true);
        rig.clock.advance_secs(151.0);
        rig.show.tick();
        assert!(rig.show.program().hold_white_latched);

        rig.show.request_load(CueId::Rockin, true);
        assert!(!rig.show.program().hold_white_latched);
        rig.clock.advance_secs(0.2);
        rig.show.tick();
        assert!(!is_flat(rig.show.frame()));
    }

    #[test]
    fn test_every_load_clears_white_fade_anchor() {
        let mut rig = rig();
        rig.show.request_load(CueId::HeadElf, true);
        rig.clock.advance_secs(188.0);
        rig.show.tick();
        assert_eq!(rig.show.program().white_fade_anchor, Some(188.0));

        rig.show.request_load(CueId::HeadElf, true);
        assert_eq!(rig.show.program().white_fade_anchor, None);
    }

    #[test]
    fn test_reset_reinitializes() {
        let mut rig = rig();
        rig.show.request_load(CueId::Rockin, true);
        rig.clock.advance_secs(30.0);
        rig.show.tick();

        rig.show.reset();
        assert_eq!(rig.show.transport_mut().position(), 0.0);
        assert_eq!(rig.show.current_cue(), Some(CueId::Unloading));
        assert_eq!(rig.show.previous_cue(), None);
        assert!(rig.show.frame().colors().iter().all(|c| *c == OFF));
        assert_eq!(rig.show.program(), &ProgramState::default());
        assert_eq!(rig.primary.snapshot().loaded, Some(song(CueId::Unloading)));
        assert!(!rig.primary.is_playing());
    }

    #[test]
    fn test_reset_during_handoff_stops_both_channels() {
        let mut rig = rig();
        rig.show.play();
        rig.clock.advance_secs(5.0);
        rig.show.request_load(CueId::HeadElf, true);

        rig.show.reset();
        assert!(!rig.primary.is_playing());
        assert!(!rig.overlay.is_playing());
        assert!(!rig.show.transport().is_overlay_active());
    }

    #[test]
    fn test_seek_restarts_primary_and_moves_beat_cursor() {
        let mut rig = rig_with(
            RockinSource::Beats(RockinPattern::Alternate),
            Some("[1.0, 2.0, 3.0, 4.0]"),
        );
        rig.show.request_load(CueId::Rockin, false);
        assert_eq!(rig.show.beats().len(), 4);

        rig.show.seek(2.5 / 160.0);
        assert_eq!(rig.primary.snapshot().last_offset, Some(2.5));
        assert_eq!(rig.show.program().beat_cursor, Some(1));

        rig.show.seek(0.0);
        assert_eq!(rig.show.program().beat_cursor, None);

        rig.show.seek(7.0);
        assert_eq!(rig.primary.snapshot().last_offset, Some(160.0));
    }

    #[test]
    fn test_tick_advances_beat_cursor() {
        let mut rig = rig_with(
            RockinSource::Beats(RockinPattern::Alternate),
            Some("{\"tempo_bpm\": 120, \"beats_sec\": [0.5, 1.0, 1.5]}"),
        );
        rig.show.request_load(CueId::Rockin, true);

        rig.show.tick();
        assert_eq!(rig.show.program().beat_cursor, None);
        assert!(rig.show.frame().colors().iter().all(|c| *c == OFF));

        rig.clock.advance_secs(1.2);
        rig.show.tick();
        assert_eq!(rig.show.program().beat_cursor, Some(1));
        assert!(!is_flat(rig.show.frame()));
    }

    #[test]
    fn test_beat_source_without_table_falls_back_to_steps() {
        let mut rig = rig_with(RockinSource::Beats(RockinPattern::Alternate), None);
        rig.show.request_load(CueId::Rockin, true);
        assert!(rig.show.beats().is_empty());
        assert!(!rig.show.program().has_beats);

        for _ in 0..3 {
            rig.clock.advance_secs(30.0);
            rig.show.tick();
            assert!(!rig.show.frame().is_uniform(OFF));
            assert!(!is_flat(rig.show.frame()));
        }
    }

    #[test]
    fn test_handoff_clears_beats() {
        let mut rig = rig_with(RockinSource::Steps, Some("[1.0]"));
        rig.show.request_load(CueId::Unloading, true);
        rig.clock.advance_secs(1.0);
        rig.show.request_load(CueId::HeadElf, true);
        assert!(rig.show.beats().is_empty());
    }

    #[test]
    fn test_seek_ignored_without_length() {
        let mut rig = rig();
        rig.primary.mark_missing(song(CueId::Rockin));
        rig.show.request_load(CueId::Rockin, true);
        assert_eq!(rig.show.displayed_length(), 0.0);
        assert!(!rig.primary.is_playing());

        rig.show.seek(0.5);
        rig.show.play();
        rig.clock.advance_secs(1.0);
        rig.show.tick();
        assert_eq!(rig.show.snapshot().position_seconds, 0.0);
    }

    #[test]
    fn test_pause_toggles_and_holds_position() {
        let mut rig = rig();
        rig.show.handle_command(ShowCommand::Play);
        rig.clock.advance_secs(4.0);
        rig.show.handle_command(ShowCommand::Pause);
        rig.clock.advance_secs(10.0);
        rig.show.tick();
        assert_relative_eq!(rig.show.snapshot().position_seconds, 4.0);
        assert!(rig.show.snapshot().paused);

        rig.show.handle_command(ShowCommand::Pause);
        rig.clock.advance_secs(1.0);
        rig.show.tick();
        assert_relative_eq!(rig.show.snapshot().position_seconds, 5.0);
    }

    #[test]
    fn test_play_resumes_when_paused() {
        let mut rig = rig();
        rig.show.play();
        rig.clock.advance_secs(3.0);
        rig.show.pause();
        rig.clock.advance_secs(3.0);
        rig.show.play();
        rig.show.tick();
        assert_relative_eq!(rig.show.snapshot().position_seconds, 3.0);
    }

    #[test]
    fn test_fade_out_command() {
        let mut rig = rig();
        rig.show.play();
        rig.show.handle_command(ShowCommand::FadeOut(DEFAULT_FADE_OUT_MS));
        rig.clock.advance_secs(0.4);
        rig.show.tick();
        assert_relative_eq!(rig.primary.volume(), 0.5, epsilon = 1e-6);
        rig.clock.advance_secs(0.4);
        rig.show.tick();
        assert!(!rig.primary.is_playing());
    }

    #[test]
    fn test_snapshot_carries_link_status() {
        let mut rig = rig();
        assert_eq!(rig.show.snapshot().link_status, LinkStatus::Down);
        rig.show.set_link_status(LinkStatus::Up);
        assert_eq!(rig.show.snapshot().link_status, LinkStatus::Up);
    }
}
