use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::show_state::ShowState;
use crate::audio::PlaybackChannel;
use crate::link::LinkStatus;
use crate::messages::{ShowCommand, ShowSnapshot};
use crate::output::FixtureSink;

/// Drives a [`ShowState`] at a fixed rate, applying operator commands
/// between ticks and pushing every frame to the sinks.
pub struct ShowRunner<C: PlaybackChannel> {
    state: ShowState<C>,
    sinks: Vec<Box<dyn FixtureSink>>,
    tick_hz: u32,
    ticks: u64,
}

impl<C: PlaybackChannel> ShowRunner<C> {
    pub fn new(state: ShowState<C>, tick_hz: u32) -> Self {
        Self {
            state,
            sinks: Vec::new(),
            tick_hz: tick_hz.max(1),
            ticks: 0,
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn FixtureSink>) {
        self.sinks.push(sink);
    }

    pub fn state(&self) -> &ShowState<C> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShowState<C> {
        &mut self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz as f64)
    }

    /// One tick: render and hand the frame to every sink.
    pub fn step(&mut self) {
        let frame = self.state.tick();
        for sink in self.sinks.iter_mut() {
            sink.send(frame);
        }
        self.ticks += 1;
    }

    /// Runs until a `Shutdown` command arrives or every command sender is
    /// dropped. Returns the runner so the caller can inspect the final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ShowCommand>,
        mut link: watch::Receiver<LinkStatus>,
        snapshots: watch::Sender<ShowSnapshot>,
    ) -> Self {
        let mut ticker = interval(self.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.state.set_link_status(*link.borrow_and_update());

        log::info!("Show running at {}Hz", self.tick_hz);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(ShowCommand::Shutdown) | None => {
                            log::info!("Show loop received shutdown");
                            break;
                        }
                        Some(command) => self.state.handle_command(command),
                    }
                }

                _ = ticker.tick() => {
                    if link.has_changed().unwrap_or(false) {
                        let status = *link.borrow_and_update();
                        self.state.set_link_status(status);
                    }

                    self.step();
                    snapshots.send_replace(self.state.snapshot());
                }
            }
        }

        self.state.stop();
        log::info!("Show loop stopped after {} ticks", self.ticks);
        self
    }
}
