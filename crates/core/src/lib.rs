pub use audio::{
    AudioDevice, AudioError, CrossfadeTransport, MemoryChannel, PlaybackChannel, RodioChannel,
    TrackAsset,
};
pub use clock::{ManualClock, PlaybackClock, SystemClock, WallClock};
pub use config::{ConfigError, ConfigManager, ShowSettings};
pub use cue::{AssetError, BeatTable, CueAssets, CueId};
pub use link::{LinkError, LinkMonitor, LinkStatus, OnlineSwitch, SerialDeviceProbe};
pub use messages::{format_mm_ss, ShowCommand, ShowSnapshot};
pub use output::{ArtNetMode, ArtNetSink, FixtureSink, NullSink, OutputError};
pub use program::{
    ColorProgramEngine, FixtureColorFrame, ProgramState, Rgb, RockinPattern, RockinSource,
};
pub use show::{ShowRunner, ShowState};

pub mod audio;
pub mod clock;
mod config;
pub mod cue;
pub mod link;
pub mod messages;
pub mod output;
pub mod program;
pub mod show;
