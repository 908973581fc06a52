pub mod playback_clock;
pub mod wall_clock;

pub use playback_clock::PlaybackClock;
pub use wall_clock::{ManualClock, SystemClock, WallClock};
