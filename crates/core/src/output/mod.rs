pub mod artnet;
pub mod sink;

pub use artnet::{frame_to_dmx, ArtNetMode, ArtNetSink, OutputError};
pub use sink::{FixtureSink, NullSink};
