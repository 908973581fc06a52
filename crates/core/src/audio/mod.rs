pub mod channel;
pub mod fade;
pub mod memory_channel;
pub mod probe;
pub mod rodio_channel;
pub mod transport;

pub use channel::{AudioError, PlaybackChannel, TrackAsset};
pub use fade::{FadeDirection, ManualFade};
pub use memory_channel::{MemoryChannel, MemoryChannelHandle};
pub use rodio_channel::{AudioDevice, RodioChannel};
pub use transport::CrossfadeTransport;
