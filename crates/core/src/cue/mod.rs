pub mod assets;
pub mod beats;
pub mod cue;

pub use assets::{AssetError, CueAssets};
pub use beats::BeatTable;
pub use cue::CueId;
