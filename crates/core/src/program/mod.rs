pub mod color;
pub mod engine;
pub mod rockin;
pub mod timeline;

pub use color::{blend, FixtureColorFrame, Rgb, GREEN, LOW_WHITE, OFF, RED};
pub use engine::{ColorProgramEngine, ProgramState, RockinSource};
pub use rockin::RockinPattern;
pub use timeline::{dissolve, split, Pattern, Segment, Timeline};
