pub mod runner;
pub mod show_state;

pub use runner::ShowRunner;
pub use show_state::{ShowState, DEFAULT_FADE_OUT_MS, HANDOFF_TAIL_FADE_SECS};
