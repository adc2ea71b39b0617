mod engine;
mod phase;

pub use engine::TimerEngine;
pub use phase::{TimerConfig, TimerPhase, DEFAULT_BREAK_SECS, DEFAULT_WORK_SECS};
