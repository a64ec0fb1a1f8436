mod driver;
mod engine;
mod phase;

pub use driver::{Tick, TimerDriver, TICK_PERIOD};
pub use engine::TimerEngine;
pub use phase::{Phase, LONG_BREAK_INTERVAL};
