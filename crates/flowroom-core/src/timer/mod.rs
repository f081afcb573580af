mod engine;
mod scheduler;
mod state;

pub use engine::TimerEngine;
pub use scheduler::{ManualScheduler, Scheduler, TickerHandle, TICK_INTERVAL_MS};
pub use state::{Phase, TimerState};
