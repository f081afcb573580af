//! Tick scheduling capability.
//!
//! The engine has no timers of its own. Whoever drives it asks a
//! [`Scheduler`] for a ticker and calls the session's `on_tick()` once per
//! interval.

/// Foreground tick cadence.
pub const TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickerHandle(u64);

impl TickerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    fn start(&mut self, interval_ms: u64) -> TickerHandle;

    fn stop(&mut self, handle: TickerHandle);
}

/// Scheduler for tests: records handles, never fires on its own.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    active: Vec<TickerHandle>,
    started: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickers currently alive.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Tickers ever started.
    pub fn started_count(&self) -> usize {
        self.started
    }
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, _interval_ms: u64) -> TickerHandle {
        self.next_id += 1;
        self.started += 1;
        let handle = TickerHandle::new(self.next_id);
        self.active.push(handle);
        handle
    }

    fn stop(&mut self, handle: TickerHandle) {
        self.active.retain(|h| *h != handle);
    }
}
