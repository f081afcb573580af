//! Tokio-backed ticker for the foreground driver.
//!
//! `start` only records the cadence; the interval itself is created on the
//! first `next_tick().await`, so one-shot commands can restore a running
//! session without a runtime.

use std::time::Duration;

use flowroom_core::timer::{Scheduler, TickerHandle};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

struct Active {
    handle: TickerHandle,
    period: Duration,
    interval: Option<Interval>,
}

#[derive(Default)]
pub struct IntervalScheduler {
    next_id: u64,
    active: Option<Active>,
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Wait for the next tick. Never resolves while no ticker is active.
    pub async fn next_tick(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return std::future::pending().await;
        };
        let period = active.period;
        let interval = active.interval.get_or_insert_with(|| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}

impl Scheduler for IntervalScheduler {
    fn start(&mut self, interval_ms: u64) -> TickerHandle {
        self.next_id += 1;
        let handle = TickerHandle::new(self.next_id);
        if let Some(old) = self.active.replace(Active {
            handle,
            period: Duration::from_millis(interval_ms.max(1)),
            interval: None,
        }) {
            tracing::warn!(replaced = old.handle.id(), "ticker started twice");
        }
        handle
    }

    fn stop(&mut self, handle: TickerHandle) {
        if self.active.as_ref().is_some_and(|a| a.handle == handle) {
            self.active = None;
        }
    }
}
