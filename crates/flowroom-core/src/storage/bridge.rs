//! Timer snapshot persistence.
//!
//! Writes are best-effort: a failed save is logged and the in-memory engine
//! stays authoritative. Saves while ticking are throttled; explicit
//! transitions always write.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::KeyValueStore;
use crate::clock::Clock;
use crate::collaborators::{SettingsProvider, StatisticsSink};
use crate::error::StorageError;
use crate::flow::FlowMetrics;
use crate::timer::{TimerEngine, TimerState};

pub const TIMER_KEY: &str = "flowroom.timer";

const MAX_THROTTLE_SECS: u64 = 24 * 3600;

/// Field-for-field serialization of the engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub timer: TimerState,
    pub metrics: FlowMetrics,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a cold-start restore.
pub struct Restored {
    pub engine: TimerEngine,
    /// The snapshot had the timer running when it was written.
    pub was_running: bool,
}

pub struct PersistenceBridge {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    throttle: Duration,
    last_saved: Cell<Option<DateTime<Utc>>>,
}

impl PersistenceBridge {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>, throttle_secs: u64) -> Self {
        Self {
            store,
            clock,
            throttle: Duration::seconds(throttle_secs.min(MAX_THROTTLE_SECS) as i64),
            last_saved: Cell::new(None),
        }
    }

    /// Write the engine state now. Returns whether the write succeeded.
    pub fn save(&self, engine: &TimerEngine) -> bool {
        let now = self.clock.now();
        let snapshot = TimerSnapshot {
            timer: engine.timer().clone(),
            metrics: engine.metrics().clone(),
            timestamp: now,
        };
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize timer snapshot");
                return false;
            }
        };
        match self.store.set(TIMER_KEY, &json) {
            Ok(()) => {
                self.last_saved.set(Some(now));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist timer snapshot");
                false
            }
        }
    }

    /// Write only if the last successful write is older than the throttle.
    pub fn save_throttled(&self, engine: &TimerEngine) -> bool {
        if let Some(last) = self.last_saved.get() {
            if self.clock.now() - last < self.throttle {
                return false;
            }
        }
        self.save(engine)
    }

    pub fn load(&self) -> Option<TimerSnapshot> {
        let raw = match self.store.get(TIMER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read timer snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                let err = StorageError::CorruptRecord {
                    key: TIMER_KEY.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(error = %err, "discarding timer snapshot");
                None
            }
        }
    }

    /// Rebuild the engine from storage, or factory defaults if nothing usable
    /// is stored.
    pub fn restore(
        &self,
        settings: Rc<dyn SettingsProvider>,
        stats: Rc<dyn StatisticsSink>,
    ) -> Restored {
        match self.load() {
            Some(snapshot) => {
                let (engine, was_running) = TimerEngine::rehydrate(
                    snapshot.timer,
                    snapshot.metrics,
                    self.clock.clone(),
                    settings,
                    stats,
                );
                Restored {
                    engine,
                    was_running,
                }
            }
            None => Restored {
                engine: TimerEngine::new(self.clock.clone(), settings, stats),
                was_running: false,
            },
        }
    }
}
