//! Background continuity.
//!
//! The foreground ticker only runs while the process is alive and visible.
//! To survive suspension and cold starts, every running phase also leaves a
//! durable record of when it started and how long it should last. On
//! foreground the record is compared with the wall clock and the in-memory
//! countdown is either re-synced or completed.
//!
//! This is the only place the wall clock decides countdown correctness.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::collaborators::{log_failure, Notifier};
use crate::error::StorageError;
use crate::events::Event;
use crate::storage::KeyValueStore;
use crate::timer::TimerEngine;

pub const BACKGROUND_KEY: &str = "flowroom.background";

/// Durable restart point for a running phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundRecord {
    /// When the current run segment began (epoch ms).
    pub start_time_epoch_ms: i64,
    /// Seconds left as of `start_time_epoch_ms`.
    pub duration_seconds: u64,
    pub is_break: bool,
    pub is_running: bool,
    pub session_id: String,
}

impl BackgroundRecord {
    /// Seconds left at `now_ms`; zero when not running.
    pub fn remaining_at(&self, now_ms: i64) -> u64 {
        if !self.is_running {
            return 0;
        }
        let elapsed_secs =
            u64::try_from(now_ms.saturating_sub(self.start_time_epoch_ms).max(0) / 1_000)
                .unwrap_or(u64::MAX);
        self.duration_seconds.saturating_sub(elapsed_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Still counting down; the engine now shows `remaining_secs`.
    Synced { remaining_secs: u64 },
    /// The phase ended while we were away and has been completed.
    Completed { event: Event },
    NoOp,
}

pub struct BackgroundTracker {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
}

impl BackgroundTracker {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn record(&self) -> Option<BackgroundRecord> {
        let raw = match self.store.get(BACKGROUND_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read background record");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                let err = StorageError::CorruptRecord {
                    key: BACKGROUND_KEY.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(error = %err, "discarding background record");
                None
            }
        }
    }

    fn write(&self, record: &BackgroundRecord) {
        let result = serde_json::to_string(record)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(BACKGROUND_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write background record");
        }
    }

    /// Record a restart point for a phase that just started running.
    /// Returns the new session id.
    pub fn start_tracking(&self, duration_secs: u64, is_break: bool) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.write(&BackgroundRecord {
            start_time_epoch_ms: self.clock.now_ms(),
            duration_seconds: duration_secs,
            is_break,
            is_running: true,
            session_id: session_id.clone(),
        });
        tracing::debug!(%session_id, duration_secs, is_break, "background tracking started");
        session_id
    }

    /// Freeze the record, keeping the seconds left at this moment.
    pub fn pause_tracking(&self) -> Option<BackgroundRecord> {
        let mut record = self.record()?;
        if record.is_running {
            record.duration_seconds = record.remaining_at(self.clock.now_ms());
            record.is_running = false;
            self.write(&record);
        }
        Some(record)
    }

    /// Restart the run segment from now with the frozen remaining time.
    pub fn resume_tracking(&self) -> Option<BackgroundRecord> {
        let mut record = self.record()?;
        if !record.is_running {
            record.start_time_epoch_ms = self.clock.now_ms();
            record.is_running = true;
            self.write(&record);
        }
        Some(record)
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.delete(BACKGROUND_KEY) {
            tracing::warn!(error = %e, "failed to clear background record");
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.record()
            .map(|r| r.remaining_at(self.clock.now_ms()))
            .unwrap_or(0)
    }

    /// Bring the engine in line with the wall clock.
    ///
    /// `was_running` covers a process that died while running: the restored
    /// engine is stopped, but a missing record must still count as finished.
    pub fn reconcile(
        &self,
        engine: &mut TimerEngine,
        notifier: &dyn Notifier,
        was_running: bool,
    ) -> ReconcileOutcome {
        let believed_running = was_running || engine.is_running();

        let outcome = match self.record() {
            Some(record) if !record.is_running => ReconcileOutcome::NoOp,
            Some(record) => {
                let remaining = record.remaining_at(self.clock.now_ms());
                if remaining > 0 {
                    engine.sync_countdown(remaining, record.is_break, true);
                    ReconcileOutcome::Synced {
                        remaining_secs: remaining,
                    }
                } else {
                    engine.sync_countdown(0, record.is_break, false);
                    self.finish(engine, notifier, Some(&record.session_id))
                }
            }
            None if believed_running => {
                tracing::info!("no background record for a running timer, treating as completed");
                self.finish(engine, notifier, None)
            }
            None => ReconcileOutcome::NoOp,
        };

        match &outcome {
            ReconcileOutcome::Synced { remaining_secs } => {
                tracing::info!(remaining_secs, "reconciled: still running")
            }
            ReconcileOutcome::Completed { .. } => tracing::info!("reconciled: completed while away"),
            ReconcileOutcome::NoOp => tracing::debug!("reconciled: nothing to do"),
        }
        outcome
    }

    fn finish(
        &self,
        engine: &mut TimerEngine,
        notifier: &dyn Notifier,
        session_id: Option<&str>,
    ) -> ReconcileOutcome {
        self.clear();
        if let Some(id) = session_id {
            log_failure("notifier", notifier.cancel_pending_for_session(id));
        }
        ReconcileOutcome::Completed {
            event: engine.complete(),
        }
    }
}
