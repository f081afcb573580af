//! In-memory collaborators for tests and headless use.

use std::cell::{Cell, RefCell};

use crate::collaborators::{CollabResult, NotificationPayload, Notifier, StatisticsSink};
use crate::events::Event;

/// Statistics sink that remembers every call.
#[derive(Debug, Default)]
pub struct RecordingStatistics {
    flow_started: Cell<u32>,
    break_started: Cell<u32>,
    flow_completed: RefCell<Vec<u64>>,
    break_completed: RefCell<Vec<u64>>,
    fail: bool,
}

impl RecordingStatistics {
    /// A sink whose every call errors (after recording).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn flow_started(&self) -> u32 {
        self.flow_started.get()
    }

    pub fn break_started(&self) -> u32 {
        self.break_started.get()
    }

    pub fn flow_completed_minutes(&self) -> Vec<u64> {
        self.flow_completed.borrow().clone()
    }

    pub fn break_completed_minutes(&self) -> Vec<u64> {
        self.break_completed.borrow().clone()
    }

    fn outcome(&self) -> CollabResult {
        if self.fail {
            Err("statistics store unavailable".into())
        } else {
            Ok(())
        }
    }
}

impl StatisticsSink for RecordingStatistics {
    fn increment_flow_started(&self) -> CollabResult {
        self.flow_started.set(self.flow_started.get() + 1);
        self.outcome()
    }

    fn increment_flow_completed(&self, minutes: u64) -> CollabResult {
        self.flow_completed.borrow_mut().push(minutes);
        self.outcome()
    }

    fn increment_break_started(&self) -> CollabResult {
        self.break_started.set(self.break_started.get() + 1);
        self.outcome()
    }

    fn increment_break_completed(&self, minutes: u64) -> CollabResult {
        self.break_completed.borrow_mut().push(minutes);
        self.outcome()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledNotification {
    pub eta_secs: u64,
    pub is_break: bool,
    pub payload: NotificationPayload,
}

/// Notifier that keeps pending schedules and delivered events in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pending: RefCell<Vec<ScheduledNotification>>,
    delivered: RefCell<Vec<Event>>,
    cancelled: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn pending(&self) -> Vec<ScheduledNotification> {
        self.pending.borrow().clone()
    }

    pub fn delivered(&self) -> Vec<Event> {
        self.delivered.borrow().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn schedule_completion(
        &self,
        eta_secs: u64,
        is_break: bool,
        payload: &NotificationPayload,
    ) -> CollabResult {
        self.pending.borrow_mut().push(ScheduledNotification {
            eta_secs,
            is_break,
            payload: payload.clone(),
        });
        Ok(())
    }

    fn cancel_pending_for_session(&self, session_id: &str) -> CollabResult {
        self.pending
            .borrow_mut()
            .retain(|n| n.payload.session_id != session_id);
        self.cancelled.borrow_mut().push(session_id.to_string());
        Ok(())
    }

    fn deliver(&self, event: &Event) -> CollabResult {
        self.delivered.borrow_mut().push(event.clone());
        Ok(())
    }
}
