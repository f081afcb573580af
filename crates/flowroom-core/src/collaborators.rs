//! Narrow contracts the engine consumes from the rest of the app.
//!
//! Every collaborator call is fire-and-forget from the engine's point of
//! view: an `Err` is logged and the countdown carries on.

use serde::{Deserialize, Serialize};

use crate::events::Event;

pub type CollabResult = Result<(), Box<dyn std::error::Error>>;

/// Read-only settings, snapshotted once per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// Base focus length, minutes.
    pub time_duration: u32,
    /// Break length, minutes.
    pub break_duration: u32,
    /// Focus sessions per cycle.
    pub total_sessions: u32,
    pub notifications: bool,
    pub sound_effects: bool,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            time_duration: 25,
            break_duration: 5,
            total_sessions: 4,
            notifications: true,
            sound_effects: true,
        }
    }
}

pub trait SettingsProvider {
    fn settings(&self) -> SettingsSnapshot;
}

/// Receives engine events for the statistics store.
pub trait StatisticsSink {
    fn increment_flow_started(&self) -> CollabResult;

    fn increment_flow_completed(&self, minutes: u64) -> CollabResult;

    fn increment_break_started(&self) -> CollabResult;

    fn increment_break_completed(&self, minutes: u64) -> CollabResult;
}

/// What a scheduled "phase complete" notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub session_id: String,
    pub current_session: u32,
    pub total_sessions: u32,
}

/// Local notification delivery. The engine hands over semantic events only;
/// wording belongs to the implementor.
pub trait Notifier {
    fn schedule_completion(
        &self,
        eta_secs: u64,
        is_break: bool,
        payload: &NotificationPayload,
    ) -> CollabResult;

    fn cancel_pending_for_session(&self, session_id: &str) -> CollabResult;

    /// Deliver a notification-worthy event right away.
    fn deliver(&self, event: &Event) -> CollabResult;
}

/// Settings that never change.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSettings(pub SettingsSnapshot);

impl SettingsProvider for StaticSettings {
    fn settings(&self) -> SettingsSnapshot {
        self.0
    }
}

/// Log-and-drop a collaborator failure.
pub(crate) fn log_failure(what: &str, result: CollabResult) {
    if let Err(e) = result {
        tracing::warn!(collaborator = what, error = %e, "collaborator call failed");
    }
}
