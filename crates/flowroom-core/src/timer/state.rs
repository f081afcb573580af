use serde::{Deserialize, Serialize};

use crate::collaborators::SettingsSnapshot;

/// Coarse phase derived from the running/paused flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not running and not paused. Covers both "fresh" and "stopped".
    Idle,
    Running,
    Paused,
}

/// The live countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    /// Remaining countdown, seconds.
    pub total_seconds: u64,
    /// Countdown length at phase start, seconds. Always > 0.
    pub initial_seconds: u64,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_break: bool,
    /// 1-based, wraps at `total_sessions`.
    pub current_session: u32,
    pub total_sessions: u32,
    /// Last adapted focus length applied, minutes.
    #[serde(default)]
    pub adapted_duration: Option<u32>,
}

impl TimerState {
    /// Fresh idle work phase sized from settings.
    pub fn from_settings(settings: &SettingsSnapshot) -> Self {
        let initial_seconds = minutes_to_secs(settings.time_duration);
        Self {
            total_seconds: initial_seconds,
            initial_seconds,
            is_running: false,
            is_paused: false,
            is_break: false,
            current_session: 1,
            total_sessions: settings.total_sessions.max(1),
            adapted_duration: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_paused {
            Phase::Paused
        } else if self.is_running {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    pub fn minutes(&self) -> u64 {
        self.total_seconds / 60
    }

    pub fn seconds(&self) -> u64 {
        self.total_seconds % 60
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.initial_seconds == 0 {
            return 0.0;
        }
        let elapsed = self.initial_seconds.saturating_sub(self.total_seconds);
        (elapsed as f64 / self.initial_seconds as f64).clamp(0.0, 1.0)
    }

    /// Repair states that should be impossible. Returns true if anything changed.
    ///
    /// Running and paused together collapses to paused.
    pub fn normalize(&mut self) -> bool {
        let mut repaired = false;
        if self.is_running && self.is_paused {
            tracing::warn!("timer was both running and paused, collapsing to paused");
            self.is_running = false;
            repaired = true;
        }
        if self.initial_seconds == 0 {
            tracing::warn!("timer had a zero-length phase, restoring one minute");
            self.initial_seconds = 60;
            repaired = true;
        }
        if self.total_sessions == 0 {
            self.total_sessions = 1;
            repaired = true;
        }
        if self.current_session == 0 || self.current_session > self.total_sessions {
            tracing::warn!(
                current_session = self.current_session,
                total_sessions = self.total_sessions,
                "session index out of range, wrapping to 1"
            );
            self.current_session = 1;
            repaired = true;
        }
        repaired
    }
}

pub(crate) fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes.max(1)) * 60
}
