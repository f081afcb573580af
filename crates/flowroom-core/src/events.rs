use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::FlowIntensity;
use crate::timer::Phase;

/// Every engine transition produces an Event.
/// Presentation layers turn these into text; the engine never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A work or break countdown began running from idle.
    FlowStarted {
        current_session: u32,
        is_break: bool,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        distraction_count: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        distraction_count: u32,
        at: DateTime<Utc>,
    },
    /// A focus session ran to zero.
    SessionCompleted {
        intensity: FlowIntensity,
        streak: u32,
        consecutive_sessions: u32,
        minutes: u64,
        at: DateTime<Utc>,
    },
    /// A break ran to zero; the next focus length has been adapted.
    BreakCompleted {
        minutes: u64,
        next_session_minutes: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    TimerStopped {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Per-day counters rolled over.
    DailyReset {
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        is_break: bool,
        current_session: u32,
        total_sessions: u32,
        remaining_secs: u64,
        initial_secs: u64,
        minutes: u64,
        seconds: u64,
        progress: f64,
        flow_intensity: FlowIntensity,
        distraction_count: u32,
        consecutive_sessions: u32,
        current_streak: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Completion events are the ones worth a user-facing notification.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Event::SessionCompleted { .. } | Event::BreakCompleted { .. }
        )
    }
}
