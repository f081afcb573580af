//! Timer engine implementation.
//!
//! The engine is a tick-counting state machine. It does not read the clock
//! to advance the countdown: each `tick()` is exactly one second. Wall-clock
//! catch-up after suspension is the background tracker's job.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!       (complete) -> Idle (next phase: break after work, work after break)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(clock, settings, stats);
//! engine.toggle();
//! // Once per second while in the foreground:
//! if let Some(event) = engine.tick() { /* phase finished */ }
//! ```

use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};

use super::state::{minutes_to_secs, Phase, TimerState};
use crate::clock::Clock;
use crate::collaborators::{log_failure, SettingsProvider, SettingsSnapshot, StatisticsSink};
use crate::events::Event;
use crate::flow::{
    adaptive_session_length, apply_daily_reset, calculate_flow_intensity, FlowMetrics,
};

/// Core timer engine.
///
/// Owns the live [`TimerState`] and [`FlowMetrics`]. All collaborators are
/// injected; collaborator failures are logged, never propagated.
pub struct TimerEngine {
    timer: TimerState,
    metrics: FlowMetrics,
    clock: Rc<dyn Clock>,
    settings: Rc<dyn SettingsProvider>,
    stats: Rc<dyn StatisticsSink>,
}

impl TimerEngine {
    /// Create an idle engine with factory-default metrics.
    pub fn new(
        clock: Rc<dyn Clock>,
        settings: Rc<dyn SettingsProvider>,
        stats: Rc<dyn StatisticsSink>,
    ) -> Self {
        let timer = TimerState::from_settings(&settings.settings());
        Self {
            timer,
            metrics: FlowMetrics::default(),
            clock,
            settings,
            stats,
        }
    }

    /// Rebuild an engine from persisted parts.
    ///
    /// A running timer is never restored as running: it comes back stopped
    /// with its remaining time intact. Returns whether it had been running.
    pub fn rehydrate(
        mut timer: TimerState,
        metrics: FlowMetrics,
        clock: Rc<dyn Clock>,
        settings: Rc<dyn SettingsProvider>,
        stats: Rc<dyn StatisticsSink>,
    ) -> (Self, bool) {
        timer.normalize();
        let was_running = timer.is_running;
        if was_running {
            tracing::debug!(
                remaining_secs = timer.total_seconds,
                "rehydrating a running timer as stopped"
            );
            timer.is_running = false;
            timer.is_paused = false;
        }
        let engine = Self {
            timer,
            metrics,
            clock,
            settings,
            stats,
        };
        (engine, was_running)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn metrics(&self) -> &FlowMetrics {
        &self.metrics
    }

    pub fn phase(&self) -> Phase {
        self.timer.phase()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running && !self.timer.is_paused
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> SettingsSnapshot {
        self.settings.settings()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.timer.phase(),
            is_break: self.timer.is_break,
            current_session: self.timer.current_session,
            total_sessions: self.timer.total_sessions,
            remaining_secs: self.timer.total_seconds,
            initial_secs: self.timer.initial_seconds,
            minutes: self.timer.minutes(),
            seconds: self.timer.seconds(),
            progress: self.timer.progress(),
            flow_intensity: self.metrics.flow_intensity,
            distraction_count: self.metrics.distraction_count,
            consecutive_sessions: self.metrics.consecutive_sessions,
            current_streak: self.metrics.current_streak,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Roll daily counters over if the last session was on an earlier day.
    pub fn apply_daily_reset(&mut self) -> Option<Event> {
        let today = self.clock.today();
        apply_daily_reset(&mut self.metrics, today).then(|| Event::DailyReset {
            date: today,
            at: self.clock.now(),
        })
    }

    /// Start from idle, pause while running, resume while paused.
    ///
    /// Pausing and resuming both count as a distraction.
    pub fn toggle(&mut self) -> Option<Event> {
        self.timer.normalize();
        self.apply_daily_reset();
        let now = self.clock.now();

        match self.timer.phase() {
            Phase::Idle => {
                self.timer.is_running = true;
                self.timer.is_paused = false;
                self.metrics.session_start_time = Some(now);
                if self.timer.is_break {
                    log_failure("statistics", self.stats.increment_break_started());
                } else {
                    log_failure("statistics", self.stats.increment_flow_started());
                }
                tracing::debug!(
                    is_break = self.timer.is_break,
                    session = self.timer.current_session,
                    "timer started"
                );
                Some(Event::FlowStarted {
                    current_session: self.timer.current_session,
                    is_break: self.timer.is_break,
                    duration_secs: self.timer.total_seconds,
                    at: now,
                })
            }
            Phase::Paused => {
                self.track_distraction();
                self.timer.is_running = true;
                self.timer.is_paused = false;
                tracing::debug!(remaining_secs = self.timer.total_seconds, "timer resumed");
                Some(Event::TimerResumed {
                    remaining_secs: self.timer.total_seconds,
                    distraction_count: self.metrics.distraction_count,
                    at: now,
                })
            }
            Phase::Running => {
                self.track_distraction();
                self.timer.is_running = false;
                self.timer.is_paused = true;
                tracing::debug!(remaining_secs = self.timer.total_seconds, "timer paused");
                Some(Event::TimerPaused {
                    remaining_secs: self.timer.total_seconds,
                    distraction_count: self.metrics.distraction_count,
                    at: now,
                })
            }
        }
    }

    /// One second of countdown. Returns the completion event when the
    /// phase reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        if self.timer.total_seconds <= 1 {
            self.timer.total_seconds = 0;
            return Some(self.complete());
        }
        self.timer.total_seconds -= 1;
        None
    }

    /// Back to idle with the full phase length. Flow metrics are untouched.
    pub fn reset(&mut self) -> Option<Event> {
        self.timer.is_running = false;
        self.timer.is_paused = false;
        self.timer.total_seconds = self.timer.initial_seconds;
        self.metrics.session_start_time = None;
        Some(Event::TimerReset {
            at: self.clock.now(),
        })
    }

    /// Halt without restoring the remaining time.
    pub fn stop(&mut self) -> Option<Event> {
        self.timer.is_running = false;
        self.timer.is_paused = false;
        self.metrics.session_start_time = None;
        Some(Event::TimerStopped {
            remaining_secs: self.timer.total_seconds,
            at: self.clock.now(),
        })
    }

    /// Finish the current phase and configure the next one (idle).
    pub fn complete(&mut self) -> Event {
        let now = self.clock.now();
        let settings = self.settings.settings();

        let event = if self.timer.is_break {
            let minutes = self.timer.initial_seconds / 60;
            log_failure("statistics", self.stats.increment_break_completed(minutes));
            let next_session_minutes = self.end_break(&settings);
            tracing::info!(minutes, next_session_minutes, "break completed");
            Event::BreakCompleted {
                minutes,
                next_session_minutes,
                at: now,
            }
        } else {
            let minutes = self.session_minutes(now);
            self.update_flow_metrics(minutes, self.clock.today());
            log_failure("statistics", self.stats.increment_flow_completed(minutes));
            tracing::info!(
                minutes,
                intensity = %self.metrics.flow_intensity,
                streak = self.metrics.current_streak,
                "flow session completed"
            );
            let event = Event::SessionCompleted {
                intensity: self.metrics.flow_intensity,
                streak: self.metrics.current_streak,
                consecutive_sessions: self.metrics.consecutive_sessions,
                minutes,
                at: now,
            };
            self.start_break(&settings);
            event
        };

        self.timer.total_sessions = settings.total_sessions.max(1);
        self.timer.current_session = if self.timer.current_session < self.timer.total_sessions {
            self.timer.current_session + 1
        } else {
            1
        };
        self.timer.total_seconds = self.timer.initial_seconds;
        self.timer.is_running = false;
        self.timer.is_paused = false;
        self.metrics.session_start_time = None;
        event
    }

    /// Count an interruption and rescore.
    pub fn track_distraction(&mut self) {
        self.metrics.distraction_count = self.metrics.distraction_count.saturating_add(1);
        self.rescore();
    }

    /// Overwrite the countdown from an externally tracked clock.
    pub fn sync_countdown(&mut self, remaining_secs: u64, is_break: bool, running: bool) {
        self.timer.total_seconds = remaining_secs;
        self.timer.initial_seconds = self.timer.initial_seconds.max(remaining_secs).max(1);
        self.timer.is_break = is_break;
        self.timer.is_running = running;
        self.timer.is_paused = false;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start_break(&mut self, settings: &SettingsSnapshot) {
        self.timer.is_break = true;
        self.timer.initial_seconds = minutes_to_secs(settings.break_duration);
        self.timer.is_running = false;
        self.timer.is_paused = false;
    }

    /// Leave the break and size the next focus phase. Returns its minutes.
    fn end_break(&mut self, settings: &SettingsSnapshot) -> u32 {
        self.timer.is_break = false;
        let minutes = adaptive_session_length(
            settings.time_duration,
            self.metrics.flow_intensity,
            self.metrics.consecutive_sessions,
        )
        .max(1);
        self.timer.initial_seconds = minutes_to_secs(minutes);
        self.timer.total_seconds = self.timer.initial_seconds;
        self.timer.adapted_duration = Some(minutes);
        minutes
    }

    fn update_flow_metrics(&mut self, session_minutes: u64, today: NaiveDate) {
        let m = &mut self.metrics;
        m.consecutive_sessions = m.consecutive_sessions.saturating_add(1);
        m.current_streak = m.current_streak.saturating_add(1);
        m.longest_streak = m.longest_streak.max(m.current_streak);
        m.total_focus_time = m.total_focus_time.saturating_add(session_minutes);
        m.average_session_length = (m.average_session_length + session_minutes as f64) / 2.0;
        m.best_flow_duration = m.best_flow_duration.max(session_minutes as f64);
        m.session_start_time = None;
        m.distraction_count = 0;
        m.last_session_date = Some(today);
        self.rescore();
    }

    fn rescore(&mut self) {
        self.metrics.flow_intensity = calculate_flow_intensity(
            self.metrics.consecutive_sessions,
            self.metrics.distraction_count,
            self.metrics.average_session_length,
        );
    }

    /// Wall-clock minutes since the session started, or the nominal length
    /// when that is unknown or under a minute.
    fn session_minutes(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = self
            .metrics
            .session_start_time
            .map(|start| (now - start).num_minutes())
            .unwrap_or(0);
        if elapsed >= 1 {
            elapsed as u64
        } else {
            self.timer.initial_seconds / 60
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("timer", &self.timer)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}
