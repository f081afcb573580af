//! The session controller that UIs drive.
//!
//! Wraps the engine with everything that has to happen around a transition:
//! background tracking, the foreground ticker, completion notifications and
//! persistence. Stopping or resetting cancels all three of ticker, pending
//! notification and background record.

use std::rc::Rc;

use crate::background::{BackgroundTracker, ReconcileOutcome};
use crate::clock::Clock;
use crate::collaborators::{
    log_failure, NotificationPayload, Notifier, SettingsProvider, StatisticsSink,
};
use crate::events::Event;
use crate::storage::{KeyValueStore, PersistenceBridge};
use crate::timer::{Scheduler, TickerHandle, TimerEngine, TICK_INTERVAL_MS};

/// Everything a session needs from the outside world.
pub struct Collaborators {
    pub clock: Rc<dyn Clock>,
    pub settings: Rc<dyn SettingsProvider>,
    pub stats: Rc<dyn StatisticsSink>,
    pub notifier: Rc<dyn Notifier>,
    pub store: Rc<dyn KeyValueStore>,
    pub save_throttle_secs: u64,
}

pub struct FlowSession<S: Scheduler> {
    engine: TimerEngine,
    persistence: PersistenceBridge,
    background: BackgroundTracker,
    notifier: Rc<dyn Notifier>,
    scheduler: S,
    ticker: Option<TickerHandle>,
    session_id: Option<String>,
}

impl<S: Scheduler> FlowSession<S> {
    /// Cold start: rehydrate from the store, then reconcile against the
    /// background record. Returns the events produced while catching up.
    pub fn restore(collab: Collaborators, scheduler: S) -> (Self, Vec<Event>) {
        let persistence = PersistenceBridge::new(
            collab.store.clone(),
            collab.clock.clone(),
            collab.save_throttle_secs,
        );
        let background = BackgroundTracker::new(collab.store, collab.clock);
        let restored = persistence.restore(collab.settings, collab.stats);
        let session_id = background.record().map(|r| r.session_id);

        let mut session = Self {
            engine: restored.engine,
            persistence,
            background,
            notifier: collab.notifier,
            scheduler,
            ticker: None,
            session_id,
        };
        let events = session.foreground(restored.was_running);
        (session, events)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn ticker(&self) -> Option<TickerHandle> {
        self.ticker
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn background(&self) -> &BackgroundTracker {
        &self.background
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn toggle(&mut self) -> Option<Event> {
        let event = self.engine.toggle()?;

        match &event {
            Event::FlowStarted {
                is_break,
                duration_secs,
                ..
            } => {
                let id = self.background.start_tracking(*duration_secs, *is_break);
                self.session_id = Some(id);
                self.schedule_completion();
                self.ensure_ticker();
            }
            Event::TimerPaused { .. } => {
                self.background.pause_tracking();
                self.cancel_pending();
                self.stop_ticker();
            }
            Event::TimerResumed { .. } => {
                let id = match self.background.resume_tracking() {
                    Some(record) => record.session_id,
                    None => {
                        let timer = self.engine.timer();
                        self.background
                            .start_tracking(timer.total_seconds, timer.is_break)
                    }
                };
                self.session_id = Some(id);
                self.schedule_completion();
                self.ensure_ticker();
            }
            _ => {}
        }

        self.persistence.save(&self.engine);
        Some(event)
    }

    /// One foreground tick. Returns the completion event when the phase ends.
    pub fn on_tick(&mut self) -> Option<Event> {
        match self.engine.tick() {
            Some(event) => {
                self.finish_phase(&event);
                Some(event)
            }
            None => {
                self.persistence.save_throttled(&self.engine);
                None
            }
        }
    }

    pub fn reset(&mut self) -> Option<Event> {
        let event = self.engine.reset();
        self.cancel_everything();
        self.persistence.save(&self.engine);
        event
    }

    pub fn stop(&mut self) -> Option<Event> {
        let event = self.engine.stop();
        self.cancel_everything();
        self.persistence.save(&self.engine);
        event
    }

    /// The UI went away. Ticking stops; the background record stays.
    pub fn on_background(&mut self) {
        self.stop_ticker();
        self.persistence.save(&self.engine);
    }

    /// The UI came back in-process.
    pub fn on_foreground(&mut self) -> Vec<Event> {
        self.foreground(false)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn foreground(&mut self, was_running: bool) -> Vec<Event> {
        let mut events: Vec<Event> = self.engine.apply_daily_reset().into_iter().collect();

        match self
            .background
            .reconcile(&mut self.engine, self.notifier.as_ref(), was_running)
        {
            ReconcileOutcome::Synced { .. } => {
                if self.engine.is_running() {
                    self.ensure_ticker();
                }
            }
            ReconcileOutcome::Completed { event } => {
                self.cancel_pending();
                self.session_id = None;
                self.stop_ticker();
                self.deliver(&event);
                events.push(event);
            }
            ReconcileOutcome::NoOp => {}
        }

        self.persistence.save(&self.engine);
        events
    }

    fn finish_phase(&mut self, event: &Event) {
        self.background.clear();
        self.cancel_pending();
        self.session_id = None;
        self.stop_ticker();
        self.deliver(event);
        self.persistence.save(&self.engine);
    }

    fn cancel_everything(&mut self) {
        self.stop_ticker();
        self.cancel_pending();
        self.background.clear();
        self.session_id = None;
    }

    fn notifications_enabled(&self) -> bool {
        self.engine.settings().notifications
    }

    fn schedule_completion(&self) {
        let Some(session_id) = self.session_id.clone() else {
            return;
        };
        if !self.notifications_enabled() {
            return;
        }
        let timer = self.engine.timer();
        let payload = NotificationPayload {
            session_id,
            current_session: timer.current_session,
            total_sessions: timer.total_sessions,
        };
        log_failure(
            "notifier",
            self.notifier
                .schedule_completion(timer.total_seconds, timer.is_break, &payload),
        );
    }

    fn cancel_pending(&self) {
        if let Some(id) = &self.session_id {
            log_failure("notifier", self.notifier.cancel_pending_for_session(id));
        }
    }

    fn deliver(&self, event: &Event) {
        if self.notifications_enabled() {
            log_failure("notifier", self.notifier.deliver(event));
        }
    }

    fn ensure_ticker(&mut self) {
        if self.ticker.is_none() {
            self.ticker = Some(self.scheduler.start(TICK_INTERVAL_MS));
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            self.scheduler.stop(handle);
        }
    }
}
