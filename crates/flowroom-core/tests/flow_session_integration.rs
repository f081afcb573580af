//! End-to-end flows through the session controller.
//!
//! Time only moves when a test moves it: each simulated second advances the
//! manual clock and then delivers one tick, the way a real ticker would.

use std::rc::Rc;

use chrono::{TimeZone, Utc};
use flowroom_core::background::BackgroundRecord;
use flowroom_core::testing::{RecordingNotifier, RecordingStatistics};
use flowroom_core::timer::ManualScheduler;
use flowroom_core::{
    BackgroundTracker, Clock, Collaborators, Database, Event, FlowSession, KeyValueStore,
    ManualClock, MemoryStore, Phase, ReconcileOutcome, SettingsSnapshot, StaticSettings,
    TimerEngine, BACKGROUND_KEY,
};

struct Harness {
    clock: Rc<ManualClock>,
    store: Rc<dyn KeyValueStore>,
    stats: Rc<RecordingStatistics>,
    notifier: Rc<RecordingNotifier>,
    settings: SettingsSnapshot,
}

impl Harness {
    fn new(settings: SettingsSnapshot) -> Self {
        Self::with_store(settings, Rc::new(MemoryStore::new()))
    }

    fn with_store(settings: SettingsSnapshot, store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            clock: Rc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2024, 10, 7, 8, 30, 0).unwrap(),
            )),
            store,
            stats: Rc::new(RecordingStatistics::default()),
            notifier: Rc::new(RecordingNotifier::default()),
            settings,
        }
    }

    fn open(&self) -> (FlowSession<ManualScheduler>, Vec<Event>) {
        FlowSession::restore(
            Collaborators {
                clock: self.clock.clone(),
                settings: Rc::new(StaticSettings(self.settings)),
                stats: self.stats.clone(),
                notifier: self.notifier.clone(),
                store: self.store.clone(),
                save_throttle_secs: 5,
            },
            ManualScheduler::new(),
        )
    }

    /// Advance `secs` seconds of wall clock with a tick each second.
    fn run_for(&self, session: &mut FlowSession<ManualScheduler>, secs: u64) -> Vec<Event> {
        let mut completions = Vec::new();
        for _ in 0..secs {
            self.clock.advance_secs(1);
            completions.extend(session.on_tick());
        }
        completions
    }
}

fn minutes(time_duration: u32) -> SettingsSnapshot {
    SettingsSnapshot {
        time_duration,
        ..SettingsSnapshot::default()
    }
}

#[test]
fn one_minute_session_completes_once_and_configures_break() {
    let h = Harness::new(minutes(1));
    let (mut s, _) = h.open();
    assert_eq!(s.engine().timer().initial_seconds, 60);
    assert_eq!(s.engine().metrics().consecutive_sessions, 0);

    s.toggle();
    let completions = h.run_for(&mut s, 60);

    assert_eq!(completions.len(), 1);
    assert!(matches!(completions[0], Event::SessionCompleted { .. }));
    let engine = s.engine();
    assert_eq!(engine.metrics().consecutive_sessions, 1);
    assert_eq!(engine.metrics().distraction_count, 0);
    assert!(engine.timer().is_break);
    assert_eq!(engine.timer().initial_seconds, 5 * 60);
    assert_eq!(engine.timer().total_seconds, 5 * 60);
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(h.stats.flow_completed_minutes(), vec![1]);

    // Nothing further fires without a new start.
    assert!(h.run_for(&mut s, 120).is_empty());
}

#[test]
fn pause_and_resume_counts_two_distractions_and_keeps_remaining() {
    let h = Harness::new(minutes(1));
    let (mut s, _) = h.open();
    s.toggle();
    h.run_for(&mut s, 15);
    assert_eq!(s.engine().timer().total_seconds, 45);

    s.toggle();
    assert_eq!(s.engine().phase(), Phase::Paused);
    h.clock.advance_secs(600);
    s.toggle();

    assert_eq!(s.engine().metrics().distraction_count, 2);
    assert_eq!(s.engine().timer().total_seconds, 45);
    h.run_for(&mut s, 5);
    assert_eq!(s.engine().timer().total_seconds, 40);
}

#[test]
fn backgrounded_session_completes_while_away() {
    let h = Harness::new(SettingsSnapshot::default());
    let (mut s, _) = h.open();
    s.toggle();
    h.run_for(&mut s, 25 * 60 - 300);
    assert_eq!(s.engine().timer().total_seconds, 300);

    s.on_background();
    assert!(s.ticker().is_none());
    h.clock.advance_secs(400);
    let events = s.on_foreground();

    assert!(matches!(events.last(), Some(Event::SessionCompleted { .. })));
    let engine = s.engine();
    assert_eq!(engine.phase(), Phase::Idle);
    assert!(engine.timer().is_break);
    assert_eq!(engine.timer().total_seconds, engine.timer().initial_seconds);
    assert!(s.background().record().is_none());
    assert!(s.ticker().is_none());
    assert_eq!(h.notifier.delivered().len(), 1);
}

#[test]
fn toggle_twice_pauses_and_third_resumes() {
    let h = Harness::new(SettingsSnapshot::default());
    let (mut s, _) = h.open();
    s.toggle();
    s.toggle();
    assert!(!s.engine().timer().is_running);
    assert_eq!(s.engine().metrics().distraction_count, 1);
    s.toggle();
    assert_eq!(s.engine().metrics().distraction_count, 2);
    assert_eq!(s.engine().phase(), Phase::Running);
}

#[test]
fn daily_rollover_happens_once_per_day() {
    let h = Harness::new(minutes(1));
    let (mut s, _) = h.open();
    s.toggle();
    h.run_for(&mut s, 60);
    assert_eq!(s.engine().metrics().consecutive_sessions, 1);

    // Same day: nothing rolls over.
    assert!(s.on_foreground().is_empty());
    assert_eq!(s.engine().metrics().consecutive_sessions, 1);

    h.clock.advance_secs(24 * 3600);
    let events = s.on_foreground();
    assert!(matches!(events.as_slice(), [Event::DailyReset { .. }]));
    assert_eq!(s.engine().metrics().consecutive_sessions, 0);
    assert_eq!(s.engine().metrics().current_streak, 1);
    assert!(s.on_foreground().is_empty());
}

#[test]
fn reconcile_against_a_stored_record() {
    let clock = Rc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 10, 7, 12, 0, 0).unwrap(),
    ));
    let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
    let notifier = RecordingNotifier::default();
    let tracker = BackgroundTracker::new(store.clone(), clock.clone());

    let write_record = |ago_ms: i64| {
        let record = BackgroundRecord {
            start_time_epoch_ms: clock.now_ms() - ago_ms,
            duration_seconds: 600,
            is_break: false,
            is_running: true,
            session_id: "session-1".into(),
        };
        store
            .set(BACKGROUND_KEY, &serde_json::to_string(&record).unwrap())
            .unwrap();
    };
    let fresh_engine = || {
        TimerEngine::new(
            clock.clone(),
            Rc::new(StaticSettings::default()),
            Rc::new(RecordingStatistics::default()),
        )
    };

    write_record(700_000);
    let mut engine = fresh_engine();
    assert!(matches!(
        tracker.reconcile(&mut engine, &notifier, false),
        ReconcileOutcome::Completed { .. }
    ));

    write_record(100_000);
    let mut engine = fresh_engine();
    assert_eq!(
        tracker.reconcile(&mut engine, &notifier, false),
        ReconcileOutcome::Synced { remaining_secs: 500 }
    );
    assert!(engine.is_running());
}

#[test]
fn cold_start_from_sqlite_picks_up_where_it_left_off() {
    let db: Rc<dyn KeyValueStore> = Rc::new(Database::open_memory().unwrap());
    let h = Harness::with_store(SettingsSnapshot::default(), db);
    {
        let (mut s, _) = h.open();
        s.toggle();
        h.run_for(&mut s, 60);
        s.on_background();
    }

    h.clock.advance_secs(240);
    let (s, events) = h.open();
    assert!(events.is_empty());
    assert_eq!(s.engine().phase(), Phase::Running);
    assert_eq!(s.engine().timer().total_seconds, 25 * 60 - 300);
    assert!(s.ticker().is_some());
}

#[test]
fn stopped_session_leaves_nothing_behind() {
    let h = Harness::new(SettingsSnapshot::default());
    let (mut s, _) = h.open();
    s.toggle();
    h.run_for(&mut s, 30);
    s.stop();

    assert!(h.store.get(BACKGROUND_KEY).unwrap().is_none());
    assert!(h.notifier.pending().is_empty());
    assert_eq!(s.scheduler().active_count(), 0);

    h.clock.advance_secs(3 * 3600);
    let (s, events) = h.open();
    assert!(events.is_empty());
    assert_eq!(s.engine().phase(), Phase::Idle);
    assert_eq!(s.engine().timer().total_seconds, 25 * 60 - 30);
}
