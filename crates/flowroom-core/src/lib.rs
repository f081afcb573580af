//! # Flowroom Core Library
//!
//! The timer and flow-state engine behind Flowroom, a focus timer that
//! lengthens or shortens the next focus session depending on how well the
//! previous ones went.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-counting state machine. The caller drives it
//!   once per second while in the foreground.
//! - **Flow**: Pure scoring of flow intensity and adaptive session length,
//!   plus the daily rollover of per-day counters.
//! - **Background**: A durable record of the running phase, reconciled
//!   against the wall clock after suspension or a cold start.
//! - **Storage**: SQLite key-value and statistics storage, TOML configuration.
//! - **Session**: The controller a UI talks to; keeps the ticker, pending
//!   notifications and background record consistent with the engine.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`FlowSession`]: Engine plus persistence, tracking and notifications
//! - [`BackgroundTracker`]: Wall-clock reconciliation
//! - [`Database`]: Key-value and statistics persistence
//! - [`Config`]: Application configuration management

pub mod background;
pub mod clock;
pub mod collaborators;
pub mod error;
pub mod events;
pub mod flow;
pub mod session;
pub mod storage;
pub mod testing;
pub mod timer;

pub use background::{BackgroundRecord, BackgroundTracker, ReconcileOutcome, BACKGROUND_KEY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{
    CollabResult, NotificationPayload, Notifier, SettingsProvider, SettingsSnapshot,
    StaticSettings, StatisticsSink,
};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use flow::{FlowIntensity, FlowMetrics};
pub use session::{Collaborators, FlowSession};
pub use storage::{Config, Database, KeyValueStore, MemoryStore, PersistenceBridge, Stats};
pub use timer::{Phase, Scheduler, TickerHandle, TimerEngine, TimerState};
