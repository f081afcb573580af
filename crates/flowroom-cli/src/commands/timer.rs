use std::error::Error;
use std::rc::Rc;

use flowroom_core::error::Result as CoreResult;
use flowroom_core::{Clock, Collaborators, Config, Database, Event, FlowSession, Phase, SystemClock};

use crate::notifier::TerminalNotifier;
use crate::present;
use crate::ticker::IntervalScheduler;

pub enum TimerAction {
    Toggle,
    Reset,
    Stop,
    Status,
}

/// Restore the session from disk and reconcile it with the wall clock.
fn open_session() -> CoreResult<(FlowSession<IntervalScheduler>, Vec<Event>, Config)> {
    let config = Config::load_or_default();
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let db = Rc::new(Database::open()?.with_clock(clock.clone()));
    let collab = Collaborators {
        clock,
        settings: Rc::new(config.clone()),
        stats: db.clone(),
        notifier: Rc::new(TerminalNotifier::new(config.notifications.sound_effects)),
        store: db,
        save_throttle_secs: config.persistence.save_throttle_secs,
    };
    let (session, events) = FlowSession::restore(collab, IntervalScheduler::new());
    Ok((session, events, config))
}

fn print_json(event: &Event) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

/// One transition per process: every event on its own JSON line, followed
/// by a state snapshot.
pub fn run(action: TimerAction) -> Result<(), Box<dyn Error>> {
    let (mut session, events, _) = open_session()?;
    for event in &events {
        print_json(event)?;
    }

    let event = match action {
        TimerAction::Toggle => session.toggle(),
        TimerAction::Reset => session.reset(),
        TimerAction::Stop => session.stop(),
        TimerAction::Status => None,
    };
    if let Some(event) = &event {
        print_json(event)?;
    }

    print_json(&session.snapshot())?;
    Ok(())
}

pub fn run_foreground() -> Result<(), Box<dyn Error>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(foreground())
}

fn announce(event: &Event, notifications: bool) {
    // Completions reach the user through the notifier when it is enabled.
    if event.is_completion() && notifications {
        return;
    }
    if let Some(text) = present::describe(event) {
        println!("{text}");
    }
}

async fn foreground() -> Result<(), Box<dyn Error>> {
    let (mut session, events, config) = open_session()?;
    let notifications = config.notifications.enabled;
    for event in &events {
        announce(event, notifications);
    }

    if session.engine().phase() != Phase::Running {
        if let Some(event) = session.toggle() {
            announce(&event, notifications);
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = session.scheduler_mut().next_tick() => {
                if let Some(event) = session.on_tick() {
                    eprintln!();
                    announce(&event, notifications);
                    break;
                }
                let timer = session.engine().timer();
                eprint!("\r{:02}:{:02} ", timer.minutes(), timer.seconds());
            }
            result = &mut ctrl_c => {
                result?;
                session.on_background();
                eprintln!();
                tracing::info!(
                    remaining_secs = session.engine().timer().total_seconds,
                    "interrupted, session keeps running in the background"
                );
                break;
            }
        }
    }
    Ok(())
}
