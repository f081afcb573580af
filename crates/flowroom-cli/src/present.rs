//! Human-readable copy for engine events.

use flowroom_core::{Event, FlowIntensity};

/// One line of text for events worth telling the user about.
pub fn describe(event: &Event) -> Option<String> {
    match event {
        Event::FlowStarted {
            is_break: false,
            duration_secs,
            current_session,
            ..
        } => Some(format!(
            "Session {current_session}: focus for {} min.",
            duration_secs.div_ceil(60)
        )),
        Event::FlowStarted {
            is_break: true,
            duration_secs,
            ..
        } => Some(format!("Break for {} min.", duration_secs.div_ceil(60))),
        Event::SessionCompleted {
            intensity,
            streak,
            consecutive_sessions,
            minutes,
            ..
        } => Some(session_completed(*intensity, *streak, *consecutive_sessions, *minutes)),
        Event::BreakCompleted {
            next_session_minutes,
            ..
        } => Some(format!(
            "Break over. Next session is {next_session_minutes} min."
        )),
        Event::DailyReset { date, .. } => Some(format!("New day ({date}). Daily counters reset.")),
        _ => None,
    }
}

fn session_completed(intensity: FlowIntensity, streak: u32, today: u32, minutes: u64) -> String {
    match intensity {
        FlowIntensity::High => format!(
            "Deep flow: {minutes} min, streak of {streak}. The next session will run longer."
        ),
        FlowIntensity::Medium if today >= 3 => format!(
            "Steady rhythm: {today} sessions today. Take your break."
        ),
        FlowIntensity::Medium => format!("Session done ({minutes} min). Take your break."),
        FlowIntensity::Low => {
            "Session done. Rest up; the next one will be a little shorter.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn completed(intensity: FlowIntensity, consecutive_sessions: u32) -> Event {
        Event::SessionCompleted {
            intensity,
            streak: 7,
            consecutive_sessions,
            minutes: 40,
            at: Utc::now(),
        }
    }

    #[test]
    fn copy_varies_with_intensity() {
        let high = describe(&completed(FlowIntensity::High, 5)).unwrap();
        let low = describe(&completed(FlowIntensity::Low, 1)).unwrap();
        assert!(high.contains("streak of 7"));
        assert!(low.contains("shorter"));
        assert_ne!(high, low);
    }

    #[test]
    fn medium_mentions_rhythm_after_three_sessions() {
        let steady = describe(&completed(FlowIntensity::Medium, 3)).unwrap();
        assert!(steady.contains("3 sessions today"));
        let early = describe(&completed(FlowIntensity::Medium, 1)).unwrap();
        assert!(early.contains("40 min"));
    }

    #[test]
    fn start_rounds_minutes_up() {
        let event = Event::FlowStarted {
            current_session: 2,
            is_break: false,
            duration_secs: 61,
            at: Utc::now(),
        };
        assert_eq!(
            describe(&event).as_deref(),
            Some("Session 2: focus for 2 min.")
        );
    }

    #[test]
    fn snapshots_are_silent() {
        assert!(describe(&Event::TimerReset { at: Utc::now() }).is_none());
    }
}
