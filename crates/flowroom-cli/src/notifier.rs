//! Terminal notifier.
//!
//! A terminal cannot hold an OS-level notification past process exit, so
//! scheduled completions are only tracked for the lifetime of the process.
//! Delivered events are printed to stderr.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;

use flowroom_core::{CollabResult, Event, NotificationPayload, Notifier};

use crate::present;

pub struct TerminalNotifier {
    sound: bool,
    pending: RefCell<HashMap<String, u64>>,
}

impl TerminalNotifier {
    pub fn new(sound: bool) -> Self {
        Self {
            sound,
            pending: RefCell::new(HashMap::new()),
        }
    }
}

impl Notifier for TerminalNotifier {
    fn schedule_completion(
        &self,
        eta_secs: u64,
        is_break: bool,
        payload: &NotificationPayload,
    ) -> CollabResult {
        tracing::debug!(
            session_id = %payload.session_id,
            eta_secs,
            is_break,
            "completion notification scheduled"
        );
        self.pending
            .borrow_mut()
            .insert(payload.session_id.clone(), eta_secs);
        Ok(())
    }

    fn cancel_pending_for_session(&self, session_id: &str) -> CollabResult {
        if self.pending.borrow_mut().remove(session_id).is_some() {
            tracing::debug!(%session_id, "completion notification cancelled");
        }
        Ok(())
    }

    fn deliver(&self, event: &Event) -> CollabResult {
        let Some(text) = present::describe(event) else {
            return Ok(());
        };
        let mut err = std::io::stderr().lock();
        if self.sound {
            write!(err, "\x07")?;
        }
        writeln!(err, "{text}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_forgets_pending() {
        let n = TerminalNotifier::new(false);
        let payload = NotificationPayload {
            session_id: "abc".into(),
            current_session: 1,
            total_sessions: 4,
        };
        n.schedule_completion(60, false, &payload).unwrap();
        assert_eq!(n.pending.borrow().len(), 1);
        n.cancel_pending_for_session("abc").unwrap();
        assert!(n.pending.borrow().is_empty());
    }
}
