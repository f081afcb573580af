//! Daily rollover of per-day flow counters.
//!
//! Only the daily counters roll over. Streaks and lifetime totals are left
//! alone.

use chrono::NaiveDate;

use super::metrics::FlowMetrics;

/// True iff `last_session_date` is unset or strictly before `today`.
pub fn should_reset(last_session_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_session_date {
        None => true,
        Some(last) => last < today,
    }
}

/// Apply the rollover if one is due. Returns whether it ran.
pub fn apply_daily_reset(metrics: &mut FlowMetrics, today: NaiveDate) -> bool {
    if !should_reset(metrics.last_session_date, today) {
        return false;
    }

    tracing::info!(
        previous = ?metrics.last_session_date,
        %today,
        consecutive_sessions = metrics.consecutive_sessions,
        "daily flow counters rolled over"
    );
    metrics.consecutive_sessions = 0;
    metrics.distraction_count = 0;
    metrics.session_start_time = None;
    metrics.last_session_date = Some(today);
    true
}
